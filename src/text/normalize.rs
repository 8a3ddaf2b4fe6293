/// Whole words removed from cleaned content (matched case-sensitively on the raw word)
pub const BLACKLISTED_WORDS: &[&str] = &["and", "or", "with"];

/// Characters stripped from inside every surviving word
pub const BLACKLISTED_CHARS: &[char] = &[
    ';', ':', '.', ',', '{', '}', '[', ']', '\\', '%', '$', '\'', '<', '>', '!', '"', '-',
];

/// Removes unnecessary whitespace from raw page text
///
/// The input is split on line breaks, every line is trimmed, empty lines are dropped and the
/// survivors are joined with a single space.
///
/// # Examples
///
/// ```
/// use asura_crow::text::extract_strings;
///
/// assert_eq!(extract_strings("Line 1\n\n  Line 2\nLine 3\n"), "Line 1 Line 2 Line 3");
/// ```
pub fn extract_strings(content: &str) -> String {
    content
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cleans text by removing blacklisted tokens and lowercasing what remains
///
/// # Cleaning Steps
///
/// For every word (split on single spaces):
/// 1. Drop it if it is a blacklisted word or a lone blacklisted character
/// 2. Strip every blacklisted character from inside it
/// 3. Trim and lowercase the remainder
/// 4. Drop the remainder if it is empty or has become a blacklisted word
///
/// # Examples
///
/// ```
/// use asura_crow::text::clean_content;
///
/// let cleaned = clean_content("This is a: test, of \"the\" 'cleaning' function.");
/// assert_eq!(cleaned, "this is a test of the cleaning function");
/// ```
pub fn clean_content(content: &str) -> String {
    content
        .split(' ')
        .filter(|word| !is_blacklisted_word(word))
        .filter_map(clean_word)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs both normalization passes: [`extract_strings`] then [`clean_content`]
pub fn normalize(content: &str) -> String {
    clean_content(&extract_strings(content))
}

fn is_blacklisted_word(word: &str) -> bool {
    if BLACKLISTED_WORDS.contains(&word) {
        return true;
    }

    let mut chars = word.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(c), None) if BLACKLISTED_CHARS.contains(&c)
    )
}

fn clean_word(word: &str) -> Option<String> {
    let stripped: String = word
        .chars()
        .filter(|c| !BLACKLISTED_CHARS.contains(c))
        .collect();
    let lowered = stripped.trim().to_lowercase();

    if lowered.is_empty() || BLACKLISTED_WORDS.contains(&lowered.as_str()) {
        None
    } else {
        Some(lowered)
    }
}
