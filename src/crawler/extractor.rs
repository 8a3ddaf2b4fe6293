//! Streaming page extraction built on `lol_html`
//!
//! The page body is tokenized as it arrives; no document tree is ever built. Text tokens are
//! appended to an accumulator unless the most recent start tag was `script` or `style`, and
//! every `href` on an `a` tag goes through the link resolver. At end of stream the
//! accumulated text is normalized.

use crate::crawler::fetcher::PageBody;
use crate::text::normalize;
use crate::url::resolve_link;
use bytes::Bytes;
use futures::StreamExt;
use lol_html::html_content::Element;
use lol_html::{doc_text, element, HtmlRewriter, Settings};
use std::cell::RefCell;
use std::io::{self, Read};
use std::rc::Rc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Size of the buffer the tokenizer is fed from
const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Number of body chunks buffered between the network and the tokenizer
const CHUNK_CHANNEL_CAPACITY: usize = 16;

/// Errors surfaced while extracting a page
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to read page body: {0}")]
    Read(#[from] io::Error),

    #[error("Extraction task failed: {0}")]
    Task(String),
}

/// Links discovered on a page, in document order
///
/// The sequence is produced once per extraction and cannot be restarted.
#[derive(Debug)]
pub struct DiscoveredLinks {
    inner: std::vec::IntoIter<String>,
}

impl Iterator for DiscoveredLinks {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for DiscoveredLinks {}

/// Result of extracting one page
#[derive(Debug)]
pub struct Extraction {
    /// Normalized visible text
    pub text: String,

    /// Absolute URLs found in `a` tags
    pub links: DiscoveredLinks,
}

#[derive(Debug, Default)]
struct ExtractState {
    text: String,
    links: Vec<String>,
    suppress_text: bool,
}

/// Extracts text and links from an HTML byte stream
///
/// Whichever start tag was seen last decides whether text is collected: `script` and
/// `style` switch collection off, any other tag switches it back on. End tags do not
/// change the decision.
///
/// Markup the tokenizer cannot handle ends extraction early with whatever was collected.
///
/// # Arguments
///
/// * `reader` - The page body
/// * `page_url` - The URL the body was fetched from
///
/// # Returns
///
/// * `Ok(Extraction)` - Normalized text and discovered links
/// * `Err(ExtractError)` - Reading the body failed
///
/// # Example
///
/// ```
/// use asura_crow::crawler::extract_page;
///
/// let html = r#"<p>Hello <a href="https://example.com/a">World</a></p>"#;
/// let extraction = extract_page(html.as_bytes(), "https://example.com/").unwrap();
/// assert_eq!(extraction.text, "hello world");
/// assert_eq!(extraction.links.collect::<Vec<_>>(), vec!["https://example.com/a"]);
/// ```
pub fn extract_page<R: Read>(mut reader: R, page_url: &str) -> Result<Extraction, ExtractError> {
    let state = Rc::new(RefCell::new(ExtractState::default()));
    let element_state = Rc::clone(&state);
    let text_state = Rc::clone(&state);
    let base_url = page_url.to_string();

    let element_handler = element!("*", move |el: &mut Element<'_, '_>| {
        let tag = el.tag_name().to_ascii_lowercase();
        let mut state = element_state.borrow_mut();
        state.suppress_text = tag == "script" || tag == "style";

        if tag == "a" {
            for attr in el.attributes() {
                if !attr.name().eq_ignore_ascii_case("href") {
                    continue;
                }
                if let Some(link) = resolve_link(&attr.value(), &base_url) {
                    state.links.push(link);
                }
            }
        }

        Ok(())
    });

    let text_handler = doc_text!(move |chunk| {
        let mut state = text_state.borrow_mut();
        if !state.suppress_text {
            state.text.push_str(chunk.as_str());
        }
        Ok(())
    });

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![element_handler],
            document_content_handlers: vec![text_handler],
            ..Settings::default()
        },
        |_: &[u8]| {},
    );

    let mut buffer = [0u8; READ_BUFFER_SIZE];
    let mut malformed = false;
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ExtractError::Read(e)),
        };

        if let Err(e) = rewriter.write(&buffer[..read]) {
            tracing::debug!("Stopping extraction of {} early: {}", page_url, e);
            malformed = true;
            break;
        }
    }

    if malformed {
        drop(rewriter);
    } else if let Err(e) = rewriter.end() {
        tracing::debug!("Failed to finish extraction of {}: {}", page_url, e);
    }

    let ExtractState { text, links, .. } = state.take();
    let text = normalize(&html_escape::decode_html_entities(&text));

    Ok(Extraction {
        text,
        links: DiscoveredLinks {
            inner: links.into_iter(),
        },
    })
}

/// Blocking reader over body chunks forwarded from an async task
///
/// Must only be read from outside the async runtime (e.g. in `spawn_blocking`).
struct ChunkReader {
    receiver: mpsc::Receiver<io::Result<Bytes>>,
    current: Bytes,
}

impl ChunkReader {
    /// Creates a reader draining `receiver`
    fn new(receiver: mpsc::Receiver<io::Result<Bytes>>) -> Self {
        Self {
            receiver,
            current: Bytes::new(),
        }
    }
}

impl Read for ChunkReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        while self.current.is_empty() {
            match self.receiver.blocking_recv() {
                Some(Ok(chunk)) => self.current = chunk,
                Some(Err(e)) => return Err(e),
                None => return Ok(0),
            }
        }

        let n = buf.len().min(self.current.len());
        buf[..n].copy_from_slice(&self.current[..n]);
        self.current = self.current.slice(n..);
        Ok(n)
    }
}

/// Extracts a page from an async body stream
///
/// Tokenization runs on the blocking pool while this task forwards body chunks to it
/// through a bounded channel. A transport error in the body is reported as
/// [`ExtractError::Read`]. The body is dropped before this function returns.
pub async fn extract_stream(body: PageBody, page_url: &str) -> Result<Extraction, ExtractError> {
    let (sender, receiver) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);
    let url = page_url.to_string();
    let task = tokio::task::spawn_blocking(move || extract_page(ChunkReader::new(receiver), &url));

    let mut body = body;
    while let Some(chunk) = body.next().await {
        let failed = chunk.is_err();
        if sender.send(chunk).await.is_err() {
            // The tokenizer stopped reading
            break;
        }
        if failed {
            break;
        }
    }
    drop(sender);
    drop(body);

    task.await.map_err(|e| ExtractError::Task(e.to_string()))?
}
