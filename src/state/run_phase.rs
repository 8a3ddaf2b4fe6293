/// Crawl run phase definitions
///
/// A run starts `Running`, moves to `Draining` once nothing is queued and nothing is in
/// flight, and ends `Terminated` once a worker has observed the drained state. The frontier
/// only changes phase along [`RunPhase::can_transition_to`].
use std::fmt;

/// Represents the current phase of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    /// Workers are active and the frontier may still be refilled
    Running,

    /// No URL is in flight and the frontier is empty
    Draining,

    /// Final phase; no further work is possible
    Terminated,
}

impl RunPhase {
    /// Returns true if this is the final phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    ///
    /// `Draining` can fall back to `Running` when a seed arrives before any worker has
    /// observed the drained state.
    pub fn can_transition_to(&self, next: RunPhase) -> bool {
        matches!(
            (self, next),
            (Self::Running, Self::Draining)
                | (Self::Running, Self::Terminated)
                | (Self::Draining, Self::Running)
                | (Self::Draining, Self::Terminated)
        )
    }

    /// Returns the lowercase name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
