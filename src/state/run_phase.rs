/// Run phase definitions for the crawl engine
///
/// A run moves strictly forward: `Idle -> Running -> Draining -> Done`.
/// There are no backward transitions and a finished run cannot be restarted.
use std::fmt;

/// Represents the lifecycle phase of a single crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    /// Created, nothing fetched yet
    Idle,

    /// Frontier is being processed
    Running,

    /// Frontier exhausted or interrupted; no new work is scheduled
    Draining,

    /// Results are final
    Done,
}

impl RunPhase {
    /// Returns true if the transition from `self` to `next` is allowed
    ///
    /// Only the single forward step is permitted. `Idle -> Draining` is
    /// allowed for runs interrupted before the first page.
    pub fn can_transition_to(&self, next: RunPhase) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Idle, Self::Draining)
                | (Self::Running, Self::Draining)
                | (Self::Draining, Self::Done)
        )
    }

    /// Returns true if this is the terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
