//! Core types shared across the pipeline.

mod state;

pub use state::{is_shutdown, register_server, request_shutdown, setup_shutdown_handler};

/// Phase of a running dev session.
///
/// Owned by the watch loop and passed through explicitly; a session is
/// `Idle` between triggered runs and `Building` while a task executes.
/// Partial failures return to `Idle` (watch mode keeps running); only
/// fatal filesystem errors terminate the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Building,
}

impl SessionPhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Building => "building",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_label() {
        assert_eq!(SessionPhase::Idle.label(), "idle");
        assert_eq!(SessionPhase::Building.label(), "building");
    }
}
