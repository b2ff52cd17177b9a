//! Sequence state tracking.
//!
//! `NotStarted -> Running(i) -> Running(i + 1) -> ... -> Succeeded | FailedAt(i)`
//!
//! Steps advance one at a time; terminal states have no way out.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceState {
    NotStarted,

    /// Step at this index is executing
    Running(usize),

    /// Every step returned zero
    Succeeded,

    /// Step at this index halted the sequence
    FailedAt(usize),
}

impl SequenceState {
    /// Check if a transition to the given state is valid.
    pub fn can_transition_to(&self, next: SequenceState) -> bool {
        match (*self, next) {
            (SequenceState::NotStarted, SequenceState::Running(0)) => true,
            (SequenceState::Running(i), SequenceState::Running(j)) => j == i + 1,
            (SequenceState::Running(_), SequenceState::Succeeded) => true,
            (SequenceState::Running(i), SequenceState::FailedAt(j)) => i == j,
            _ => false,
        }
    }
}

impl fmt::Display for SequenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceState::NotStarted => write!(f, "not-started"),
            SequenceState::Running(i) => write!(f, "running({})", i),
            SequenceState::Succeeded => write!(f, "succeeded"),
            SequenceState::FailedAt(i) => write!(f, "failed-at({})", i),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        assert!(SequenceState::NotStarted.can_transition_to(SequenceState::Running(0)));
        assert!(SequenceState::Running(0).can_transition_to(SequenceState::Running(1)));
        assert!(SequenceState::Running(2).can_transition_to(SequenceState::Succeeded));
        assert!(SequenceState::Running(2).can_transition_to(SequenceState::FailedAt(2)));
    }

    #[test]
    fn test_rejected_transitions() {
        assert!(!SequenceState::NotStarted.can_transition_to(SequenceState::Running(1)));
        assert!(!SequenceState::NotStarted.can_transition_to(SequenceState::Succeeded));
        assert!(!SequenceState::Running(0).can_transition_to(SequenceState::Running(2)));
        assert!(!SequenceState::Running(1).can_transition_to(SequenceState::FailedAt(0)));
        assert!(!SequenceState::Succeeded.can_transition_to(SequenceState::Running(0)));
        assert!(!SequenceState::FailedAt(1).can_transition_to(SequenceState::Running(0)));
    }

    #[test]
    fn test_terminal_states() {
        assert!(!SequenceState::Succeeded.can_transition_to(SequenceState::Running(0)));
        assert!(!SequenceState::FailedAt(0).can_transition_to(SequenceState::Succeeded));
        assert_eq!(SequenceState::FailedAt(3).to_string(), "failed-at(3)");
    }
}
