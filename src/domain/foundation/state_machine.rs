//! State machine trait for status enums.
//!
//! User-initiated subscription changes go through this trait so that an
//! illegal move (say, starting a trial from `active`) is rejected in one place.

use super::ValidationError;

/// Trait for status enums that represent state machines.
///
/// Implementors list their legal moves; `transition_to` then validates
/// against that table.
///
/// ```ignore
/// let next = SubscriptionStatus::None.transition_to(SubscriptionStatus::Trial)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!(
                    "Cannot transition from {:?} to {:?} (allowed: {:?})",
                    self,
                    target,
                    self.valid_transitions()
                ),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Door {
        Open,
        Closed,
        Welded,
    }

    impl StateMachine for Door {
        fn can_transition_to(&self, target: &Self) -> bool {
            self.valid_transitions().contains(target)
        }

        fn valid_transitions(&self) -> Vec<Self> {
            match self {
                Door::Open => vec![Door::Closed],
                Door::Closed => vec![Door::Open, Door::Welded],
                Door::Welded => vec![],
            }
        }
    }

    #[test]
    fn legal_transition_returns_target() {
        assert_eq!(Door::Closed.transition_to(Door::Welded), Ok(Door::Welded));
    }

    #[test]
    fn illegal_transition_names_both_states() {
        let err = Door::Open.transition_to(Door::Welded).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("Open"));
        assert!(text.contains("Welded"));
    }

    #[test]
    fn illegal_transition_lists_allowed_targets() {
        let err = Door::Welded.transition_to(Door::Open).unwrap_err();
        assert!(err.to_string().contains("(allowed: [])"));

        let err = Door::Open.transition_to(Door::Welded).unwrap_err();
        assert!(err.to_string().contains("(allowed: [Closed])"));
    }
}
