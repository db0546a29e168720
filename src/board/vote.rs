//! Vote transitions for sixchan.
//!
//! Each (user, thread) pair is in exactly one [`VoteState`]. Casting the vote
//! you already hold cancels it; casting the opposite one swaps it.

use std::fmt;

/// Vote held by one user on one thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoteState {
    #[default]
    None,
    Upvoted,
    Downvoted,
}

/// Direction of a cast vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteKind {
    Up,
    Down,
}

impl VoteKind {
    /// State reached by casting this vote from a neutral state.
    pub fn held_state(&self) -> VoteState {
        match self {
            VoteKind::Up => VoteState::Upvoted,
            VoteKind::Down => VoteState::Downvoted,
        }
    }

    /// Table storing votes of this kind.
    pub(super) fn table(&self) -> &'static str {
        match self {
            VoteKind::Up => "upvotes",
            VoteKind::Down => "downvotes",
        }
    }

    /// Confirmation returned to the voter.
    pub fn message(&self) -> &'static str {
        match self {
            VoteKind::Up => "You've done upvoting the thread!",
            VoteKind::Down => "You've done downvoting the thread!",
        }
    }
}

impl fmt::Display for VoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteKind::Up => write!(f, "upvote"),
            VoteKind::Down => write!(f, "downvote"),
        }
    }
}

/// What a cast did to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// A new vote was recorded.
    Cast,
    /// The opposite vote was replaced.
    Swapped,
    /// The existing vote was withdrawn.
    Cancelled,
}

/// Compute the next state and outcome for casting `kind` from `state`.
///
/// # Examples
///
/// ```
/// use sixchan::board::{transition, VoteKind, VoteOutcome, VoteState};
///
/// assert_eq!(
///     transition(VoteState::Upvoted, VoteKind::Up),
///     (VoteState::None, VoteOutcome::Cancelled)
/// );
/// ```
pub fn transition(state: VoteState, kind: VoteKind) -> (VoteState, VoteOutcome) {
    match (state, kind) {
        (VoteState::None, kind) => (kind.held_state(), VoteOutcome::Cast),
        (VoteState::Upvoted, VoteKind::Up) | (VoteState::Downvoted, VoteKind::Down) => {
            (VoteState::None, VoteOutcome::Cancelled)
        }
        (VoteState::Upvoted, VoteKind::Down) => (VoteState::Downvoted, VoteOutcome::Swapped),
        (VoteState::Downvoted, VoteKind::Up) => (VoteState::Upvoted, VoteOutcome::Swapped),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        use VoteKind::*;
        use VoteOutcome::*;

        let table = [
            (VoteState::None, Up, VoteState::Upvoted, Cast),
            (VoteState::None, Down, VoteState::Downvoted, Cast),
            (VoteState::Upvoted, Up, VoteState::None, Cancelled),
            (VoteState::Upvoted, Down, VoteState::Downvoted, Swapped),
            (VoteState::Downvoted, Up, VoteState::Upvoted, Swapped),
            (VoteState::Downvoted, Down, VoteState::None, Cancelled),
        ];

        for (from, kind, to, outcome) in table {
            assert_eq!(transition(from, kind), (to, outcome), "{from:?} + {kind}");
        }
    }

    #[test]
    fn test_repeat_vote_toggles_off() {
        for kind in [VoteKind::Up, VoteKind::Down] {
            let (held, _) = transition(VoteState::None, kind);
            let (after, outcome) = transition(held, kind);
            assert_eq!(after, VoteState::None);
            assert_eq!(outcome, VoteOutcome::Cancelled);
        }
    }

    #[test]
    fn test_kind_helpers() {
        assert_eq!(VoteKind::Up.held_state(), VoteState::Upvoted);
        assert_eq!(VoteKind::Down.held_state(), VoteState::Downvoted);
        assert_eq!(VoteKind::Up.table(), "upvotes");
        assert_eq!(VoteKind::Down.table(), "downvotes");
        assert_eq!(VoteKind::Down.to_string(), "downvote");
        assert_eq!(VoteState::default(), VoteState::None);
    }
}
