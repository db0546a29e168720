//! Access policy for sixchan.
//!
//! A pure decision function: given who is acting, what they want to do and
//! on which kind of resource, say whether the operation may proceed.

use crate::{ChanError, Result};

/// An authenticated actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    /// User ID.
    pub id: i64,
    /// Whether the user carries the administrator flag.
    pub is_admin: bool,
}

impl Identity {
    /// Create a new identity.
    pub fn new(id: i64, is_admin: bool) -> Self {
        Self { id, is_admin }
    }
}

/// Operation requested on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    Delete,
    Upvote,
    Downvote,
}

impl Action {
    /// Read-only actions.
    pub fn is_safe(&self) -> bool {
        matches!(self, Action::List | Action::Retrieve)
    }
}

/// Resource an action applies to.
///
/// Owner is `None` for collection-level actions (list, create).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Board,
    Thread { owner: Option<i64> },
    Reply { owner: Option<i64> },
}

/// Outcome of a policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    /// No identity where one is required.
    Unauthorized,
    /// Identity present but not permitted.
    Forbidden,
}

impl Decision {
    /// Convert the decision into a `Result`, mapping denials to errors.
    pub fn into_result(self) -> Result<()> {
        match self {
            Decision::Allowed => Ok(()),
            Decision::Unauthorized => Err(ChanError::Unauthorized(
                "Authentication credentials were not provided.".to_string(),
            )),
            Decision::Forbidden => Err(ChanError::Forbidden(
                "You do not have permission to perform this action.".to_string(),
            )),
        }
    }
}

/// Decide whether `actor` may perform `action` on `target`.
///
/// # Examples
///
/// ```
/// use sixchan::auth::{permit, Action, Decision, Identity, Target};
///
/// let admin = Identity::new(1, true);
/// let member = Identity::new(2, false);
///
/// assert_eq!(permit(None, Action::List, Target::Board), Decision::Allowed);
/// assert_eq!(permit(None, Action::Create, Target::Board), Decision::Unauthorized);
/// assert_eq!(permit(Some(&member), Action::Create, Target::Board), Decision::Forbidden);
/// assert_eq!(permit(Some(&admin), Action::Create, Target::Board), Decision::Allowed);
/// ```
pub fn permit(actor: Option<&Identity>, action: Action, target: Target) -> Decision {
    match target {
        Target::Board => {
            if action.is_safe() {
                return Decision::Allowed;
            }
            match actor {
                None => Decision::Unauthorized,
                Some(a) if a.is_admin => Decision::Allowed,
                Some(_) => Decision::Forbidden,
            }
        }
        Target::Thread { owner } => match action {
            Action::List | Action::Retrieve | Action::Upvote | Action::Downvote => {
                Decision::Allowed
            }
            Action::Create => authenticated(actor),
            Action::Update | Action::Delete => owner_only(actor, owner),
        },
        Target::Reply { owner } => match action {
            Action::List | Action::Retrieve => Decision::Allowed,
            Action::Create => authenticated(actor),
            // Votes only exist on threads.
            Action::Upvote | Action::Downvote => match actor {
                None => Decision::Unauthorized,
                Some(_) => Decision::Forbidden,
            },
            Action::Update | Action::Delete => owner_only(actor, owner),
        },
    }
}

fn authenticated(actor: Option<&Identity>) -> Decision {
    match actor {
        Some(_) => Decision::Allowed,
        None => Decision::Unauthorized,
    }
}

fn owner_only(actor: Option<&Identity>, owner: Option<i64>) -> Decision {
    match actor {
        None => Decision::Unauthorized,
        Some(a) if owner == Some(a.id) => Decision::Allowed,
        Some(_) => Decision::Forbidden,
    }
}
