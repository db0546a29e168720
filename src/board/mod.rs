//! Boards, threads, the reply tree and the vote ledger.
//!
//! Repositories talk to the database; [`BoardService`] puts the access
//! policy and input validation in front of them.

mod cascade;
mod reply;
mod reply_repository;
mod repository;
mod service;
mod thread;
mod thread_repository;
mod types;
mod vote;
mod vote_repository;

pub use cascade::Removed;
pub use reply::{AttachTarget, NewReply, Reply, ReplyFilter, ReplyUpdate};
pub use reply_repository::ReplyRepository;
pub use repository::BoardRepository;
pub use service::{invalid_pk, BoardInput, BoardService, ReplyInput, ThreadInput};
pub use thread::{NewThread, Thread, ThreadFilter, ThreadUpdate, MAX_TITLE_LENGTH};
pub use thread_repository::ThreadRepository;
pub use types::{Board, BoardUpdate, NewBoard, MAX_BOARD_CODE_LENGTH, MAX_BOARD_NAME_LENGTH};
pub use vote::{transition, VoteKind, VoteOutcome, VoteState};
pub use vote_repository::{VoteLedger, VoteTally};
