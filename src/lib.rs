//! sixchan - an imageboard discussion backend.
//!
//! Admin-managed boards hold threads; threads collect a tree of replies and
//! one up- or downvote per user. Everything is exposed as a JSON API under
//! `/api`.

pub mod auth;
pub mod board;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod media;
pub mod web;

pub use config::Config;
pub use db::Database;
pub use error::{ChanError, FieldErrors, Result};
