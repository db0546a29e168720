//! Web API module for sixchan.
//!
//! JSON REST API under `/api` for boards, threads, replies and votes, plus
//! image uploads and the account endpoints that issue access tokens.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
