//! API handlers.

pub mod auth;
pub mod board;
pub mod media;
pub mod reply;
pub mod thread;

use jsonwebtoken::{encode, EncodingKey, Header};

use crate::db::User;
use crate::media::ImageStorage;
use crate::web::error::ApiError;
use crate::web::middleware::JwtClaims;
use crate::Database;

pub use auth::{login, me, register};
pub use board::{create_board, delete_board, get_board, list_boards, update_board};
pub use media::{upload_reply_image, upload_thread_image};
pub use reply::{create_reply, delete_reply, get_reply, list_replies, update_reply};
pub use thread::{
    create_thread, delete_thread, downvote_thread, get_thread, list_threads, update_thread,
    upvote_thread,
};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database handle (the pool is internally shared).
    pub db: Database,
    /// JWT encoding key.
    pub encoding_key: EncodingKey,
    /// Access token expiry in seconds.
    pub access_token_expiry: u64,
    /// Image storage.
    pub storage: ImageStorage,
    /// Maximum image upload size in bytes.
    pub max_upload_size: usize,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        db: Database,
        jwt_secret: &str,
        access_expiry: u64,
        storage: ImageStorage,
        max_upload_size_mb: u64,
    ) -> Self {
        Self {
            db,
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            access_token_expiry: access_expiry,
            storage,
            max_upload_size: (max_upload_size_mb as usize).saturating_mul(1024 * 1024),
        }
    }

    /// Generate an access token for a user.
    pub fn generate_access_token(&self, user: &User) -> Result<String, ApiError> {
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = JwtClaims {
            sub: user.id,
            username: user.username.clone(),
            is_admin: user.is_admin,
            iat: now,
            exp: now + self.access_token_expiry,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode JWT: {}", e);
            ApiError::internal("Failed to generate token")
        })
    }
}
