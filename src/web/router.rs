//! Router configuration for the web API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::handlers::{
    create_board, create_reply, create_thread, delete_board, delete_reply, delete_thread,
    downvote_thread, get_board, get_reply, get_thread, list_boards, list_replies, list_threads,
    login, me, register, update_board, update_reply, update_thread, upload_reply_image,
    upload_thread_image, upvote_thread, AppState,
};
use super::middleware::{create_cors_layer, jwt_auth, JwtState};

/// Headroom for multipart framing on top of the image size limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the main API router.
pub fn create_router(
    app_state: Arc<AppState>,
    jwt_state: Arc<JwtState>,
    cors_origins: &[String],
) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me));

    let board_routes = Router::new()
        .route("/", get(list_boards).post(create_board))
        .route(
            "/:id",
            get(get_board)
                .put(update_board)
                .patch(update_board)
                .delete(delete_board),
        );

    let upload_limit = DefaultBodyLimit::max(
        app_state
            .max_upload_size
            .saturating_add(MULTIPART_OVERHEAD),
    );

    let thread_routes = Router::new()
        .route(
            "/",
            get(list_threads)
                .post(create_thread)
                .layer(upload_limit.clone()),
        )
        .route(
            "/:id",
            get(get_thread)
                .put(update_thread)
                .patch(update_thread)
                .delete(delete_thread),
        )
        .route("/:id/upvote-thread", post(upvote_thread))
        .route("/:id/downvote-thread", post(downvote_thread))
        .route(
            "/:id/image",
            put(upload_thread_image).layer(upload_limit.clone()),
        );

    let reply_routes = Router::new()
        .route(
            "/",
            get(list_replies)
                .post(create_reply)
                .layer(upload_limit.clone()),
        )
        .route(
            "/:id",
            get(get_reply)
                .put(update_reply)
                .patch(update_reply)
                .delete(delete_reply),
        )
        .route("/:id/image", put(upload_reply_image).layer(upload_limit));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/boards", board_routes)
        .nest("/threads", thread_routes)
        .nest("/replies", reply_routes)
        .nest_service("/uploads", ServeDir::new(app_state.storage.uploads_dir()));

    let jwt_state_for_middleware = jwt_state.clone();

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(move |req, next| {
                    let state = jwt_state_for_middleware.clone();
                    jwt_auth(state, req, next)
                })),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/api/health", get(health_check))
}

async fn health_check() -> &'static str {
    "OK"
}
