mod clubs;
mod membership;
mod messages;
mod users;

use crate::state::AppState;
use crate::ws;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(|| async { "OK" }))
        // User routes
        .route("/api/users/me", get(users::get_me))
        // Club routes
        .route("/api/clubs", post(clubs::create_club).get(clubs::list_clubs))
        .route("/api/clubs/{club_id}", get(clubs::get_club))
        // Membership routes
        .route("/api/clubs/{club_id}/join", post(membership::join_club))
        .route("/api/clubs/{club_id}/leave", delete(membership::leave_club))
        .route("/api/clubs/{club_id}/members", get(membership::list_members))
        .route(
            "/api/clubs/{club_id}/members/{user_id}",
            delete(membership::remove_member),
        )
        .route(
            "/api/clubs/{club_id}/promote/{user_id}",
            put(membership::promote_member),
        )
        .route(
            "/api/clubs/{club_id}/demote/{user_id}",
            put(membership::demote_admin),
        )
        .route(
            "/api/clubs/{club_id}/transfer-ownership/{user_id}",
            put(membership::transfer_ownership),
        )
        // Message routes
        .route("/api/messages", post(messages::send_message))
        .route(
            "/api/messages/club/{club_id}",
            get(messages::list_club_messages),
        )
        .route(
            "/api/messages/{message_id}",
            delete(messages::delete_message),
        )
        // WebSocket endpoint
        .route("/ws", get(ws::handler::ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
