use crate::auth::AuthUser;
use crate::error::Result;
use crate::state::AppState;
use axum::{extract::State, Json};
use bookclub_protocol::UserData;

pub async fn get_me(State(state): State<AppState>, auth: AuthUser) -> Result<Json<UserData>> {
    let user = state.user_service.get_by_id(auth.user_id).await?;
    Ok(Json(user.into()))
}
