use crate::auth::AuthUser;
use crate::error::{AppError, MembershipError, Result};
use crate::models::CreateClub;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use bookclub_protocol::ClubData;
use uuid::Uuid;

pub async fn create_club(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Json(input), _): WithRejection<Json<CreateClub>, AppError>,
) -> Result<(StatusCode, Json<ClubData>)> {
    let creator = state
        .user_service
        .find_by_id(auth.user_id)
        .await?
        .ok_or(MembershipError::UserNotFound)?;

    let club = state.club_service.create(&creator, input).await?;
    let snapshot = state.club_service.snapshot(club.id).await?;

    Ok((StatusCode::CREATED, Json(snapshot)))
}

pub async fn list_clubs(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<ClubData>>> {
    let clubs = state.club_service.list().await?;

    let mut result = Vec::with_capacity(clubs.len());
    for club in clubs {
        result.push(state.club_service.snapshot(club.id).await?);
    }

    Ok(Json(result))
}

pub async fn get_club(
    State(state): State<AppState>,
    _auth: AuthUser,
    WithRejection(Path(club_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<ClubData>> {
    let snapshot = state.club_service.snapshot(club_id).await?;
    Ok(Json(snapshot))
}
