use crate::auth::AuthUser;
use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::WithRejection;
use bookclub_protocol::{ClubData, MemberData};
use uuid::Uuid;

pub async fn join_club(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Path(club_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<ClubData>> {
    let club = state.membership_service.join(club_id, auth.user_id).await?;
    Ok(Json(club))
}

pub async fn leave_club(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Path(club_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<ClubData>> {
    let club = state.membership_service.leave(club_id, auth.user_id).await?;
    Ok(Json(club))
}

pub async fn promote_member(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Path((club_id, user_id)), _): WithRejection<Path<(Uuid, Uuid)>, AppError>,
) -> Result<Json<ClubData>> {
    let club = state
        .membership_service
        .promote(club_id, auth.user_id, user_id)
        .await?;
    Ok(Json(club))
}

pub async fn demote_admin(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Path((club_id, user_id)), _): WithRejection<Path<(Uuid, Uuid)>, AppError>,
) -> Result<Json<ClubData>> {
    let club = state
        .membership_service
        .demote(club_id, auth.user_id, user_id)
        .await?;
    Ok(Json(club))
}

pub async fn remove_member(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Path((club_id, user_id)), _): WithRejection<Path<(Uuid, Uuid)>, AppError>,
) -> Result<Json<ClubData>> {
    let club = state
        .membership_service
        .remove(club_id, auth.user_id, user_id)
        .await?;
    Ok(Json(club))
}

pub async fn list_members(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Path(club_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<Vec<MemberData>>> {
    state
        .membership_service
        .require_member(club_id, auth.user_id)
        .await?;

    let members = state.membership_service.list_members(club_id).await?;
    Ok(Json(members))
}

pub async fn transfer_ownership(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Path((club_id, user_id)), _): WithRejection<Path<(Uuid, Uuid)>, AppError>,
) -> Result<Json<ClubData>> {
    let club = state
        .membership_service
        .transfer_ownership(club_id, auth.user_id, user_id)
        .await?;
    Ok(Json(club))
}
