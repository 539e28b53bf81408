use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Rejections of the membership authority
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipError {
    #[error("Club not found")]
    ClubNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("User is already a member of this club")]
    AlreadyMember,

    #[error("User is not a member of this club")]
    NotAMember,

    #[error("The main admin cannot leave the club")]
    MainAdminCannotLeave,

    #[error("Member not found")]
    MemberNotFound,

    #[error("Admin not found")]
    AdminNotFound,

    #[error("The main admin cannot be demoted")]
    CannotDemoteMainAdmin,

    #[error("The main admin cannot be removed")]
    CannotRemoveMainAdmin,

    #[error("Only club admins can do this")]
    NotClubAdmin,

    #[error("Only club members can do this")]
    NotClubMember,

    #[error("Only the main admin can transfer ownership")]
    NotMainAdmin,
}

impl MembershipError {
    pub fn kind(&self) -> &'static str {
        match self {
            MembershipError::ClubNotFound => "club_not_found",
            MembershipError::UserNotFound => "user_not_found",
            MembershipError::AlreadyMember => "already_member",
            MembershipError::NotAMember => "not_a_member",
            MembershipError::MainAdminCannotLeave => "main_admin_cannot_leave",
            MembershipError::MemberNotFound => "member_not_found",
            MembershipError::AdminNotFound => "admin_not_found",
            MembershipError::CannotDemoteMainAdmin => "cannot_demote_main_admin",
            MembershipError::CannotRemoveMainAdmin => "cannot_remove_main_admin",
            MembershipError::NotClubAdmin => "not_club_admin",
            MembershipError::NotClubMember => "not_club_member",
            MembershipError::NotMainAdmin => "not_main_admin",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            MembershipError::ClubNotFound
            | MembershipError::UserNotFound
            | MembershipError::MemberNotFound
            | MembershipError::AdminNotFound => StatusCode::NOT_FOUND,
            MembershipError::AlreadyMember
            | MembershipError::NotAMember
            | MembershipError::MainAdminCannotLeave
            | MembershipError::CannotDemoteMainAdmin
            | MembershipError::CannotRemoveMainAdmin => StatusCode::BAD_REQUEST,
            MembershipError::NotClubAdmin
            | MembershipError::NotClubMember
            | MembershipError::NotMainAdmin => StatusCode::FORBIDDEN,
        }
    }
}

/// Rejections of the message store and chat gateway
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatError {
    #[error("Both text and club_id are required")]
    MissingFields,

    #[error("Message text cannot be empty")]
    EmptyText,

    #[error("Message has no club")]
    MissingClub,

    #[error("Message has no sender")]
    MissingSender,

    #[error("Authentication required to send messages")]
    Unauthenticated,

    #[error("Message not found")]
    MessageNotFound,

    #[error("Only the sender or a club admin can delete this message")]
    NotAllowed,
}

impl ChatError {
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::MissingFields => "missing_fields",
            ChatError::EmptyText => "empty_text",
            ChatError::MissingClub => "missing_club",
            ChatError::MissingSender => "missing_sender",
            ChatError::Unauthenticated => "unauthenticated",
            ChatError::MessageNotFound => "message_not_found",
            ChatError::NotAllowed => "not_allowed",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ChatError::MissingFields
            | ChatError::EmptyText
            | ChatError::MissingClub
            | ChatError::MissingSender => StatusCode::BAD_REQUEST,
            ChatError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ChatError::MessageNotFound => StatusCode::NOT_FOUND,
            ChatError::NotAllowed => StatusCode::FORBIDDEN,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Membership(#[from] MembershipError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Stable machine-readable kind, sent alongside the message
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "unauthorized",
            AppError::NotFound(_) => "not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::Membership(e) => e.kind(),
            AppError::Chat(e) => e.kind(),
            AppError::Internal(_) => "internal",
            AppError::Database(_) => "database",
            AppError::Jwt(_) => "invalid_token",
        }
    }
}

/// Malformed bodies and path segments are validation errors like any other
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Membership(e) => (e.status(), e.to_string()),
            AppError::Chat(e) => (e.status(), e.to_string()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::Jwt(_) => (StatusCode::UNAUTHORIZED, "Invalid token".to_string()),
        };

        let body = Json(json!({
            "error": message,
            "kind": self.kind(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
