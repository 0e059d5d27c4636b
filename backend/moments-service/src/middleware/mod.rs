/// Request identity for moments-service
///
/// Tokens are validated by the API gateway, which forwards the caller's id in
/// the `x-user-id` header. Handlers turn that id into a `User` through the
/// `UserRepository`.
use crate::db::UserRepository;
use crate::error::AppError;
use crate::models::User;
use actix_web::{dev::Payload, FromRequest, HttpRequest};
use std::future::{ready, Ready};

pub const USER_ID_HEADER: &str = "x-user-id";

/// Caller id taken from the gateway header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub i64);

impl UserId {
    /// Load the full user, failing with `Unauthorized` for unknown ids
    pub async fn resolve(self, users: &dyn UserRepository) -> Result<User, AppError> {
        users
            .find_user(self.0)
            .await?
            .ok_or_else(|| AppError::Unauthorized(format!("Unknown user {}", self.0)))
    }
}

impl FromRequest for UserId {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(extract_user_id(req))
    }
}

fn extract_user_id(req: &HttpRequest) -> Result<UserId, AppError> {
    let header_value = req
        .headers()
        .get(USER_ID_HEADER)
        .ok_or_else(|| AppError::Unauthorized("Missing x-user-id header".into()))?;

    let value = header_value
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid x-user-id header".into()))?;

    value
        .trim()
        .parse::<i64>()
        .map(UserId)
        .map_err(|_| AppError::Unauthorized("Invalid x-user-id header value".into()))
}
