/// Love handlers
use crate::error::Result;
use crate::handlers::AppState;
use crate::middleware::UserId;
use actix_web::{web, HttpResponse};

/// POST /api/v1/posts/{post_id}/loves
pub async fn love_post(
    state: web::Data<AppState>,
    user_id: UserId,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = user_id.resolve(state.users.as_ref()).await?;
    state.loves.love_post(&user, *post_id).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// DELETE /api/v1/posts/{post_id}/loves
pub async fn unlove_post(
    state: web::Data<AppState>,
    user_id: UserId,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = user_id.resolve(state.users.as_ref()).await?;
    state.loves.unlove_post(&user, *post_id).await?;

    Ok(HttpResponse::NoContent().finish())
}
