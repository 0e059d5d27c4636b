/// Post handlers - HTTP endpoints for post operations
use crate::error::Result;
use crate::handlers::multipart::read_post_form;
use crate::handlers::AppState;
use crate::middleware::UserId;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

/// Query for a family page. `postId` is the keyset cursor.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPostsQuery {
    pub family_id: i64,
    pub post_id: Option<i64>,
}

/// Create a new post
/// POST /api/v1/posts
pub async fn create_post(
    state: web::Data<AppState>,
    user_id: UserId,
    payload: Multipart,
) -> Result<HttpResponse> {
    let user = user_id.resolve(state.users.as_ref()).await?;
    let form = read_post_form(payload, state.max_image_bytes).await?;

    let post = state
        .posts
        .create_post(&user, form.into_create_request()?)
        .await?;

    Ok(HttpResponse::Created().json(post))
}

/// Get one page of a family's posts
/// GET /api/v1/posts?familyId={family_id}&postId={before_post_id}
pub async fn list_posts(
    state: web::Data<AppState>,
    user_id: UserId,
    query: web::Query<ListPostsQuery>,
) -> Result<HttpResponse> {
    let posts = state
        .posts
        .list_posts(user_id.0, query.family_id, query.post_id)
        .await?;

    Ok(HttpResponse::Ok().json(posts))
}

/// Get a post by ID
/// GET /api/v1/posts/{post_id}
pub async fn get_post(
    state: web::Data<AppState>,
    user_id: UserId,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let post = state.posts.get_single_post(user_id.0, *post_id).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// Edit content and/or image slots
/// PATCH /api/v1/posts/{post_id}
pub async fn edit_post(
    state: web::Data<AppState>,
    user_id: UserId,
    post_id: web::Path<i64>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let user = user_id.resolve(state.users.as_ref()).await?;
    let form = read_post_form(payload, state.max_image_bytes).await?;

    let post = state
        .posts
        .edit_post(&user, *post_id, form.into_edit_request())
        .await?;

    Ok(HttpResponse::Ok().json(post))
}

/// Soft delete a post
/// DELETE /api/v1/posts/{post_id}
pub async fn delete_post(
    state: web::Data<AppState>,
    user_id: UserId,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = user_id.resolve(state.users.as_ref()).await?;
    state.posts.delete_post(&user, *post_id).await?;

    Ok(HttpResponse::NoContent().finish())
}
