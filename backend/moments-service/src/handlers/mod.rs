/// HTTP handlers for family post endpoints
///
/// - Posts: create, list, read, edit, soft delete
/// - Loves: love / unlove a post
pub mod loves;
pub mod multipart;
pub mod posts;

use crate::db::UserRepository;
use crate::services::{LoveService, PostService};
use actix_web::web;
use std::sync::Arc;

pub use loves::{love_post, unlove_post};
pub use posts::{create_post, delete_post, edit_post, get_post, list_posts};

/// Shared state for post and love handlers
pub struct AppState {
    pub posts: Arc<PostService>,
    pub loves: Arc<LoveService>,
    pub users: Arc<dyn UserRepository>,
    /// Upper bound for a single multipart part
    pub max_image_bytes: usize,
}

/// Register `/posts` routes on the given scope
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/posts")
            .service(
                web::resource("")
                    .route(web::post().to(create_post))
                    .route(web::get().to(list_posts)),
            )
            .service(
                web::resource("/{post_id}")
                    .route(web::get().to(get_post))
                    .route(web::patch().to(edit_post))
                    .route(web::delete().to(delete_post)),
            )
            .service(
                web::resource("/{post_id}/loves")
                    .route(web::post().to(love_post))
                    .route(web::delete().to(unlove_post)),
            ),
    );
}
