/// Business logic layer for moments-service
///
/// - Post service: create, edit, soft delete, family pages, single post reads
/// - Love service: love / unlove, which also refresh the post's love count
pub mod loves;
pub mod posts;

pub use loves::LoveService;
pub use posts::{PostService, PAGE_SIZE};
