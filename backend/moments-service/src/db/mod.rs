/// Database access layer
///
/// - `pool`: connection pool creation and migrations
/// - `post_repo`: post storage and its transactional unit of work
/// - `user_repo`: acting user lookup
pub mod pool;
pub mod post_repo;
pub mod user_repo;

pub use pool::{create_pool, migrate};
pub use post_repo::{PgPostRepository, PostRepository, PostTransaction};
pub use user_repo::{PgUserRepository, UserRepository};
