pub mod application;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infrastructure;

pub use application::admin::AdminService;
pub use application::auth::AuthService;
pub use application::storefront::StorefrontService;
pub use config::ClientConfig;
pub use errors::AppError;
pub use infrastructure::http_api::HttpBackend;
pub use infrastructure::memory::InMemoryBackend;
pub use infrastructure::session_store::FileSessionStore;
