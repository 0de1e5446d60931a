pub mod http_api;
pub mod memory;
pub mod models;
pub mod session_store;
