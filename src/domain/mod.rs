pub mod advisory;
pub mod cart;
pub mod edit;
pub mod errors;
pub mod lifecycle;
pub mod order;
pub mod pagination;
pub mod ports;
pub mod product;
pub mod query;
pub mod session;
