pub mod core;
pub mod http;
pub mod models;
