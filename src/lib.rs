pub mod core;
pub mod auth;
pub mod http;
pub mod util;
pub mod provider;
pub mod client;
