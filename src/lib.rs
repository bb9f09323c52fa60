pub mod config;
pub mod conversation;
pub mod llm;
pub mod provider;
pub mod server;
pub mod websearch;

pub const USER_AGENT: &str = concat!("sitescout/", env!("CARGO_PKG_VERSION"));
