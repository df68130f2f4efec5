pub mod config;
pub mod host_feed;
pub mod logger;
