pub mod config;
pub mod logging;

pub mod checksum;
pub mod chunker;
pub mod manifest;
pub mod pool;
pub mod store;
pub mod upload;
