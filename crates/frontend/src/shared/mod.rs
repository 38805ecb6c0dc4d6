pub mod config;
pub mod filter_sync;
