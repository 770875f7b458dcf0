pub mod config;
pub mod error;

mod sync_engine;

pub use sync_engine::SyncEngine;
