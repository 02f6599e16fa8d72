pub mod classify;
pub mod collapse;
pub mod config;
pub mod density;
pub mod depth_meter;
pub mod error;
pub mod local_state;
pub mod models;
pub mod notify;
pub mod openapi;
pub mod outbox;
pub mod repo;
pub mod routes;
pub mod security;
pub mod session;
pub mod store;
pub mod text_stats;
pub mod thread;
pub mod widgets;

// Re-export commonly used items for tests / external users
pub use routes::{config, AppState};
pub use security::SecurityHeaders;
