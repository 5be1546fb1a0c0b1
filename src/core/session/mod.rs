//! Session orchestration.

pub mod manager;

pub use manager::{SessionError, SessionManager};
