//! handlers/mod.rs
pub mod health_handler;
pub mod session_handler;
pub mod template_handler;
pub mod tracking_handler;
