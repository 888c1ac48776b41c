//! services/mod.rs
//! Módulo que agrupa distintos "servicios" o "capas de negocio" de la app.

pub mod database;
pub mod dispatch_service;
pub mod rotation_service;
pub mod smtp_relay;
pub mod template_renderer;
pub mod template_service;
pub mod tracking_injector;
pub mod tracking_service;
pub mod transport_service;
