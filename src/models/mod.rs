//! models/mod.rs
//! Módulo raíz para modelos/estructuras compartidas.

pub mod campaign_model;
pub mod relay_model;
pub mod session_model;
pub mod template_model;
pub mod tracking_model;
