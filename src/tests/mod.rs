//! tests/mod.rs
mod campaign_model_tests;
mod config_tests;
mod support;
mod template_renderer_tests;
mod tracking_tests;
