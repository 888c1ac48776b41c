//! models/tracking_model.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OpenEvent {
    pub ts: i64, // epoch millis
    pub ip: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClickEvent {
    pub ts: i64,
    pub ip: Option<String>,
    pub url: Option<String>,
}

/// Documento completo de tracking: `message_id -> evento`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrackingDocument {
    pub opens: BTreeMap<String, OpenEvent>,
    pub clicks: BTreeMap<String, ClickEvent>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct TrackingSummary {
    pub opens: u64,
    pub clicks: u64,
}

#[derive(Debug, Deserialize)]
pub struct ClickQuery {
    pub url: Option<String>,
}
