//! models/session_model.rs
//! Mensajes del canal de control (entrada) y eventos de sesión (salida).

use serde::{Deserialize, Serialize};

use crate::models::campaign_model::CampaignRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Running,
    Paused,
    Completed,
    Stopped,
}

impl SessionState {
    pub fn is_active(self) -> bool {
        matches!(self, SessionState::Running | SessionState::Paused)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlCommand {
    Pause,
    Resume,
    Stop,
}

/// Frame JSON recibido del operador.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InboundFrame {
    Start(Box<CampaignRequest>),
    Pause,
    Resume,
    Stop,
}

impl InboundFrame {
    pub fn control(&self) -> Option<ControlCommand> {
        match self {
            InboundFrame::Start(_) => None,
            InboundFrame::Pause => Some(ControlCommand::Pause),
            InboundFrame::Resume => Some(ControlCommand::Resume),
            InboundFrame::Stop => Some(ControlCommand::Stop),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub sent: usize,
    pub failed: usize,
    pub total: usize,
    pub percent: u8,
    pub current_credential: String,
    pub current_recipient: String,
    pub current_proxy: String,
    pub current_port: u16,
}

impl ProgressSnapshot {
    pub fn percent_of(done: usize, total: usize) -> u8 {
        if total == 0 {
            return 0;
        }
        ((done as f64 * 100.0 / total as f64).round() as u64).min(100) as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignOutcome {
    Completed,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionSummary {
    pub sent: usize,
    pub failed: usize,
    pub total: usize,
    pub opens: u64,
    pub clicks: u64,
    pub outcome: CampaignOutcome,
}

/// Frame JSON emitido hacia el operador.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SessionEvent {
    Log { level: LogLevel, message: String },
    Progress(ProgressSnapshot),
    Complete(CompletionSummary),
    Error { message: String },
}

impl SessionEvent {
    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        SessionEvent::Log {
            level,
            message: message.into(),
        }
    }
}
