//! models/campaign_model.rs
//! Petición de campaña tal como llega por el canal de control.

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::ValidationError;
use crate::models::relay_model::RelayCredential;

pub const DEFAULT_PORT: u16 = 587;

fn default_min_delay() -> u64 {
    1000
}

fn default_max_delay() -> u64 {
    3000
}

fn default_cadence() -> usize {
    10
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

// El formulario del operador manda el puerto como texto ("587").
fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PortValue {
        Number(u16),
        Text(String),
    }

    match PortValue::deserialize(deserializer)? {
        PortValue::Number(port) => Ok(port),
        PortValue::Text(raw) => raw.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRequest {
    #[serde(default, alias = "smtps")]
    pub credentials: Vec<RelayCredential>,
    #[serde(default)]
    pub proxies: Vec<String>,
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default)]
    pub from_name: String,
    #[serde(default)]
    pub from_email: String,
    #[serde(default)]
    pub reply_to: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub html_body: String,
    #[serde(default = "default_min_delay")]
    pub min_delay: u64, // ms
    #[serde(default = "default_max_delay")]
    pub max_delay: u64, // ms
    #[serde(default = "default_cadence", alias = "emailsPerRotation")]
    pub cadence: usize,
    #[serde(default, alias = "totalMailsToSend")]
    pub send_cap: usize,
    #[serde(default)]
    pub use_proxies: bool,
    #[serde(
        default = "default_port",
        alias = "smtpPort",
        deserialize_with = "deserialize_port"
    )]
    pub port: u16,
}

impl CampaignRequest {
    /// Se valida antes de arrancar el bucle; nada de esto cambia el estado.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.credentials.is_empty() {
            return Err(ValidationError::EmptyCredentials);
        }
        if self.recipients.is_empty() {
            return Err(ValidationError::EmptyRecipients);
        }
        if self.subject.trim().is_empty() {
            return Err(ValidationError::EmptySubject);
        }
        if self.html_body.trim().is_empty() {
            return Err(ValidationError::EmptyBody);
        }
        Ok(())
    }

    /// `min(cap, destinatarios)` si hay tope, si no todos los destinatarios.
    pub fn total(&self) -> usize {
        if self.send_cap > 0 {
            self.send_cap.min(self.recipients.len())
        } else {
            self.recipients.len()
        }
    }

    pub fn cadence(&self) -> usize {
        self.cadence.max(1)
    }

    pub fn delay_bounds(&self) -> (u64, u64) {
        if self.min_delay <= self.max_delay {
            (self.min_delay, self.max_delay)
        } else {
            (self.max_delay, self.min_delay)
        }
    }

    pub fn preferred_port(&self) -> u16 {
        if self.port == 0 {
            DEFAULT_PORT
        } else {
            self.port
        }
    }

    /// Proxies efectivos: vacío si están desactivados.
    pub fn active_proxies(&self) -> &[String] {
        if self.use_proxies {
            &self.proxies
        } else {
            &[]
        }
    }
}
