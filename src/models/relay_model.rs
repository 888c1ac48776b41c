//! models/relay_model.rs
//! Credenciales SMTP y proxies SOCKS5 que componen los pools de una campaña.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::ProxyParseError;

/// Servidor SMTP con su login. No cambia durante la campaña.
#[derive(Clone, Serialize, Deserialize)]
pub struct RelayCredential {
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(alias = "user")]
    pub principal: String,
    #[serde(alias = "pass")]
    pub secret: String,
}

// El secreto nunca debe terminar en los logs.
impl fmt::Debug for RelayCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayCredential")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("principal", &self.principal)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ProxyEndpoint {
    pub host: String,
    pub port: u16,
    pub principal: Option<String>,
    pub secret: Option<String>,
}

impl ProxyEndpoint {
    /// Interpreta `host:port` o `host:port:user:pass`.
    pub fn parse(raw: &str) -> Result<Self, ProxyParseError> {
        let parts: Vec<&str> = raw.trim().split(':').collect();
        if parts.len() < 2 {
            return Err(ProxyParseError::MissingPort(raw.to_string()));
        }

        let host = parts[0].trim();
        if host.is_empty() {
            return Err(ProxyParseError::MissingHost(raw.to_string()));
        }
        let port = parts[1]
            .trim()
            .parse::<u16>()
            .map_err(|_| ProxyParseError::InvalidPort(parts[1].to_string()))?;

        let (principal, secret) = if parts.len() >= 4 {
            (Some(parts[2].to_string()), Some(parts[3].to_string()))
        } else {
            (None, None)
        };

        Ok(ProxyEndpoint {
            host: host.to_string(),
            port,
            principal,
            secret,
        })
    }
}

impl fmt::Debug for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyEndpoint")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("principal", &self.principal)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "socks5://{}:{}", self.host, self.port)
    }
}
