//! errors.rs
//! Errores tipados del motor de campañas.

use thiserror::Error;

/// Rechazos de un comando `start`. No cambian el estado de la sesión.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No SMTP servers configured")]
    EmptyCredentials,

    #[error("No recipient emails loaded")]
    EmptyRecipients,

    #[error("Subject is empty")]
    EmptySubject,

    #[error("Message body is empty")]
    EmptyBody,

    #[error("Campaign already running")]
    AlreadyRunning,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProxyParseError {
    #[error("proxy descriptor '{0}' has no port")]
    MissingPort(String),

    #[error("proxy descriptor '{0}' has no host")]
    MissingHost(String),

    #[error("invalid proxy port '{0}'")]
    InvalidPort(String),
}

/// Fallo de un intento sobre un puerto concreto.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("timed out during {stage} on port {port}")]
    Timeout { stage: &'static str, port: u16 },

    #[error("proxy connection failed: {0}")]
    Proxy(#[from] tokio_socks::Error),

    #[error("TLS error: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("invalid message: {0}")]
    Message(String),
}

/// Todos los puertos fallaron; conserva el último error observado.
#[derive(Debug, Error)]
#[error("all ports failed, last attempt on port {port}: {source}")]
pub struct DeliveryFailure {
    pub port: u16,
    #[source]
    pub source: TransportError,
}
