//! services/transport_service.rs
//! Entrega de un mensaje para un par (credencial, proxy) con fallback de puertos.

use async_trait::async_trait;

use crate::errors::{DeliveryFailure, TransportError};
use crate::models::relay_model::{ProxyEndpoint, RelayCredential};

pub const FALLBACK_PORTS: [u16; 4] = [587, 465, 2525, 25];

/// Orden de puertos: primero el preferido, luego el resto sin repetir.
pub fn fallback_ports(preferred: u16) -> Vec<u16> {
    let mut ports = vec![preferred];
    for port in FALLBACK_PORTS {
        if !ports.contains(&port) {
            ports.push(port);
        }
    }
    ports
}

/// Overrides de remitente configurados en la campaña (pueden venir vacíos).
#[derive(Debug, Clone, Copy, Default)]
pub struct SenderIdentity<'a> {
    pub from_name: &'a str,
    pub from_email: &'a str,
    pub reply_to: &'a str,
}

/// Mensaje ya renderizado y con tracking, listo para el relay.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub message_id: String,
    pub from_name: Option<String>,
    pub from_address: String,
    pub reply_to: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

impl OutboundMessage {
    /// Aplica los fallbacks de remitente: sin override se usa el login de
    /// la credencial, y sin reply-to se usa el remitente efectivo.
    pub fn compose(
        sender: &SenderIdentity<'_>,
        credential: &RelayCredential,
        to: &str,
        subject: String,
        html: String,
        message_id: String,
    ) -> Self {
        let from_address = non_empty(sender.from_email)
            .unwrap_or(&credential.principal)
            .to_string();
        let reply_to = non_empty(sender.reply_to)
            .unwrap_or(&from_address)
            .to_string();

        OutboundMessage {
            message_id,
            from_name: non_empty(sender.from_name).map(str::to_string),
            from_address,
            reply_to,
            to: to.to_string(),
            subject,
            html,
        }
    }

    pub fn sender_domain(&self) -> &str {
        self.from_address
            .split_once('@')
            .map(|(_, domain)| domain)
            .filter(|domain| !domain.is_empty())
            .unwrap_or("example.com")
    }

    pub fn list_unsubscribe(&self) -> String {
        format!("<mailto:unsubscribe@{}>", self.sender_domain())
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Un intento sobre un puerto concreto.
#[derive(Debug, Clone, Copy)]
pub struct DeliveryRoute<'a> {
    pub credential: &'a RelayCredential,
    pub proxy: Option<&'a ProxyEndpoint>,
    pub port: u16,
}

impl DeliveryRoute<'_> {
    /// TLS implícito solo en 465.
    pub fn implicit_tls(&self) -> bool {
        self.port == 465
    }
}

#[async_trait]
pub trait MailRelay: Send + Sync {
    async fn deliver(
        &self,
        route: DeliveryRoute<'_>,
        message: &OutboundMessage,
    ) -> Result<(), TransportError>;
}

/// Recorre los puertos en orden hasta el primer éxito y devuelve el puerto usado.
pub async fn deliver_with_fallback(
    relay: &dyn MailRelay,
    credential: &RelayCredential,
    proxy: Option<&ProxyEndpoint>,
    preferred_port: u16,
    message: &OutboundMessage,
) -> Result<u16, DeliveryFailure> {
    let mut last_failure: Option<DeliveryFailure> = None;

    for port in fallback_ports(preferred_port) {
        let route = DeliveryRoute {
            credential,
            proxy,
            port,
        };
        match relay.deliver(route, message).await {
            Ok(()) => return Ok(port),
            Err(source) => {
                log::debug!(
                    "Fallo enviando a {} via {}:{}: {}",
                    message.to,
                    credential.host,
                    port,
                    source
                );
                last_failure = Some(DeliveryFailure { port, source });
            }
        }
    }

    // fallback_ports nunca está vacío
    Err(last_failure.unwrap_or(DeliveryFailure {
        port: preferred_port,
        source: TransportError::Message("no ports to try".to_string()),
    }))
}
