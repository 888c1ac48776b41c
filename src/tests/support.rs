//! tests/support.rs
//! Relay en memoria y helpers compartidos por los tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, Semaphore};

use crate::errors::TransportError;
use crate::models::campaign_model::CampaignRequest;
use crate::models::relay_model::RelayCredential;
use crate::services::database;
use crate::services::dispatch_service::DispatchContext;
use crate::services::tracking_injector::TrackingInjector;
use crate::services::tracking_service::TrackingService;
use crate::services::transport_service::{DeliveryRoute, MailRelay, OutboundMessage};

pub const TRACK_BASE: &str = "http://track.test";

#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    pub principal: String,
    pub proxy: Option<String>,
    pub port: u16,
    pub recipient: String,
    pub succeeded: bool,
}

/// Relay falso: registra cada intento y falla según los puertos o
/// destinatarios configurados. Opcionalmente espera un permiso por envío.
#[derive(Default)]
pub struct FakeRelay {
    failing_ports: Vec<u16>,
    failing_recipients: Vec<String>,
    gate: Option<Arc<Semaphore>>,
    entered: Option<mpsc::UnboundedSender<String>>,
    attempts: Mutex<Vec<Attempt>>,
}

impl FakeRelay {
    pub fn new() -> Self {
        FakeRelay::default()
    }

    pub fn failing_ports(mut self, ports: &[u16]) -> Self {
        self.failing_ports = ports.to_vec();
        self
    }

    pub fn failing_recipient(mut self, recipient: &str) -> Self {
        self.failing_recipients.push(recipient.to_string());
        self
    }

    pub fn gated(mut self, gate: Arc<Semaphore>, entered: mpsc::UnboundedSender<String>) -> Self {
        self.gate = Some(gate);
        self.entered = Some(entered);
        self
    }

    pub fn attempts(&self) -> Vec<Attempt> {
        self.attempts.lock().unwrap().clone()
    }

    /// Destinatarios entregados con éxito, en orden.
    pub fn delivered(&self) -> Vec<String> {
        self.attempts()
            .into_iter()
            .filter(|a| a.succeeded)
            .map(|a| a.recipient)
            .collect()
    }

    /// Credencial usada por cada destinatario (último intento de cada uno).
    pub fn principals_per_recipient(&self) -> Vec<String> {
        let mut out: Vec<(String, String)> = Vec::new();
        for attempt in self.attempts() {
            match out.last_mut() {
                Some((recipient, principal)) if *recipient == attempt.recipient => {
                    *principal = attempt.principal;
                }
                _ => out.push((attempt.recipient, attempt.principal)),
            }
        }
        out.into_iter().map(|(_, principal)| principal).collect()
    }
}

#[async_trait]
impl MailRelay for FakeRelay {
    async fn deliver(
        &self,
        route: DeliveryRoute<'_>,
        message: &OutboundMessage,
    ) -> Result<(), TransportError> {
        if let Some(gate) = &self.gate {
            if let Some(entered) = &self.entered {
                let _ = entered.send(message.to.clone());
            }
            gate.acquire().await.unwrap().forget();
        }

        let succeeded = !self.failing_ports.contains(&route.port)
            && !self.failing_recipients.contains(&message.to);

        self.attempts.lock().unwrap().push(Attempt {
            principal: route.credential.principal.clone(),
            proxy: route.proxy.map(|p| format!("{}:{}", p.host, p.port)),
            port: route.port,
            recipient: message.to.clone(),
            succeeded,
        });

        if succeeded {
            Ok(())
        } else {
            Err(TransportError::Timeout {
                stage: "greeting",
                port: route.port,
            })
        }
    }
}

pub fn credential(principal: &str) -> RelayCredential {
    RelayCredential {
        host: "smtp.test".to_string(),
        port: None,
        principal: principal.to_string(),
        secret: "secret".to_string(),
    }
}

pub fn campaign(credentials: &[&str], recipients: &[&str]) -> CampaignRequest {
    CampaignRequest {
        credentials: credentials.iter().map(|p| credential(p)).collect(),
        proxies: vec![],
        recipients: recipients.iter().map(|r| r.to_string()).collect(),
        from_name: "Brand Team".to_string(),
        from_email: String::new(),
        reply_to: String::new(),
        subject: "{Hi|Hello} there".to_string(),
        html_body: r#"<html><body><a href="https://shop.io/sale">Sale</a></body></html>"#
            .to_string(),
        min_delay: 0,
        max_delay: 0,
        cadence: 10,
        send_cap: 0,
        use_proxies: false,
        port: 587,
    }
}

pub async fn tracking_service() -> TrackingService {
    let pool = database::memory_pool().await.expect("memory pool");
    TrackingService::new(pool)
}

pub async fn dispatch_context(relay: Arc<FakeRelay>) -> DispatchContext {
    DispatchContext {
        relay,
        tracking: tracking_service().await,
        injector: TrackingInjector::new(TRACK_BASE),
    }
}
