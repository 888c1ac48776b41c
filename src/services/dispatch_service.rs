//! services/dispatch_service.rs
//! Sesión de envío por conexión de operador: máquina de estados
//! Idle -> Running <-> Paused -> Completed | Stopped y el bucle de envío.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::errors::ValidationError;
use crate::models::campaign_model::CampaignRequest;
use crate::models::relay_model::ProxyEndpoint;
use crate::models::session_model::{
    CampaignOutcome, CompletionSummary, ControlCommand, LogLevel, ProgressSnapshot, SessionEvent,
    SessionState,
};
use crate::models::tracking_model::TrackingSummary;
use crate::services::rotation_service::RotationScheduler;
use crate::services::template_renderer;
use crate::services::tracking_injector::{generate_message_id, TrackingInjector};
use crate::services::tracking_service::TrackingService;
use crate::services::transport_service::{
    deliver_with_fallback, MailRelay, OutboundMessage, SenderIdentity,
};

pub type EventSender = mpsc::UnboundedSender<SessionEvent>;

/// Colaboradores compartidos entre sesiones.
#[derive(Clone)]
pub struct DispatchContext {
    pub relay: Arc<dyn MailRelay>,
    pub tracking: TrackingService,
    pub injector: TrackingInjector,
}

pub struct DispatchSession {
    id: String,
    state: Arc<watch::Sender<SessionState>>,
    // Vivo mientras la tarea del bucle exista, aunque ya esté en Stopped.
    loop_alive: Arc<AtomicBool>,
    events: EventSender,
    context: DispatchContext,
}

/// Libera la sesión cuando la tarea del bucle termina, incluso por panic.
struct LoopGuard(Arc<AtomicBool>);

impl Drop for LoopGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl DispatchSession {
    pub fn new(context: DispatchContext, events: EventSender) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        DispatchSession {
            id: Uuid::new_v4().to_string(),
            state: Arc::new(state),
            loop_alive: Arc::new(AtomicBool::new(false)),
            events,
            context,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Valida y arranca el bucle en su propia tarea. Un rechazo no cambia
    /// el estado de la sesión.
    pub fn start(
        &self,
        request: CampaignRequest,
    ) -> Result<JoinHandle<CompletionSummary>, ValidationError> {
        if self.loop_alive.load(Ordering::Acquire) {
            return Err(ValidationError::AlreadyRunning);
        }
        request.validate()?;

        if self
            .loop_alive
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ValidationError::AlreadyRunning);
        }
        let guard = LoopGuard(Arc::clone(&self.loop_alive));
        self.state.send_replace(SessionState::Running);

        log::info!(
            "Sesión {}: campaña iniciada con {} destinatarios",
            self.id,
            request.total()
        );

        let run = CampaignRun {
            _guard: guard,
            session_id: self.id.clone(),
            request,
            context: self.context.clone(),
            state: Arc::clone(&self.state),
            state_rx: self.state.subscribe(),
            events: self.events.clone(),
            sent: 0,
            failed: 0,
        };
        Ok(tokio::spawn(run.run()))
    }

    /// Aplica una señal de control al instante. Devuelve `false` si la
    /// señal no corresponde al estado actual.
    pub fn control(&self, command: ControlCommand) -> bool {
        let applied = self.state.send_if_modified(|state| match (command, *state) {
            (ControlCommand::Pause, SessionState::Running) => {
                *state = SessionState::Paused;
                true
            }
            (ControlCommand::Resume, SessionState::Paused) => {
                *state = SessionState::Running;
                true
            }
            (ControlCommand::Stop, SessionState::Running | SessionState::Paused) => {
                *state = SessionState::Stopped;
                true
            }
            _ => false,
        });

        if !applied {
            log::debug!(
                "Sesión {}: {:?} ignorado en estado {:?}",
                self.id,
                command,
                self.state()
            );
            return false;
        }

        let (level, message) = match command {
            ControlCommand::Pause => (LogLevel::Warn, "Campaign paused"),
            ControlCommand::Resume => (LogLevel::Info, "Campaign resumed"),
            ControlCommand::Stop => (LogLevel::Warn, "Campaign stopped by user"),
        };
        log::info!("Sesión {}: {}", self.id, message);
        let _ = self.events.send(SessionEvent::log(level, message));
        true
    }

    /// Error de validación o frame mal formado, sin cambio de estado.
    pub fn reject(&self, message: impl Into<String>) {
        let _ = self.events.send(SessionEvent::Error {
            message: message.into(),
        });
    }

    /// La conexión del operador se cerró: el bucle termina en el próximo chequeo.
    pub fn disconnect(&self) {
        let stopped = self.state.send_if_modified(|state| {
            if state.is_active() {
                *state = SessionState::Stopped;
                true
            } else {
                false
            }
        });
        if stopped {
            log::info!("Sesión {}: conexión perdida, deteniendo campaña", self.id);
        }
    }
}

impl Drop for DispatchSession {
    fn drop(&mut self) {
        self.disconnect();
    }
}

struct CampaignRun {
    _guard: LoopGuard,
    session_id: String,
    request: CampaignRequest,
    context: DispatchContext,
    state: Arc<watch::Sender<SessionState>>,
    state_rx: watch::Receiver<SessionState>,
    events: EventSender,
    sent: usize,
    failed: usize,
}

impl CampaignRun {
    fn emit(&self, event: SessionEvent) {
        // El operador puede haberse ido; el bucle sigue igual.
        let _ = self.events.send(event);
    }

    fn emit_log(&self, level: LogLevel, message: String) {
        self.emit(SessionEvent::log(level, message));
    }

    fn snapshot(
        &self,
        total: usize,
        credential: &str,
        recipient: &str,
        proxy: &str,
        port: u16,
    ) -> SessionEvent {
        SessionEvent::Progress(ProgressSnapshot {
            sent: self.sent,
            failed: self.failed,
            total,
            percent: ProgressSnapshot::percent_of(self.sent + self.failed, total),
            current_credential: credential.to_string(),
            current_recipient: recipient.to_string(),
            current_proxy: proxy.to_string(),
            current_port: port,
        })
    }

    /// Bloquea mientras la sesión esté en pausa. `false` si hay que salir.
    async fn wait_until_runnable(&mut self) -> bool {
        match self
            .state_rx
            .wait_for(|state| *state != SessionState::Paused)
            .await
        {
            Ok(state) => *state == SessionState::Running,
            Err(_) => false,
        }
    }

    /// Espera entre envíos; un stop la corta.
    async fn pace(&mut self, min_ms: u64, max_ms: u64) {
        let delay = rand::thread_rng().gen_range(min_ms..=max_ms);
        if delay == 0 {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(delay)) => {}
            _ = self.state_rx.wait_for(|state| *state == SessionState::Stopped) => {}
        }
    }

    async fn run(mut self) -> CompletionSummary {
        let request = self.request.clone();
        let total = request.total();
        let (min_delay, max_delay) = request.delay_bounds();
        let proxies = request.active_proxies();
        let preferred_port = request.preferred_port();
        let sender = SenderIdentity {
            from_name: &request.from_name,
            from_email: &request.from_email,
            reply_to: &request.reply_to,
        };
        let mut rotation =
            RotationScheduler::new(request.cadence(), request.credentials.len(), proxies.len());

        self.emit_log(
            LogLevel::Info,
            format!(
                "Campaign started | {} emails | {} SMTP(s) | {} proxies | Port {}",
                total,
                request.credentials.len(),
                proxies.len(),
                preferred_port
            ),
        );

        for index in 0..total {
            if !self.wait_until_runnable().await {
                break;
            }

            let recipient = request.recipients[index].trim();
            if recipient.is_empty() || !recipient.contains('@') {
                log::warn!(
                    "Sesión {}: destinatario inválido omitido: '{}'",
                    self.session_id,
                    recipient
                );
                self.emit_log(LogLevel::Warn, format!("Skipped invalid: {}", recipient));
                continue;
            }

            let credential = &request.credentials[rotation.credential_index()];
            let proxy_raw = rotation.proxy_index().map(|i| proxies[i].as_str());
            let proxy_label = proxy_raw.unwrap_or("Direct");
            let port = credential.port.unwrap_or(preferred_port);

            self.emit(self.snapshot(total, &credential.principal, recipient, proxy_label, port));

            let proxy = match proxy_raw.map(ProxyEndpoint::parse) {
                Some(Ok(endpoint)) => Some(endpoint),
                Some(Err(e)) => {
                    log::warn!("Sesión {}: proxy inválido: {}", self.session_id, e);
                    self.emit_log(LogLevel::Warn, format!("Proxy error: {}, sending direct", e));
                    None
                }
                None => None,
            };

            let message_id = generate_message_id();
            let subject = template_renderer::render(&request.subject);
            let body = template_renderer::render(&request.html_body);
            let body = self.context.injector.inject(&body, &message_id);
            let message = OutboundMessage::compose(
                &sender,
                credential,
                recipient,
                subject,
                body,
                message_id,
            );

            self.emit_log(
                LogLevel::Info,
                format!(
                    "Sending {} -> {} | Port: {} | Proxy: {}",
                    message.from_address, recipient, port, proxy_label
                ),
            );

            let outcome = deliver_with_fallback(
                self.context.relay.as_ref(),
                credential,
                proxy.as_ref(),
                port,
                &message,
            )
            .await;

            let reported_port = match outcome {
                Ok(used_port) => {
                    self.sent += 1;
                    self.emit_log(
                        LogLevel::Success,
                        format!(
                            "[{}/{}] {} -> {} | Port: {} | Proxy: {}",
                            self.sent, total, message.from_address, recipient, used_port, proxy_label
                        ),
                    );
                    used_port
                }
                Err(failure) => {
                    self.failed += 1;
                    log::error!(
                        "Sesión {}: envío a {} falló: {}",
                        self.session_id,
                        recipient,
                        failure
                    );
                    self.emit_log(
                        LogLevel::Error,
                        format!(
                            "[{}/{}] Failed -> {}: {}",
                            self.sent + self.failed,
                            total,
                            recipient,
                            failure
                        ),
                    );
                    port
                }
            };

            self.emit(self.snapshot(
                total,
                &credential.principal,
                recipient,
                proxy_label,
                reported_port,
            ));

            if let Some(rotated) = rotation.record_attempt() {
                let next = &request.credentials[rotated.credential_index];
                self.emit_log(
                    LogLevel::Info,
                    format!(
                        "Rotated to SMTP {}/{}: {}",
                        rotated.position, rotated.pool_len, next.principal
                    ),
                );
            }

            if index + 1 < total {
                self.pace(min_delay, max_delay).await;
            }
        }

        self.finish(total).await
    }

    async fn finish(self, total: usize) -> CompletionSummary {
        let outcome = if *self.state.borrow() == SessionState::Stopped {
            CampaignOutcome::Stopped
        } else {
            CampaignOutcome::Completed
        };

        let tracking = match self.context.tracking.summary().await {
            Ok(summary) => summary,
            Err(e) => {
                log::warn!(
                    "Sesión {}: no se pudo leer el tracking: {:?}",
                    self.session_id,
                    e
                );
                TrackingSummary::default()
            }
        };

        let summary = CompletionSummary {
            sent: self.sent,
            failed: self.failed,
            total,
            opens: tracking.opens,
            clicks: tracking.clicks,
            outcome,
        };

        self.emit(SessionEvent::Complete(summary.clone()));
        self.emit_log(
            LogLevel::Info,
            format!(
                "Campaign complete! Sent: {} | Failed: {} | Opens: {} | Clicks: {}",
                summary.sent, summary.failed, summary.opens, summary.clicks
            ),
        );
        log::info!(
            "Sesión {}: campaña terminada ({:?}): {} enviados, {} fallidos",
            self.session_id,
            outcome,
            summary.sent,
            summary.failed
        );

        // Libera la sesión para un nuevo start.
        self.state.send_if_modified(|state| {
            if *state == SessionState::Running || *state == SessionState::Paused {
                *state = SessionState::Completed;
                true
            } else {
                false
            }
        });

        summary
    }
}
