//! handlers/session_handler.rs
//! Canal de control por WebSocket: una sesión de envío por conexión.

use actix_web::{web, HttpRequest, HttpResponse};
use actix_ws::{CloseReason, Message, MessageStream};
use futures_util::StreamExt;
use tokio::sync::mpsc;

use crate::models::session_model::{InboundFrame, SessionEvent};
use crate::services::dispatch_service::{DispatchContext, DispatchSession};

// Un start puede traer miles de destinatarios en un solo frame.
const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// GET /ws
pub async fn session_endpoint(
    req: HttpRequest,
    body: web::Payload,
    context: web::Data<DispatchContext>,
) -> Result<HttpResponse, actix_web::Error> {
    let (response, ws, stream) = actix_ws::handle(&req, body)?;
    let stream = stream.max_frame_size(MAX_FRAME_SIZE);
    let peer = req
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string();

    actix_web::rt::spawn(run_connection(ws, stream, context.get_ref().clone(), peer));
    Ok(response)
}

/// Traduce un frame de texto del operador a una acción sobre la sesión.
pub fn handle_frame(session: &DispatchSession, text: &str) {
    match serde_json::from_str::<InboundFrame>(text) {
        Ok(InboundFrame::Start(request)) => {
            log::info!("Sesión {}: solicitud de campaña recibida", session.id());
            if let Err(e) = session.start(*request) {
                log::warn!("Sesión {}: start rechazado: {}", session.id(), e);
                session.reject(e.to_string());
            }
        }
        Ok(frame) => {
            if let Some(command) = frame.control() {
                session.control(command);
            }
        }
        Err(e) => {
            log::warn!("Sesión {}: frame inválido: {}", session.id(), e);
            session.reject(format!("Invalid message: {}", e));
        }
    }
}

async fn run_connection(
    mut ws: actix_ws::Session,
    mut stream: MessageStream,
    context: DispatchContext,
    peer: String,
) {
    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<SessionEvent>();
    let session = DispatchSession::new(context, events_tx);
    log::info!("Operador conectado desde {} (sesión {})", peer, session.id());

    let mut close_reason: Option<CloseReason> = None;
    loop {
        tokio::select! {
            Some(event) = events_rx.recv() => {
                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(e) => {
                        log::error!("No se pudo serializar evento: {}", e);
                        continue;
                    }
                };
                if ws.text(text).await.is_err() {
                    break;
                }
            }
            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => handle_frame(&session, &text),
                Some(Ok(Message::Ping(bytes))) => {
                    if ws.pong(&bytes).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(reason))) => {
                    close_reason = reason;
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    log::warn!("Sesión {}: error de protocolo: {}", session.id(), e);
                    break;
                }
                None => break,
            },
        }
    }

    session.disconnect();
    let _ = ws.close(close_reason).await;
    log::info!("Operador desconectado (sesión {})", session.id());
}
