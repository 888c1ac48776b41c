//! services/smtp_relay.rs
//! Implementación real de `MailRelay` con lettre. Directo usa el transporte
//! asíncrono de lettre; con proxy abre el túnel SOCKS5 y habla SMTP encima.

use async_trait::async_trait;
use lettre::{
    address::Address,
    message::{
        header::{ContentType, Header, HeaderName, HeaderValue},
        Mailbox,
    },
    transport::smtp::{
        authentication::{Credentials, Mechanism},
        client::{AsyncSmtpConnection, Tls, TlsParameters},
        extension::ClientId,
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tokio::time::{error::Elapsed, timeout};
use tokio_socks::tcp::Socks5Stream;

use crate::config::app_config::TransportTimeouts;
use crate::errors::TransportError;
use crate::models::relay_model::ProxyEndpoint;
use crate::services::transport_service::{DeliveryRoute, MailRelay, OutboundMessage};

type HeaderParseError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone)]
struct XPriority(String);

impl Header for XPriority {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("X-Priority")
    }

    fn parse(s: &str) -> Result<Self, HeaderParseError> {
        Ok(XPriority(s.to_string()))
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.clone())
    }
}

#[derive(Debug, Clone)]
struct ListUnsubscribe(String);

impl Header for ListUnsubscribe {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("List-Unsubscribe")
    }

    fn parse(s: &str) -> Result<Self, HeaderParseError> {
        Ok(ListUnsubscribe(s.to_string()))
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.clone())
    }
}

/// Correlación con el tracking: lleva el message id.
#[derive(Debug, Clone)]
struct EntityRefId(String);

impl Header for EntityRefId {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("X-Entity-Ref-ID")
    }

    fn parse(s: &str) -> Result<Self, HeaderParseError> {
        Ok(EntityRefId(s.to_string()))
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.clone())
    }
}

fn parse_address(raw: &str, role: &str) -> Result<Address, TransportError> {
    raw.trim()
        .parse::<Address>()
        .map_err(|e| TransportError::Message(format!("invalid {} address '{}': {}", role, raw, e)))
}

pub fn build_message(message: &OutboundMessage) -> Result<Message, TransportError> {
    let from = Mailbox::new(
        message.from_name.clone(),
        parse_address(&message.from_address, "sender")?,
    );
    let reply_to = Mailbox::new(None, parse_address(&message.reply_to, "reply-to")?);
    let to = Mailbox::new(None, parse_address(&message.to, "recipient")?);

    Message::builder()
        .from(from)
        .reply_to(reply_to)
        .to(to)
        .subject(message.subject.clone())
        .header(ContentType::TEXT_HTML)
        .header(XPriority("3".to_string()))
        .header(ListUnsubscribe(message.list_unsubscribe()))
        .header(EntityRefId(message.message_id.clone()))
        .body(message.html.clone())
        .map_err(|e| TransportError::Message(e.to_string()))
}

fn timed_out(stage: &'static str, port: u16) -> impl FnOnce(Elapsed) -> TransportError {
    move |_| TransportError::Timeout { stage, port }
}

#[derive(Debug, Clone)]
pub struct SmtpRelay {
    timeouts: TransportTimeouts,
    accept_invalid_certs: bool,
}

impl SmtpRelay {
    pub fn new(timeouts: TransportTimeouts, accept_invalid_certs: bool) -> Self {
        SmtpRelay {
            timeouts,
            accept_invalid_certs,
        }
    }

    fn tls_parameters(&self, host: &str) -> Result<TlsParameters, TransportError> {
        Ok(TlsParameters::builder(host.to_string())
            .dangerous_accept_invalid_certs(self.accept_invalid_certs)
            .build()?)
    }

    async fn deliver_direct(
        &self,
        route: DeliveryRoute<'_>,
        email: Message,
    ) -> Result<(), TransportError> {
        let credential = route.credential;
        let tls_params = self.tls_parameters(&credential.host)?;
        let tls = if route.implicit_tls() {
            Tls::Wrapper(tls_params)
        } else {
            Tls::Opportunistic(tls_params)
        };

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(credential.host.as_str())
            .port(route.port)
            .credentials(Credentials::new(
                credential.principal.clone(),
                credential.secret.clone(),
            ))
            .tls(tls)
            .timeout(Some(self.timeouts.socket))
            .build();

        timeout(self.timeouts.overall(), mailer.send(email))
            .await
            .map_err(timed_out("delivery", route.port))??;
        Ok(())
    }

    async fn deliver_via_proxy(
        &self,
        route: DeliveryRoute<'_>,
        proxy: &ProxyEndpoint,
        email: Message,
    ) -> Result<(), TransportError> {
        let credential = route.credential;
        let port = route.port;
        let target = (credential.host.as_str(), port);
        let proxy_addr = (proxy.host.as_str(), proxy.port);
        log::debug!("Conectando a {}:{} via {}", credential.host, port, proxy);

        let tunnel = async {
            match (&proxy.principal, &proxy.secret) {
                (Some(user), Some(pass)) => {
                    Socks5Stream::connect_with_password(proxy_addr, target, user, pass).await
                }
                _ => Socks5Stream::connect(proxy_addr, target).await,
            }
        };
        let stream = timeout(self.timeouts.connection, tunnel)
            .await
            .map_err(timed_out("proxy connection", port))??;

        let hello = ClientId::Domain("localhost".to_string());
        let mut connection = if route.implicit_tls() {
            let connector = native_tls::TlsConnector::builder()
                .danger_accept_invalid_certs(self.accept_invalid_certs)
                .build()?;
            let connector = tokio_native_tls::TlsConnector::from(connector);
            let tls_stream = timeout(
                self.timeouts.greeting,
                connector.connect(&credential.host, stream),
            )
            .await
            .map_err(timed_out("tls handshake", port))??;

            timeout(
                self.timeouts.greeting,
                AsyncSmtpConnection::connect_with_transport(Box::new(tls_stream), &hello),
            )
            .await
            .map_err(timed_out("greeting", port))??
        } else {
            let mut connection = timeout(
                self.timeouts.greeting,
                AsyncSmtpConnection::connect_with_transport(Box::new(stream), &hello),
            )
            .await
            .map_err(timed_out("greeting", port))??;

            if connection.can_starttls() {
                let tls_params = self.tls_parameters(&credential.host)?;
                timeout(self.timeouts.greeting, connection.starttls(tls_params, &hello))
                    .await
                    .map_err(timed_out("starttls", port))??;
            }
            connection
        };

        let credentials = Credentials::new(credential.principal.clone(), credential.secret.clone());
        let exchange = async {
            connection
                .auth(&[Mechanism::Plain, Mechanism::Login], &credentials)
                .await?;
            connection.send(email.envelope(), &email.formatted()).await?;
            Ok::<(), lettre::transport::smtp::Error>(())
        };
        timeout(self.timeouts.socket, exchange)
            .await
            .map_err(timed_out("socket", port))??;

        if let Err(e) = connection.quit().await {
            log::debug!("QUIT falló tras un envío exitoso: {}", e);
        }
        Ok(())
    }
}

#[async_trait]
impl MailRelay for SmtpRelay {
    async fn deliver(
        &self,
        route: DeliveryRoute<'_>,
        message: &OutboundMessage,
    ) -> Result<(), TransportError> {
        let email = build_message(message)?;
        match route.proxy {
            Some(proxy) => self.deliver_via_proxy(route, proxy, email).await,
            None => self.deliver_direct(route, email).await,
        }
    }
}
