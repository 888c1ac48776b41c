//! config/app_config.rs
//! Configuración global del servicio, leída de variables de entorno
//! (y del `.env` que carga `dotenv` en `main`).

use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: String,
    pub port: u16,
    pub base_url: String, // prefijo de las URLs de tracking
    pub database_url: String,
    pub click_fallback_url: String,
    pub timeouts: TransportTimeouts,
    pub accept_invalid_certs: bool,
}

/// Límites por intento SMTP: conexión, saludo y socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportTimeouts {
    pub connection: Duration,
    pub greeting: Duration,
    pub socket: Duration,
}

impl TransportTimeouts {
    /// Presupuesto total de un intento.
    pub fn overall(&self) -> Duration {
        self.connection + self.greeting + self.socket
    }
}

impl Default for TransportTimeouts {
    fn default() -> Self {
        TransportTimeouts {
            connection: Duration::from_secs(15),
            greeting: Duration::from_secs(10),
            socket: Duration::from_secs(30),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            database_url: "sqlite:data/campaigns.db".to_string(),
            click_fallback_url: "https://google.com".to_string(),
            timeouts: TransportTimeouts::default(),
            accept_invalid_certs: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Construye la config a partir de cualquier fuente clave/valor.
    /// Un valor inválido conserva el default y deja un warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();

        let port = parse_or(&lookup, "PORT", defaults.port);
        let base_url = lookup("BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://localhost:{}", port));

        let timeouts = TransportTimeouts {
            connection: Duration::from_secs(parse_or(
                &lookup,
                "SMTP_CONNECTION_TIMEOUT_SECS",
                defaults.timeouts.connection.as_secs(),
            )),
            greeting: Duration::from_secs(parse_or(
                &lookup,
                "SMTP_GREETING_TIMEOUT_SECS",
                defaults.timeouts.greeting.as_secs(),
            )),
            socket: Duration::from_secs(parse_or(
                &lookup,
                "SMTP_SOCKET_TIMEOUT_SECS",
                defaults.timeouts.socket.as_secs(),
            )),
        };

        AppConfig {
            bind_address: lookup("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            port,
            base_url,
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            click_fallback_url: lookup("CLICK_FALLBACK_URL")
                .unwrap_or(defaults.click_fallback_url),
            timeouts,
            accept_invalid_certs: parse_or(
                &lookup,
                "SMTP_ACCEPT_INVALID_CERTS",
                defaults.accept_invalid_certs,
            ),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Valor inválido para {}: '{}', usando el default", key, raw);
            default
        }),
        None => default,
    }
}
