//! services/tracking_injector.rs
//! Inserta el píxel de apertura y reescribe los enlaces para contar clicks.

use chrono::Utc;
use once_cell::sync::Lazy;
use rand::distributions::Alphanumeric;
use rand::Rng;
use regex::{Captures, Regex};

static ABSOLUTE_HREF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)href="(https?://[^"]+)""#).expect("valid href pattern"));

const BODY_CLOSE: &str = "</body>";

/// Id único por mensaje: `{epoch_millis}-{8 caracteres aleatorios}`.
pub fn generate_message_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();
    format!("{}-{}", Utc::now().timestamp_millis(), suffix)
}

#[derive(Debug, Clone)]
pub struct TrackingInjector {
    base_url: String,
}

impl TrackingInjector {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        TrackingInjector {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn open_url(&self, message_id: &str) -> String {
        format!("{}/track/open/{}", self.base_url, message_id)
    }

    pub fn click_url(&self, message_id: &str, target: &str) -> String {
        format!(
            "{}/track/click/{}?url={}",
            self.base_url,
            message_id,
            urlencoding::encode(target)
        )
    }

    pub fn inject(&self, body: &str, message_id: &str) -> String {
        let beacon = format!(
            r#"<img src="{}" width="1" height="1" style="display:none;opacity:0" alt="" />"#,
            self.open_url(message_id)
        );

        let with_beacon = match body.find(BODY_CLOSE) {
            Some(pos) => {
                let mut out = String::with_capacity(body.len() + beacon.len());
                out.push_str(&body[..pos]);
                out.push_str(&beacon);
                out.push_str(&body[pos..]);
                out
            }
            None => format!("{}{}", body, beacon),
        };

        ABSOLUTE_HREF
            .replace_all(&with_beacon, |caps: &Captures| {
                format!(r#"href="{}""#, self.click_url(message_id, &caps[1]))
            })
            .into_owned()
    }
}
