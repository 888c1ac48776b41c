//! services/template_renderer.rs
//! Resolución de grupos `{a|b|c}`: una alternativa al azar por grupo.

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::{Captures, Regex};

// Sin llaves anidadas: el grupo termina en la primera `}`.
static VARIANT_GROUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}]+)\}").expect("valid variant group pattern"));

/// Renderiza con el RNG del hilo. Cada llamada puede dar un resultado distinto.
pub fn render(text: &str) -> String {
    render_with(text, &mut rand::thread_rng())
}

pub fn render_with<R: Rng + ?Sized>(text: &str, rng: &mut R) -> String {
    if text.is_empty() {
        return String::new();
    }

    VARIANT_GROUP
        .replace_all(text, |caps: &Captures| {
            let options: Vec<&str> = caps[1].split('|').collect();
            options.choose(rng).copied().unwrap_or_default().to_string()
        })
        .into_owned()
}
