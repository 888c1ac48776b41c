//! services/tracking_service.rs
//! Almacén de aperturas y clicks. La primera observación de un id gana;
//! `INSERT OR IGNORE` lo hace seguro con escritores concurrentes.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Pool, Sqlite};

use crate::models::tracking_model::{ClickEvent, OpenEvent, TrackingDocument, TrackingSummary};

#[derive(Clone, Debug)]
pub struct TrackingService {
    db_pool: Pool<Sqlite>,
}

impl TrackingService {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        TrackingService { db_pool }
    }

    /// Devuelve `true` si esta llamada registró la apertura.
    pub async fn record_open(&self, message_id: &str, source_ip: Option<&str>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO tracking_opens (message_id, opened_at, source_ip)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(message_id)
        .bind(Utc::now().timestamp_millis())
        .bind(source_ip)
        .execute(&self.db_pool)
        .await
        .context("Fallo al registrar apertura")?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn record_click(
        &self,
        message_id: &str,
        source_ip: Option<&str>,
        target_url: Option<&str>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO tracking_clicks (message_id, clicked_at, source_ip, target_url)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(message_id)
        .bind(Utc::now().timestamp_millis())
        .bind(source_ip)
        .bind(target_url)
        .execute(&self.db_pool)
        .await
        .context("Fallo al registrar click")?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn summary(&self) -> Result<TrackingSummary> {
        let opens: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracking_opens")
            .fetch_one(&self.db_pool)
            .await
            .context("Fallo al contar aperturas")?;
        let clicks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracking_clicks")
            .fetch_one(&self.db_pool)
            .await
            .context("Fallo al contar clicks")?;

        Ok(TrackingSummary {
            opens: opens as u64,
            clicks: clicks as u64,
        })
    }

    pub async fn document(&self) -> Result<TrackingDocument> {
        let opens = sqlx::query_as::<_, (String, i64, Option<String>)>(
            "SELECT message_id, opened_at, source_ip FROM tracking_opens",
        )
        .fetch_all(&self.db_pool)
        .await
        .context("Fallo al leer aperturas")?;

        let clicks = sqlx::query_as::<_, (String, i64, Option<String>, Option<String>)>(
            "SELECT message_id, clicked_at, source_ip, target_url FROM tracking_clicks",
        )
        .fetch_all(&self.db_pool)
        .await
        .context("Fallo al leer clicks")?;

        Ok(TrackingDocument {
            opens: opens
                .into_iter()
                .map(|(id, ts, ip)| (id, OpenEvent { ts, ip }))
                .collect(),
            clicks: clicks
                .into_iter()
                .map(|(id, ts, ip, url)| (id, ClickEvent { ts, ip, url }))
                .collect(),
        })
    }
}
