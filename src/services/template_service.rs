use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Pool, Sqlite};

use crate::models::template_model::{SaveTemplateRequest, Template};

#[derive(Clone, Debug)]
pub struct TemplateService {
    db_pool: Pool<Sqlite>,
}

impl TemplateService {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        TemplateService { db_pool }
    }

    /// Lista en el orden en que se guardaron
    pub async fn list(&self) -> Result<Vec<Template>> {
        let rows = sqlx::query_as::<_, (String, String, String, String, Option<String>)>(
            "SELECT id, name, subject, html, saved_at FROM templates ORDER BY position, rowid",
        )
        .fetch_all(&self.db_pool)
        .await
        .context("Fallo al listar plantillas")?;

        Ok(rows
            .into_iter()
            .map(|(id, name, subject, html, saved_at)| Template {
                id,
                name,
                subject,
                html,
                saved_at,
            })
            .collect())
    }

    /// Reemplaza la colección completa
    pub async fn replace_all(&self, templates: Vec<Template>) -> Result<usize> {
        let mut tx = self.db_pool.begin().await?;

        sqlx::query("DELETE FROM templates")
            .execute(&mut *tx)
            .await
            .context("Fallo al vaciar plantillas")?;

        for (position, tmpl) in templates.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO templates (id, name, subject, html, saved_at, position)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&tmpl.id)
            .bind(&tmpl.name)
            .bind(&tmpl.subject)
            .bind(&tmpl.html)
            .bind(&tmpl.saved_at)
            .bind(position as i64)
            .execute(&mut *tx)
            .await
            .context("Fallo al insertar plantilla")?;
        }

        tx.commit().await?;
        Ok(templates.len())
    }

    /// Inserta o actualiza; devuelve la plantilla guardada y el total
    pub async fn save(&self, req: SaveTemplateRequest) -> Result<(Template, usize)> {
        let now = Utc::now();
        let id = req
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| now.timestamp_millis().to_string());

        let tmpl = Template {
            id,
            name: req.name,
            subject: req.subject,
            html: req.html,
            saved_at: Some(now.to_rfc3339()),
        };

        // Una plantilla existente conserva su posición
        sqlx::query(
            r#"
            INSERT INTO templates (id, name, subject, html, saved_at, position)
            VALUES (?1, ?2, ?3, ?4, ?5, (SELECT COALESCE(MAX(position), -1) + 1 FROM templates))
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                subject = excluded.subject,
                html = excluded.html,
                saved_at = excluded.saved_at
            "#,
        )
        .bind(&tmpl.id)
        .bind(&tmpl.name)
        .bind(&tmpl.subject)
        .bind(&tmpl.html)
        .bind(&tmpl.saved_at)
        .execute(&self.db_pool)
        .await
        .context("Fallo al guardar plantilla")?;

        let total = self.count().await?;
        Ok((tmpl, total))
    }

    /// Borra por id; devuelve cuántas quedan
    pub async fn delete(&self, id: &str) -> Result<usize> {
        sqlx::query("DELETE FROM templates WHERE id = ?1")
            .bind(id)
            .execute(&self.db_pool)
            .await
            .context("Fallo al borrar plantilla")?;
        self.count().await
    }

    async fn count(&self) -> Result<usize> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM templates")
            .fetch_one(&self.db_pool)
            .await?;
        Ok(total as usize)
    }
}
