//! SQLite-backed world template and backup storage.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use waypoint_domain::{BackupId, ExperienceId, World, WorldTemplate};

use crate::infrastructure::ports::{ClockPort, TemplateStoreError, TemplateStorePort};

/// SQLite implementation of the template/backup store.
pub struct SqliteTemplateStore {
    pool: SqlitePool,
    clock: Arc<dyn ClockPort>,
}

impl SqliteTemplateStore {
    pub async fn new(db_path: &str, clock: Arc<dyn ClockPort>) -> Result<Self, TemplateStoreError> {
        let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path))
            .await
            .map_err(|e| TemplateStoreError::database("connect", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS world_templates (
                experience_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                template_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| TemplateStoreError::database("create templates table", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS world_backups (
                backup_id TEXT PRIMARY KEY,
                experience_id TEXT NOT NULL,
                world_version INTEGER NOT NULL,
                world_json TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| TemplateStoreError::database("create backups table", e))?;

        Ok(Self { pool, clock })
    }
}

#[async_trait]
impl TemplateStorePort for SqliteTemplateStore {
    async fn load_template(
        &self,
        experience_id: ExperienceId,
    ) -> Result<Option<WorldTemplate>, TemplateStoreError> {
        let row = sqlx::query(
            "SELECT template_json FROM world_templates WHERE experience_id = ?",
        )
        .bind(experience_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TemplateStoreError::database("load template", e))?;

        match row {
            Some(row) => {
                let json: String = row.get("template_json");
                let template = serde_json::from_str(&json)
                    .map_err(|e| TemplateStoreError::Serialization(e.to_string()))?;
                Ok(Some(template))
            }
            None => Ok(None),
        }
    }

    async fn save_template(&self, template: &WorldTemplate) -> Result<(), TemplateStoreError> {
        let json = serde_json::to_string(template)
            .map_err(|e| TemplateStoreError::Serialization(e.to_string()))?;
        let now = self.clock.now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO world_templates (experience_id, name, template_json, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(experience_id) DO UPDATE SET
                name = excluded.name,
                template_json = excluded.template_json,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(template.experience_id.to_string())
        .bind(&template.name)
        .bind(json)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| TemplateStoreError::database("save template", e))?;

        Ok(())
    }

    async fn save_backup(&self, world: &World) -> Result<BackupId, TemplateStoreError> {
        let backup_id = BackupId::new();
        let json = serde_json::to_string(world)
            .map_err(|e| TemplateStoreError::Serialization(e.to_string()))?;
        let now = self.clock.now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO world_backups (backup_id, experience_id, world_version, world_json, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(backup_id.to_string())
        .bind(world.id.to_string())
        .bind(world.version as i64)
        .bind(json)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| TemplateStoreError::database("save backup", e))?;

        tracing::info!(backup_id = %backup_id, experience_id = %world.id, version = world.version, "World backup created");
        Ok(backup_id)
    }
}
