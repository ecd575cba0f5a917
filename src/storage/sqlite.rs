use anyhow::Context;
use entities::kv_entry;
use migration::MigratorTrait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue::Set, Database, DatabaseConnection, EntityTrait};

use super::KeyValueStore;

/// Key-value store backed by the `kv_store` table.
#[derive(Debug, Clone)]
pub struct SqliteKeyValueStore {
    db: DatabaseConnection,
}

impl SqliteKeyValueStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Connect and bring the schema up to date.
    pub async fn connect(connection_string: &str) -> anyhow::Result<Self> {
        let db = Database::connect(connection_string)
            .await
            .with_context(|| format!("Failed to connect to database {}", connection_string))?;
        migration::Migrator::up(&db, None)
            .await
            .with_context(|| "Failed to run database migrations")?;
        tracing::debug!("key-value store ready");
        Ok(Self::new(db))
    }
}

#[async_trait::async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let row = kv_entry::Entity::find_by_id(key.to_string())
            .one(&self.db)
            .await
            .with_context(|| format!("Failed to read key {}", key))?;
        Ok(row.map(|r| r.value))
    }

    #[tracing::instrument(level = "debug", skip(self, value))]
    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let row = kv_entry::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            updated_at: Set(chrono::Utc::now().timestamp_millis()),
        };
        kv_entry::Entity::insert(row)
            .on_conflict(
                OnConflict::column(kv_entry::Column::Key)
                    .update_columns([kv_entry::Column::Value, kv_entry::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .with_context(|| format!("Failed to write key {}", key))?;
        Ok(())
    }
}
