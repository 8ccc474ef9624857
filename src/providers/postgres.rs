use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::BTreeMap;

use super::FeatureSwitchProvider;
use crate::error::ProviderError;
use crate::switches::{FeatureSwitch, SwitchRecord, SwitchTypes};

/// Concurrent saves of the same switch are last-write-wins.
#[derive(Debug, Clone)]
pub struct PostgresProvider {
    db: PgPool,
    types: SwitchTypes,
}

#[derive(Debug, sqlx::FromRow)]
struct SwitchRow {
    name: String,
    is_enabled: bool,
    feature_type: String,
    attributes: Json<BTreeMap<String, String>>,
}

impl From<SwitchRow> for SwitchRecord {
    fn from(row: SwitchRow) -> Self {
        SwitchRecord {
            name: row.name,
            is_enabled: row.is_enabled,
            feature_type: row.feature_type,
            attributes: row.attributes.0,
        }
    }
}

impl PostgresProvider {
    pub fn new(db: PgPool) -> Self {
        Self::with_types(db, SwitchTypes::default())
    }

    pub fn with_types(db: PgPool, types: SwitchTypes) -> Self {
        Self { db, types }
    }

    pub async fn connect(database_url: &str) -> Result<Self, ProviderError> {
        let db = PgPool::connect(database_url).await?;
        Ok(Self::new(db))
    }

    pub async fn migrate(&self) -> Result<(), ProviderError> {
        sqlx::migrate!("./migrations").run(&self.db).await?;
        Ok(())
    }

    fn rebuild(&self, record: SwitchRecord) -> Result<Box<dyn FeatureSwitch>, ProviderError> {
        self.types
            .from_record(&record)
            .ok_or(ProviderError::UnknownFeatureType {
                name: record.name,
                feature_type: record.feature_type,
            })
    }
}

#[async_trait]
impl FeatureSwitchProvider for PostgresProvider {
    async fn initialise(&self, switch_names: &[String]) -> Result<(), ProviderError> {
        let mut tx = self.db.begin().await?;

        for name in switch_names {
            let switch = self.types.create_default(name).ok_or_else(|| {
                ProviderError::UnknownFeatureType {
                    name: name.clone(),
                    feature_type: self.types.default_type().to_string(),
                }
            })?;
            let record = switch.to_record();

            sqlx::query(
                r#"
                INSERT INTO feature_switches (name, is_enabled, feature_type, attributes)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (name) DO NOTHING
                "#,
            )
            .bind(&record.name)
            .bind(record.is_enabled)
            .bind(&record.feature_type)
            .bind(Json(&record.attributes))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<Box<dyn FeatureSwitch>>, ProviderError> {
        let row = sqlx::query_as::<_, SwitchRow>(
            r#"
            SELECT name, is_enabled, feature_type, attributes
            FROM feature_switches
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.db)
        .await?;

        row.map(|row| self.rebuild(row.into())).transpose()
    }

    async fn save(&self, switch: &dyn FeatureSwitch) -> Result<(), ProviderError> {
        let record = switch.to_record();

        sqlx::query(
            r#"
            INSERT INTO feature_switches (name, is_enabled, feature_type, attributes)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO UPDATE
            SET
                is_enabled = EXCLUDED.is_enabled,
                feature_type = EXCLUDED.feature_type,
                attributes = EXCLUDED.attributes,
                updated_at = NOW()
            "#,
        )
        .bind(&record.name)
        .bind(record.is_enabled)
        .bind(&record.feature_type)
        .bind(Json(&record.attributes))
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn insert(&self, switch: &dyn FeatureSwitch) -> Result<bool, ProviderError> {
        let record = switch.to_record();

        let result = sqlx::query(
            r#"
            INSERT INTO feature_switches (name, is_enabled, feature_type, attributes)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(&record.name)
        .bind(record.is_enabled)
        .bind(&record.feature_type)
        .bind(Json(&record.attributes))
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn all(&self) -> Result<Vec<Box<dyn FeatureSwitch>>, ProviderError> {
        let rows = sqlx::query_as::<_, SwitchRow>(
            r#"
            SELECT name, is_enabled, feature_type, attributes
            FROM feature_switches
            ORDER BY name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let mut switches = Vec::with_capacity(rows.len());
        for row in rows {
            match self.rebuild(row.into()) {
                Ok(switch) => switches.push(switch),
                Err(e) => tracing::warn!(error = %e, "skipping stored switch"),
            }
        }

        Ok(switches)
    }
}
