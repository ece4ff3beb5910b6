use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

/// Where a source's content comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "source_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Web,
    Whatsapp,
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceType::Web => write!(f, "web"),
            SourceType::Whatsapp => write!(f, "whatsapp"),
        }
    }
}

impl std::str::FromStr for SourceType {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, SourceError> {
        match s {
            "web" => Ok(SourceType::Web),
            "whatsapp" => Ok(SourceType::Whatsapp),
            other => Err(SourceError::InvalidType(other.to_string())),
        }
    }
}

/// IngestionSource - a configured origin of raw content (a website or a
/// chat group) from which casting opportunities may be harvested.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct IngestionSource {
    pub id: Uuid,
    pub source_type: SourceType,
    /// URL or chat-group identifier. Unique across all sources.
    pub source_identifier: String,
    pub source_name: String,
    pub is_active: bool,
    /// Updated by the intake filter after each successful intake.
    pub last_processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Errors from source registry writes, mapped to HTTP statuses by the
/// route layer.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source identifier already registered: {0}")]
    DuplicateIdentifier(String),

    #[error("invalid source type: {0}")]
    InvalidType(String),

    #[error("source type is immutable after creation")]
    ImmutableType,

    #[error("{field} must not be empty")]
    MissingField { field: &'static str },

    #[error("source not found: {0}")]
    NotFound(Uuid),

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Validated creation payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSource {
    pub source_type: SourceType,
    pub source_identifier: String,
    pub source_name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl CreateSource {
    /// Reject structurally invalid payloads before any write.
    pub fn validate(&self) -> Result<(), SourceError> {
        if self.source_identifier.trim().is_empty() {
            return Err(SourceError::MissingField {
                field: "source_identifier",
            });
        }
        if self.source_name.trim().is_empty() {
            return Err(SourceError::MissingField {
                field: "source_name",
            });
        }
        Ok(())
    }
}

/// Partial update. `source_type` is intentionally absent: it is immutable
/// after creation, and the route layer rejects payloads that include it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourcePatch {
    pub source_name: Option<String>,
    pub is_active: Option<bool>,
}

impl IngestionSource {
    pub async fn create(input: &CreateSource, pool: &PgPool) -> Result<Self, SourceError> {
        input.validate()?;

        let result = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO sources (id, source_type, source_identifier, source_name, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.source_type)
        .bind(input.source_identifier.trim())
        .bind(input.source_name.trim())
        .bind(input.is_active)
        .fetch_one(pool)
        .await;

        match result {
            Ok(source) => Ok(source),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(
                SourceError::DuplicateIdentifier(input.source_identifier.trim().to_string()),
            ),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn update(id: Uuid, patch: &SourcePatch, pool: &PgPool) -> Result<Self, SourceError> {
        if let Some(name) = &patch.source_name {
            if name.trim().is_empty() {
                return Err(SourceError::MissingField {
                    field: "source_name",
                });
            }
        }

        sqlx::query_as::<_, Self>(
            r#"
            UPDATE sources
            SET source_name = COALESCE($2, source_name),
                is_active = COALESCE($3, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.source_name.as_ref().map(|n| n.trim().to_string()))
        .bind(patch.is_active)
        .fetch_optional(pool)
        .await?
        .ok_or(SourceError::NotFound(id))
    }

    /// Soft deactivation. Sources are never physically deleted while
    /// processed-message rows reference them.
    pub async fn deactivate(id: Uuid, pool: &PgPool) -> Result<Self, SourceError> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE sources
            SET is_active = false, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(SourceError::NotFound(id))
    }

    pub async fn list(active_only: bool, pool: &PgPool) -> Result<Vec<Self>, SourceError> {
        let sources = if active_only {
            sqlx::query_as::<_, Self>(
                "SELECT * FROM sources WHERE is_active = true ORDER BY created_at",
            )
            .fetch_all(pool)
            .await?
        } else {
            sqlx::query_as::<_, Self>("SELECT * FROM sources ORDER BY created_at")
                .fetch_all(pool)
                .await?
        };
        Ok(sources)
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>, SourceError> {
        let source = sqlx::query_as::<_, Self>("SELECT * FROM sources WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(source)
    }
}
