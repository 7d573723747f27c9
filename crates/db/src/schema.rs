//! Schema variant detection.
//!
//! Experiment databases come in two layouts. The raw layout is what the
//! tracker writes (`ROI_0`, `IDENTITY`); the validated layout adds corrected
//! copies (`ROI_0_VAL`, `IDENTITY_VAL`) and is announced by the METADATA field
//! `schema_variant = validated`. A few tables and columns are optional and are
//! probed once when the database is opened.

use serde::Serialize;

use crate::repositories::MetadataRepo;
use crate::DbPool;

/// METADATA field naming the schema variant.
pub const FIELD_SCHEMA_VARIANT: &str = "schema_variant";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVariant {
    Raw,
    Validated,
}

impl SchemaVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Validated => "validated",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "raw" => Some(Self::Raw),
            "validated" => Some(Self::Validated),
            _ => None,
        }
    }

    fn tracking_table(&self) -> &'static str {
        match self {
            Self::Raw => "ROI_0",
            Self::Validated => "ROI_0_VAL",
        }
    }

    fn identity_table(&self) -> &'static str {
        match self {
            Self::Raw => "IDENTITY",
            Self::Validated => "IDENTITY_VAL",
        }
    }
}

/// Table names and optional features of one experiment database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableSet {
    pub variant: SchemaVariant,
    pub tracking: &'static str,
    pub identity: &'static str,
    /// The tracking table has a `fragment` column.
    pub has_fragment: bool,
    pub has_ai: bool,
    pub has_concatenation: bool,
}

impl TableSet {
    pub const AI: &'static str = "AI";
    pub const CONCATENATION: &'static str = "CONCATENATION";

    pub fn new(variant: SchemaVariant) -> Self {
        Self {
            variant,
            tracking: variant.tracking_table(),
            identity: variant.identity_table(),
            has_fragment: false,
            has_ai: false,
            has_concatenation: false,
        }
    }

    /// Probe the database for its variant and optional tables.
    pub async fn detect(pool: &DbPool) -> Result<Self, sqlx::Error> {
        let declared = MetadataRepo::get(pool, FIELD_SCHEMA_VARIANT).await?;
        let mut variant = match declared.as_deref() {
            None => SchemaVariant::Raw,
            Some(value) => SchemaVariant::parse(value).unwrap_or_else(|| {
                tracing::warn!(value, "Unknown schema variant, using raw tables");
                SchemaVariant::Raw
            }),
        };

        if variant == SchemaVariant::Validated {
            let tracking = table_exists(pool, variant.tracking_table()).await?;
            let identity = table_exists(pool, variant.identity_table()).await?;
            if !(tracking && identity) {
                tracing::warn!("Validated tables are missing, falling back to raw tables");
                variant = SchemaVariant::Raw;
            }
        }

        let mut tables = Self::new(variant);
        tables.has_fragment = column_exists(pool, tables.tracking, "fragment").await?;
        tables.has_ai = table_exists(pool, Self::AI).await?;
        tables.has_concatenation = table_exists(pool, Self::CONCATENATION).await?;

        tracing::debug!(
            variant = variant.as_str(),
            has_fragment = tables.has_fragment,
            has_ai = tables.has_ai,
            "Detected experiment schema"
        );
        Ok(tables)
    }
}

pub async fn table_exists(pool: &DbPool, table: &str) -> Result<bool, sqlx::Error> {
    let count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = $1")
            .bind(table)
            .fetch_one(pool)
            .await?;
    Ok(count.0 > 0)
}

pub async fn column_exists(pool: &DbPool, table: &str, column: &str) -> Result<bool, sqlx::Error> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pragma_table_info($1) WHERE name = $2")
        .bind(table)
        .bind(column)
        .fetch_one(pool)
        .await?;
    Ok(count.0 > 0)
}
