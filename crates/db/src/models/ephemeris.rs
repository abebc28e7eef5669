use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use utils::date_key;
use uuid::Uuid;

/// Classification tag stored with every ephemeris
#[derive(Debug, Clone, Type, Serialize, Deserialize, PartialEq, EnumString, Display, Default)]
#[sqlx(type_name = "ephemeris_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EphemerisCategory {
    #[default]
    Programming,
}

/// Language the event text is written in
#[derive(Debug, Clone, Type, Serialize, Deserialize, PartialEq, EnumString, Display, Default)]
#[sqlx(type_name = "ephemeris_language", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EphemerisLanguage {
    #[default]
    Es,
}

/// A stored "fact of the day"
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Ephemeris {
    pub id: Uuid,
    pub date: NaiveDate,
    pub event: String,
    pub display_date: String,
    pub category: EphemerisCategory,
    pub language: EphemerisLanguage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload. `display_date` is always derived from `date`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateEphemeris {
    pub date: NaiveDate,
    pub event: String,
    #[serde(default)]
    pub category: EphemerisCategory,
    #[serde(default)]
    pub language: EphemerisLanguage,
}

impl CreateEphemeris {
    pub fn new(date: NaiveDate, event: impl Into<String>) -> Self {
        Self {
            date,
            event: event.into(),
            category: EphemerisCategory::default(),
            language: EphemerisLanguage::default(),
        }
    }

    pub fn display_date(&self) -> String {
        date_key::display_key(self.date)
    }
}

const SELECT_COLUMNS: &str =
    "id, date, event, display_date, category, language, created_at, updated_at";

impl Ephemeris {
    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        data: &CreateEphemeris,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Ephemeris>(&format!(
            r#"INSERT INTO ephemerides (id, date, event, display_date, category, language)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING {SELECT_COLUMNS}"#
        ))
        .bind(id)
        .bind(data.date)
        .bind(&data.event)
        .bind(data.display_date())
        .bind(&data.category)
        .bind(&data.language)
        .fetch_one(pool)
        .await
    }

    /// All rows for a calendar day, oldest year first.
    pub async fn find_by_display_date(
        pool: &SqlitePool,
        display_date: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Ephemeris>(&format!(
            r#"SELECT {SELECT_COLUMNS}
               FROM ephemerides
               WHERE display_date = $1
               ORDER BY date ASC, created_at ASC"#
        ))
        .bind(display_date)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_date(pool: &SqlitePool, date: NaiveDate) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Ephemeris>(&format!(
            r#"SELECT {SELECT_COLUMNS}
               FROM ephemerides
               WHERE date = $1
               ORDER BY created_at ASC"#
        ))
        .bind(date)
        .fetch_all(pool)
        .await
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Ephemeris>(&format!(
            r#"SELECT {SELECT_COLUMNS}
               FROM ephemerides
               ORDER BY date ASC, created_at ASC"#
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn find_random(pool: &SqlitePool) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Ephemeris>(&format!(
            r#"SELECT {SELECT_COLUMNS}
               FROM ephemerides
               ORDER BY RANDOM()
               LIMIT 1"#
        ))
        .fetch_optional(pool)
        .await
    }

    /// Distinct `MM-DD` keys that have at least one row, sorted.
    pub async fn available_display_dates(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT display_date FROM ephemerides ORDER BY display_date ASC",
        )
        .fetch_all(pool)
        .await
    }
}
