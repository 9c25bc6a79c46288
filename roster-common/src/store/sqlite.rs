//! SQLite table store
//!
//! Creates the `sections` and `members` tables on open (idempotent) and
//! serves the [`TableStore`] operations with sqlx.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

use super::{MemberFields, SectionFields, TableStore};
use crate::model::{Identifier, Member, Section};
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database file at `db_path`
    pub async fn open(db_path: &Path) -> Result<Self> {
        let newly_created = !db_path.exists();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_millis(5000));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        if newly_created {
            info!("Initialized new database: {}", db_path.display());
        } else {
            info!("Opened existing database: {}", db_path.display());
        }

        Self::from_pool(pool).await
    }

    /// Private in-memory database, kept alive by a single pinned connection
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        create_sections_table(&pool).await?;
        create_members_table(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

async fn create_sections_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sections (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            display_name TEXT NOT NULL,
            order_index INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_members_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS members (
            id TEXT PRIMARY KEY,
            section_id TEXT NOT NULL REFERENCES sections(id) ON DELETE CASCADE,
            name TEXT NOT NULL DEFAULT '',
            role TEXT NOT NULL DEFAULT '',
            image_url TEXT NOT NULL DEFAULT '',
            hover_image_url TEXT,
            bio TEXT,
            qualifications TEXT,
            email TEXT NOT NULL DEFAULT '',
            phone TEXT NOT NULL DEFAULT '',
            order_index INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_members_section ON members(section_id, order_index)")
        .execute(pool)
        .await?;

    Ok(())
}

fn parse_uuid(row: &SqliteRow, column: &str) -> Result<Uuid> {
    let raw: String = row.try_get(column)?;
    Uuid::parse_str(&raw).map_err(|e| Error::Store(format!("Invalid {} '{}': {}", column, raw, e)))
}

fn parse_timestamp(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>> {
    let raw: String = row.try_get(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Store(format!("Invalid {} '{}': {}", column, raw, e)))
}

fn section_from_row(row: &SqliteRow) -> Result<Section> {
    Ok(Section {
        id: Identifier::Persisted(parse_uuid(row, "id")?),
        name: row.try_get("name")?,
        display_name: row.try_get("display_name")?,
        order_index: row.try_get("order_index")?,
        created_at: Some(parse_timestamp(row, "created_at")?),
        updated_at: Some(parse_timestamp(row, "updated_at")?),
    })
}

fn member_from_row(row: &SqliteRow) -> Result<Member> {
    Ok(Member {
        id: Identifier::Persisted(parse_uuid(row, "id")?),
        section_id: Identifier::Persisted(parse_uuid(row, "section_id")?),
        name: row.try_get("name")?,
        role: row.try_get("role")?,
        image_url: row.try_get("image_url")?,
        hover_image_url: row.try_get("hover_image_url")?,
        bio: row.try_get("bio")?,
        qualifications: row.try_get("qualifications")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        order_index: row.try_get("order_index")?,
        created_at: Some(parse_timestamp(row, "created_at")?),
        updated_at: Some(parse_timestamp(row, "updated_at")?),
    })
}

fn ensure_affected(rows: u64, table: &str, id: Uuid) -> Result<()> {
    if rows == 0 {
        return Err(Error::NotFound(format!("{} row {}", table, id)));
    }
    Ok(())
}

#[async_trait]
impl TableStore for SqliteStore {
    fn kind(&self) -> &'static str {
        "sqlite"
    }

    async fn select_sections(&self) -> Result<Vec<Section>> {
        let rows = sqlx::query(
            "SELECT * FROM sections ORDER BY order_index ASC, created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(section_from_row).collect()
    }

    async fn select_members(&self) -> Result<Vec<Member>> {
        let rows = sqlx::query(
            "SELECT * FROM members ORDER BY section_id ASC, order_index ASC, created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(member_from_row).collect()
    }

    async fn insert_section(&self, fields: &SectionFields) -> Result<Section> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO sections (id, name, display_name, order_index, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&fields.name)
        .bind(&fields.display_name)
        .bind(fields.order_index)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(Section {
            id: Identifier::Persisted(id),
            name: fields.name.clone(),
            display_name: fields.display_name.clone(),
            order_index: fields.order_index,
            created_at: Some(now),
            updated_at: Some(now),
        })
    }

    async fn update_section(&self, id: Uuid, fields: &SectionFields) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE sections
            SET name = ?, display_name = ?, order_index = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.display_name)
        .bind(fields.order_index)
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        ensure_affected(result.rows_affected(), "sections", id)
    }

    async fn delete_section(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM sections WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        ensure_affected(result.rows_affected(), "sections", id)
    }

    async fn insert_member(&self, fields: &MemberFields) -> Result<Member> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO members (
                id, section_id, name, role, image_url, hover_image_url, bio,
                qualifications, email, phone, order_index, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(fields.section_id.to_string())
        .bind(&fields.name)
        .bind(&fields.role)
        .bind(&fields.image_url)
        .bind(&fields.hover_image_url)
        .bind(&fields.bio)
        .bind(&fields.qualifications)
        .bind(&fields.email)
        .bind(&fields.phone)
        .bind(fields.order_index)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(Member {
            id: Identifier::Persisted(id),
            section_id: Identifier::Persisted(fields.section_id),
            name: fields.name.clone(),
            role: fields.role.clone(),
            image_url: fields.image_url.clone(),
            hover_image_url: fields.hover_image_url.clone(),
            bio: fields.bio.clone(),
            qualifications: fields.qualifications.clone(),
            email: fields.email.clone(),
            phone: fields.phone.clone(),
            order_index: fields.order_index,
            created_at: Some(now),
            updated_at: Some(now),
        })
    }

    async fn update_member(&self, id: Uuid, fields: &MemberFields) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE members
            SET section_id = ?, name = ?, role = ?, image_url = ?, hover_image_url = ?,
                bio = ?, qualifications = ?, email = ?, phone = ?, order_index = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(fields.section_id.to_string())
        .bind(&fields.name)
        .bind(&fields.role)
        .bind(&fields.image_url)
        .bind(&fields.hover_image_url)
        .bind(&fields.bio)
        .bind(&fields.qualifications)
        .bind(&fields.email)
        .bind(&fields.phone)
        .bind(fields.order_index)
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        ensure_affected(result.rows_affected(), "members", id)
    }

    async fn delete_member(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM members WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        ensure_affected(result.rows_affected(), "members", id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section_fields(name: &str, order_index: i64) -> SectionFields {
        SectionFields {
            name: name.to_string(),
            display_name: name.to_uppercase(),
            order_index,
        }
    }

    fn member_fields(section_id: Uuid, name: &str, order_index: i64) -> MemberFields {
        MemberFields {
            section_id,
            name: name.to_string(),
            role: "Adviser".to_string(),
            image_url: String::new(),
            hover_image_url: None,
            bio: None,
            qualifications: None,
            email: String::new(),
            phone: String::new(),
            order_index,
        }
    }

    #[tokio::test]
    async fn test_sections_come_back_ordered() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.insert_section(&section_fields("second", 1)).await.unwrap();
        store.insert_section(&section_fields("first", 0)).await.unwrap();

        let names: Vec<String> = store
            .select_sections()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_update_section_round_trips() {
        let store = SqliteStore::in_memory().await.unwrap();
        let section = store.insert_section(&section_fields("a", 0)).await.unwrap();
        let id = section.id.persisted().unwrap();

        store.update_section(id, &section_fields("renamed", 4)).await.unwrap();
        let loaded = store.select_sections().await.unwrap();
        assert_eq!(loaded[0].name, "renamed");
        assert_eq!(loaded[0].order_index, 4);
        assert_eq!(loaded[0].created_at, section.created_at);
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let store = SqliteStore::in_memory().await.unwrap();
        let err = store
            .update_section(Uuid::new_v4(), &section_fields("a", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_member_requires_existing_section() {
        let store = SqliteStore::in_memory().await.unwrap();
        let result = store.insert_member(&member_fields(Uuid::new_v4(), "Ann", 0)).await;
        assert!(matches!(result, Err(Error::Database(_))));
    }

    #[tokio::test]
    async fn test_delete_section_cascades_to_members() {
        let store = SqliteStore::in_memory().await.unwrap();
        let section = store.insert_section(&section_fields("a", 0)).await.unwrap();
        let id = section.id.persisted().unwrap();
        store.insert_member(&member_fields(id, "Ann", 0)).await.unwrap();
        store.insert_member(&member_fields(id, "Bob", 1)).await.unwrap();

        store.delete_section(id).await.unwrap();
        assert!(store.select_members().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_nullable_member_columns() {
        let store = SqliteStore::in_memory().await.unwrap();
        let section = store.insert_section(&section_fields("a", 0)).await.unwrap();
        let mut fields = member_fields(section.id.persisted().unwrap(), "Ann", 0);
        fields.bio = Some("Bio".to_string());
        store.insert_member(&fields).await.unwrap();

        let members = store.select_members().await.unwrap();
        assert_eq!(members[0].bio.as_deref(), Some("Bio"));
        assert_eq!(members[0].hover_image_url, None);
    }
}
