//! Hosted backend table store
//!
//! Speaks the PostgREST dialect used by hosted backend-as-a-service
//! products: `/rest/v1/<table>` with `order=` / `id=eq.` query filters,
//! `Prefer: return=representation` on insert, and the project API key sent
//! both as `apikey` and as a bearer token.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use super::{MemberFields, SectionFields, TableStore};
use crate::model::{Identifier, Member, Section};
use crate::{Error, Result};

const SECTIONS: &str = "sections";
const MEMBERS: &str = "members";

#[derive(Debug, Deserialize)]
struct SectionRow {
    id: Uuid,
    name: String,
    display_name: String,
    order_index: i64,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<SectionRow> for Section {
    fn from(row: SectionRow) -> Self {
        Section {
            id: Identifier::Persisted(row.id),
            name: row.name,
            display_name: row.display_name,
            order_index: row.order_index,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MemberRow {
    id: Uuid,
    section_id: Uuid,
    #[serde(default)]
    name: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    image_url: String,
    hover_image_url: Option<String>,
    bio: Option<String>,
    qualifications: Option<String>,
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone: String,
    order_index: i64,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<MemberRow> for Member {
    fn from(row: MemberRow) -> Self {
        Member {
            id: Identifier::Persisted(row.id),
            section_id: Identifier::Persisted(row.section_id),
            name: row.name,
            role: row.role,
            image_url: row.image_url,
            hover_image_url: row.hover_image_url,
            bio: row.bio,
            qualifications: row.qualifications,
            email: row.email,
            phone: row.phone,
            order_index: row.order_index,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, api_key)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn select<T: DeserializeOwned>(&self, table: &str, order: &str) -> Result<Vec<T>> {
        let request = self
            .client
            .get(self.table_url(table))
            .query(&[("select", "*"), ("order", order)]);
        let response = checked(self.authorized(request).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn insert<T: DeserializeOwned>(&self, table: &str, body: Value) -> Result<T> {
        let request = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .json(&body);
        let response = checked(self.authorized(request).send().await?).await?;
        let mut rows: Vec<T> = response.json().await?;
        if rows.is_empty() {
            return Err(Error::Store(format!("Insert into {} returned no row", table)));
        }
        Ok(rows.remove(0))
    }

    async fn update(&self, table: &str, id: Uuid, mut body: Value) -> Result<()> {
        if let Value::Object(map) = &mut body {
            map.insert("updated_at".to_string(), Value::String(Utc::now().to_rfc3339()));
        }
        let request = self
            .client
            .patch(self.table_url(table))
            .query(&[("id", format!("eq.{}", id))])
            .json(&body);
        checked(self.authorized(request).send().await?).await?;
        debug!("Updated {} row {}", table, id);
        Ok(())
    }

    async fn delete(&self, table: &str, id: Uuid) -> Result<()> {
        let request = self
            .client
            .delete(self.table_url(table))
            .query(&[("id", format!("eq.{}", id))]);
        checked(self.authorized(request).send().await?).await?;
        debug!("Deleted {} row {}", table, id);
        Ok(())
    }
}

/// Turn a non-2xx response into a store error carrying the body text
async fn checked(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::Store(format!("{}: {}", status, body)))
}

#[async_trait]
impl TableStore for RestStore {
    fn kind(&self) -> &'static str {
        "rest"
    }

    async fn select_sections(&self) -> Result<Vec<Section>> {
        let rows: Vec<SectionRow> = self.select(SECTIONS, "order_index.asc").await?;
        Ok(rows.into_iter().map(Section::from).collect())
    }

    async fn select_members(&self) -> Result<Vec<Member>> {
        let rows: Vec<MemberRow> = self
            .select(MEMBERS, "section_id.asc,order_index.asc")
            .await?;
        Ok(rows.into_iter().map(Member::from).collect())
    }

    async fn insert_section(&self, fields: &SectionFields) -> Result<Section> {
        let row: SectionRow = self.insert(SECTIONS, serde_json::to_value(fields)?).await?;
        Ok(row.into())
    }

    async fn update_section(&self, id: Uuid, fields: &SectionFields) -> Result<()> {
        self.update(SECTIONS, id, serde_json::to_value(fields)?).await
    }

    async fn delete_section(&self, id: Uuid) -> Result<()> {
        self.delete(SECTIONS, id).await
    }

    async fn insert_member(&self, fields: &MemberFields) -> Result<Member> {
        let row: MemberRow = self.insert(MEMBERS, serde_json::to_value(fields)?).await?;
        Ok(row.into())
    }

    async fn update_member(&self, id: Uuid, fields: &MemberFields) -> Result<()> {
        self.update(MEMBERS, id, serde_json::to_value(fields)?).await
    }

    async fn delete_member(&self, id: Uuid) -> Result<()> {
        self.delete(MEMBERS, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    const SECTION_ID: &str = "5b3f8a4e-8f3c-4a53-9d1e-0a2b9c7d6e51";

    async fn list_sections(
        headers: HeaderMap,
        Query(params): Query<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        if headers.get("apikey").map(|v| v.as_bytes()) != Some(b"anon-key".as_slice()) {
            return (StatusCode::UNAUTHORIZED, Json(json!({"message": "no key"})));
        }
        assert_eq!(params.get("order").map(String::as_str), Some("order_index.asc"));
        (
            StatusCode::OK,
            Json(json!([{
                "id": SECTION_ID,
                "name": "leadership",
                "display_name": "Leadership Team",
                "order_index": 0,
                "created_at": "2024-03-01T10:00:00+00:00",
                "updated_at": "2024-03-01T10:00:00+00:00"
            }])),
        )
    }

    async fn insert_section(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        let mut row = body;
        row["id"] = json!(SECTION_ID);
        (StatusCode::CREATED, Json(json!([row])))
    }

    async fn spawn_backend() -> String {
        let app = Router::new().route(
            "/rest/v1/sections",
            get(list_sections)
                .post(insert_section)
                .delete(|| async { (StatusCode::CONFLICT, "still referenced") }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn test_select_sections_sends_key_and_order() {
        let store = RestStore::new(spawn_backend().await, "anon-key");
        let sections = store.select_sections().await.unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].name, "leadership");
        assert_eq!(
            sections[0].id,
            Identifier::Persisted(Uuid::parse_str(SECTION_ID).unwrap())
        );
    }

    #[tokio::test]
    async fn test_insert_returns_representation() {
        let store = RestStore::new(spawn_backend().await, "anon-key");
        let section = store
            .insert_section(&SectionFields {
                name: "advisers".to_string(),
                display_name: "Financial Advisers".to_string(),
                order_index: 1,
            })
            .await
            .unwrap();
        assert_eq!(section.name, "advisers");
        assert_eq!(section.order_index, 1);
        assert!(!section.id.is_pending());
    }

    #[tokio::test]
    async fn test_rejection_carries_body_text() {
        let store = RestStore::new(spawn_backend().await, "anon-key");
        let err = store.delete_section(Uuid::new_v4()).await.unwrap_err();
        match err {
            Error::Store(message) => assert!(message.contains("still referenced")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
