//! PostgREST (Supabase) implementation of [`QuestionnaireStore`].

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Config, Member, RecordId, TableConfig, UserProfile};
use crate::storage::{
    ASSIGNMENT_KEY, AssignmentRow, LogRow, QUESTION_KEY, QUESTIONNAIRE_KEY, QuestionRow,
    QuestionnaireRow, QuestionnaireStore,
};
use crate::utils::http::create_backend_client;

const PREFER_REPRESENTATION: &str = "return=representation,resolution=merge-duplicates";
const PREFER_MINIMAL: &str = "return=minimal,resolution=merge-duplicates";

#[derive(Debug, Deserialize)]
struct IdRow {
    id: RecordId,
}

/// Store talking to `{url}/rest/v1/{table}`.
pub struct SupabaseStore {
    client: Client,
    base: Url,
    tables: TableConfig,
}

impl SupabaseStore {
    pub fn new(client: Client, base_url: &str, tables: TableConfig) -> Result<Self> {
        let root = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))?;
        Ok(Self {
            client,
            base: root.join("rest/v1/")?,
            tables,
        })
    }

    /// Build the store from validated configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = create_backend_client(&config.backend)?;
        Self::new(client, &config.backend.url, config.tables.clone())
    }

    fn endpoint(&self, table: &str) -> Result<Url> {
        Ok(self.base.join(table)?)
    }

    /// Send a request, turning non-2xx answers into backend errors.
    async fn send(&self, table: &str, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        log::debug!("{} answered {}: {}", table, status, body);
        Err(AppError::backend(table, status.as_u16(), body.trim()))
    }

    async fn insert_returning_ids<T: serde::Serialize + Sync>(
        &self,
        table: &str,
        on_conflict: &str,
        rows: &T,
    ) -> Result<Vec<RecordId>> {
        let request = self
            .client
            .post(self.endpoint(table)?)
            .header("Prefer", PREFER_REPRESENTATION)
            .query(&[("on_conflict", on_conflict)])
            .json(rows);
        let ids: Vec<IdRow> = self.send(table, request).await?.json().await?;
        Ok(ids.into_iter().map(|row| row.id).collect())
    }
}

#[async_trait]
impl QuestionnaireStore for SupabaseStore {
    async fn find_user(&self, email: &str) -> Result<Option<UserProfile>> {
        let table = &self.tables.usuarios;
        let filter = format!("eq.{email}");
        let request = self.client.get(self.endpoint(table)?).query(&[
            ("select", "id,email,igreja_id"),
            ("email", filter.as_str()),
            ("limit", "1"),
        ]);

        let users: Vec<UserProfile> = self.send(table, request).await?.json().await?;
        Ok(users.into_iter().next())
    }

    async fn fetch_members(&self, church: Option<&RecordId>) -> Result<Vec<Member>> {
        let table = &self.tables.membros;
        let mut query = vec![("select".to_string(), "*".to_string())];
        if let Some(church) = church {
            query.push(("igreja_id".to_string(), format!("eq.{church}")));
        }
        let request = self.client.get(self.endpoint(table)?).query(&query);

        let members: Vec<Member> = self.send(table, request).await?.json().await?;
        log::debug!("Fetched {} members from {}", members.len(), table);
        Ok(members)
    }

    async fn insert_questionnaire(&self, row: &QuestionnaireRow) -> Result<RecordId> {
        let table = &self.tables.questionarios;
        let ids = self.insert_returning_ids(table, QUESTIONNAIRE_KEY, row).await?;
        ids.into_iter()
            .next()
            .ok_or_else(|| AppError::backend(table.as_str(), 200, "no id returned"))
    }

    async fn insert_questions(&self, rows: &[QuestionRow]) -> Result<Vec<RecordId>> {
        let table = &self.tables.perguntas;
        let ids = self.insert_returning_ids(table, QUESTION_KEY, &rows).await?;
        if ids.len() != rows.len() {
            return Err(AppError::backend(
                table.as_str(),
                200,
                format!("expected {} ids, got {}", rows.len(), ids.len()),
            ));
        }
        Ok(ids)
    }

    async fn insert_assignments(&self, rows: &[AssignmentRow]) -> Result<usize> {
        let table = &self.tables.respostas;
        let request = self
            .client
            .post(self.endpoint(table)?)
            .header("Prefer", PREFER_MINIMAL)
            .query(&[("on_conflict", ASSIGNMENT_KEY)])
            .json(&rows);
        self.send(table, request).await?;
        Ok(rows.len())
    }

    async fn log_event(&self, row: &LogRow) -> Result<()> {
        let table = &self.tables.logs;
        let request = self
            .client
            .post(self.endpoint(table)?)
            .header("Prefer", "return=minimal")
            .json(row);
        self.send(table, request).await?;
        Ok(())
    }
}
