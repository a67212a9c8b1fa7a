use crate::config::toml_config::StoreConfig;
use crate::domain::model::{RowId, Table};
use crate::domain::ports::{DataStore, Direction, Query};
use crate::utils::error::{AdminError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

const REST_PATH: &str = "/rest/v1";

/// PostgREST client for the hosted tables (Supabase-compatible).
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl RestStore {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            retry_attempts: config.retry_attempts.unwrap_or(0),
            retry_delay: Duration::from_secs(config.retry_delay_seconds.unwrap_or(1)),
        })
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}{}/{}", self.base_url, REST_PATH, table.name())
    }

    fn rpc_url(&self, function: &str) -> String {
        format!("{}{}/rpc/{}", self.base_url, REST_PATH, function)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn query_params(query: &Query) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), query.select.clone())];
        for filter in &query.filters {
            params.push((filter.column.clone(), format!("eq.{}", filter.value)));
        }
        if let Some(order) = &query.order {
            let direction = match order.direction {
                Direction::Ascending => "asc",
                Direction::Descending => "desc",
            };
            params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }
        if let Some(limit) = query.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = query.offset {
            params.push(("offset".to_string(), offset.to_string()));
        }
        params
    }

    /// 非 2xx 回應轉成 StoreError，盡量取出 PostgREST 的 `message` 欄位
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .unwrap_or(body);
        Err(AdminError::StoreError {
            status: status.as_u16(),
            message,
        })
    }

    fn is_retryable(error: &AdminError) -> bool {
        match error {
            AdminError::ApiError(_) => true,
            AdminError::StoreError { status, .. } => *status >= 500,
            _ => false,
        }
    }

    async fn select_once(&self, table: Table, query: &Query) -> Result<Vec<serde_json::Value>> {
        let request = self
            .authorized(self.client.get(self.table_url(table)))
            .query(&Self::query_params(query));
        let response = Self::check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    /// 以 return=representation 取回受影響的列，藉此判斷 id 是否存在
    async fn mutate_by_id(
        &self,
        request: RequestBuilder,
        table: Table,
        id: RowId,
    ) -> Result<()> {
        let request = self
            .authorized(request)
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation");
        let response = Self::check(request.send().await?).await?;
        let affected: Vec<serde_json::Value> = response.json().await?;
        if affected.is_empty() {
            return Err(AdminError::NotFound {
                table: table.name().to_string(),
                id,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DataStore for RestStore {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<serde_json::Value>> {
        let mut attempt = 0;
        loop {
            tracing::debug!("GET {} select={} (attempt {})", table, query.select, attempt + 1);
            match self.select_once(table, query).await {
                Ok(rows) => {
                    tracing::debug!("Fetched {} rows from {}", rows.len(), table);
                    return Ok(rows);
                }
                Err(e) if attempt < self.retry_attempts && Self::is_retryable(&e) => {
                    attempt += 1;
                    tracing::warn!(
                        "⚠️ Fetching {} failed: {}. Retrying in {:?} ({}/{})",
                        table,
                        e,
                        self.retry_delay,
                        attempt,
                        self.retry_attempts
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn insert(&self, table: Table, row: serde_json::Value) -> Result<()> {
        tracing::debug!("POST {} {}", table, row);
        let request = self
            .authorized(self.client.post(self.table_url(table)))
            .header("Prefer", "return=minimal")
            .json(&[row]);
        Self::check(request.send().await?).await?;
        tracing::info!("➕ Inserted row into {}", table);
        Ok(())
    }

    async fn update(&self, table: Table, id: RowId, patch: serde_json::Value) -> Result<()> {
        tracing::debug!("PATCH {} id={} {}", table, id, patch);
        let request = self.client.patch(self.table_url(table)).json(&patch);
        self.mutate_by_id(request, table, id).await?;
        tracing::info!("✏️ Updated {} row {}", table, id);
        Ok(())
    }

    async fn delete(&self, table: Table, id: RowId) -> Result<()> {
        tracing::debug!("DELETE {} id={}", table, id);
        let request = self.client.delete(self.table_url(table));
        self.mutate_by_id(request, table, id).await?;
        tracing::info!("🗑️ Deleted {} row {}", table, id);
        Ok(())
    }

    async fn rpc(&self, function: &str, args: serde_json::Value) -> Result<serde_json::Value> {
        tracing::debug!("POST rpc/{}", function);
        let request = self
            .authorized(self.client.post(self.rpc_url(function)))
            .json(&args);
        let response = Self::check(request.send().await?).await?;
        Ok(response.json().await?)
    }
}
