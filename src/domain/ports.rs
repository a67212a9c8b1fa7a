use crate::domain::model::{RowId, Table};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

/// 欄位等於某值的篩選條件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

/// 對單一資料表的查詢：欄位選擇（可含內嵌關聯）、篩選、排序與分頁
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub select: String,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            select: "*".to_string(),
            filters: Vec::new(),
            order: None,
            limit: None,
            offset: None,
        }
    }
}

impl Query {
    pub fn select(columns: impl Into<String>) -> Self {
        Self {
            select: columns.into(),
            ..Self::default()
        }
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order = Some(Order {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push(Filter {
            column: column.into(),
            value: value.to_string(),
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// 伺服器端單次回傳筆數的上限（Supabase 預設 max-rows）
pub const PAGE_SIZE: usize = 1000;

/// Remote table storage. Every call returns or acts on a fully materialized collection.
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<serde_json::Value>>;
    async fn insert(&self, table: Table, row: serde_json::Value) -> Result<()>;
    async fn update(&self, table: Table, id: RowId, patch: serde_json::Value) -> Result<()>;
    async fn delete(&self, table: Table, id: RowId) -> Result<()>;
    async fn rpc(&self, function: &str, args: serde_json::Value) -> Result<serde_json::Value>;
}

pub async fn fetch_all<T, S>(store: &S, table: Table, query: &Query) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    S: DataStore + ?Sized,
{
    let rows = store.select(table, query).await?;
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(Into::into))
        .collect()
}

/// Reads every row matching `query`, one page of `page_size` rows at a time.
///
/// The query should carry an `order` so pages do not overlap.
pub async fn fetch_paged<T, S>(
    store: &S,
    table: Table,
    query: &Query,
    page_size: usize,
) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    S: DataStore + ?Sized,
{
    let page_size = page_size.max(1);
    let mut rows = Vec::new();
    loop {
        let page_query = query.clone().limit(page_size).offset(rows.len());
        let page: Vec<T> = fetch_all(store, table, &page_query).await?;
        let last_page = page.len() < page_size;
        rows.extend(page);
        if last_page {
            break;
        }
        tracing::debug!("Fetched {} rows from {} so far, reading next page", rows.len(), table);
    }
    Ok(rows)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: Table,
    pub rows: usize,
}

/// An active watch. Dropping it stops every task feeding the receiver.
pub struct Subscription {
    receiver: mpsc::Receiver<ChangeEvent>,
    tasks: Vec<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(receiver: mpsc::Receiver<ChangeEvent>, tasks: Vec<JoinHandle<()>>) -> Self {
        Self { receiver, tasks }
    }

    /// 等待下一個變更事件；來源關閉時回傳 `None`
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        self.receiver.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

pub trait ChangeSource: Send + Sync {
    fn subscribe(&self, tables: &[Table]) -> Subscription;
}
