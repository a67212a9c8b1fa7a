use crate::domain::model::Table;
use crate::domain::ports::{ChangeEvent, ChangeSource, DataStore, Direction, Query, Subscription};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const CHANNEL_CAPACITY: usize = 32;

/// Change source that re-reads each watched table on an interval and reports differences.
pub struct PollingWatcher<S: DataStore + 'static> {
    store: Arc<S>,
    interval: Duration,
}

impl<S: DataStore + 'static> PollingWatcher<S> {
    pub fn new(store: Arc<S>, interval: Duration) -> Self {
        Self { store, interval }
    }
}

fn fingerprint(rows: &[serde_json::Value]) -> u64 {
    let mut hasher = DefaultHasher::new();
    rows.len().hash(&mut hasher);
    for row in rows {
        row.to_string().hash(&mut hasher);
    }
    hasher.finish()
}

async fn poll_table<S: DataStore + ?Sized>(
    store: Arc<S>,
    table: Table,
    interval: Duration,
    sender: mpsc::Sender<ChangeEvent>,
) {
    // 固定排序，避免同樣的資料因回傳順序不同而被視為變更
    let query = Query::default().order_by("id", Direction::Ascending);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut last: Option<u64> = None;

    loop {
        ticker.tick().await;
        let rows = match store.select(table, &query).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!("⚠️ Polling {} failed: {}", table, e);
                continue;
            }
        };

        let current = fingerprint(&rows);
        // 第一次輪詢只建立基準，不發事件
        if last.is_some_and(|previous| previous != current) {
            tracing::info!("🔔 Change detected in {} ({} rows)", table, rows.len());
            let event = ChangeEvent {
                table,
                rows: rows.len(),
            };
            if sender.send(event).await.is_err() {
                tracing::debug!("Subscriber for {} went away, stopping poller", table);
                return;
            }
        }
        last = Some(current);
    }
}

impl<S: DataStore + 'static> ChangeSource for PollingWatcher<S> {
    fn subscribe(&self, tables: &[Table]) -> Subscription {
        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let tasks = tables
            .iter()
            .map(|&table| {
                tracing::debug!("Watching {} every {:?}", table, self.interval);
                tokio::spawn(poll_table(
                    Arc::clone(&self.store),
                    table,
                    self.interval,
                    sender.clone(),
                ))
            })
            .collect();
        Subscription::new(receiver, tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::RowId;
    use crate::utils::error::Result;
    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::Mutex;

    /// 只支援 select 的記憶體資料表
    struct MockStore {
        rows: Mutex<Vec<serde_json::Value>>,
        queries: Mutex<Vec<Query>>,
    }

    impl MockStore {
        fn new(rows: Vec<serde_json::Value>) -> Self {
            Self {
                rows: Mutex::new(rows),
                queries: Mutex::new(Vec::new()),
            }
        }

        async fn push(&self, row: serde_json::Value) {
            self.rows.lock().await.push(row);
        }
    }

    #[async_trait]
    impl DataStore for MockStore {
        async fn select(&self, _table: Table, query: &Query) -> Result<Vec<serde_json::Value>> {
            self.queries.lock().await.push(query.clone());
            Ok(self.rows.lock().await.clone())
        }

        async fn insert(&self, _table: Table, row: serde_json::Value) -> Result<()> {
            self.push(row).await;
            Ok(())
        }

        async fn update(&self, _table: Table, _id: RowId, _patch: serde_json::Value) -> Result<()> {
            Ok(())
        }

        async fn delete(&self, _table: Table, _id: RowId) -> Result<()> {
            Ok(())
        }

        async fn rpc(&self, _function: &str, _args: serde_json::Value) -> Result<serde_json::Value> {
            Ok(json!([]))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_event_without_change() {
        let store = Arc::new(MockStore::new(vec![json!({"id": 1})]));
        let watcher = PollingWatcher::new(store, Duration::from_secs(1));
        let mut subscription = watcher.subscribe(&[Table::Penalties]);

        let waited =
            tokio::time::timeout(Duration::from_secs(10), subscription.next()).await;
        assert!(waited.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_in_stable_id_order() {
        let store = Arc::new(MockStore::new(vec![json!({"id": 1})]));
        let watcher = PollingWatcher::new(Arc::clone(&store), Duration::from_secs(1));
        let _subscription = watcher.subscribe(&[Table::ChargingStations]);

        tokio::time::sleep(Duration::from_millis(2500)).await;

        let queries = store.queries.lock().await;
        assert!(!queries.is_empty());
        assert!(queries
            .iter()
            .all(|q| q.order == Some(crate::domain::ports::Order {
                column: "id".to_string(),
                direction: Direction::Ascending,
            })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_after_row_added() {
        let store = Arc::new(MockStore::new(vec![json!({"id": 1})]));
        let watcher = PollingWatcher::new(Arc::clone(&store), Duration::from_secs(1));
        let mut subscription = watcher.subscribe(&[Table::Reservations]);

        // 讓第一次輪詢建立基準
        tokio::time::sleep(Duration::from_millis(1500)).await;
        store.push(json!({"id": 2})).await;

        let event = tokio::time::timeout(Duration::from_secs(5), subscription.next())
            .await
            .expect("change event")
            .expect("open channel");
        assert_eq!(
            event,
            ChangeEvent {
                table: Table::Reservations,
                rows: 2
            }
        );
    }

    #[test]
    fn test_fingerprint_sensitive_to_content() {
        let a = vec![json!({"id": 1, "status": "paid"})];
        let b = vec![json!({"id": 1, "status": "unpaid"})];
        assert_ne!(fingerprint(&a), fingerprint(&b));
        assert_eq!(fingerprint(&a), fingerprint(&a.clone()));
    }
}
