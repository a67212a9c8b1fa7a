use crate::domain::forms::{next_penalty_status, Form, Submission};
use crate::domain::model::{Penalty, PenaltyStatus, RowId, Table};
use crate::domain::ports::{DataStore, Query};
use crate::utils::error::{AdminError, Result};
use serde::de::DeserializeOwned;

/// 驗證表單後送出：新增或更新
pub async fn submit<F, S>(store: &S, submission: Submission<F>) -> Result<()>
where
    F: Form,
    S: DataStore + ?Sized,
{
    submission.form().validate()?;
    match submission {
        Submission::Create(form) => store.insert(F::TABLE, form.to_row()?).await,
        Submission::Update { id, form } => store.update(F::TABLE, id, form.to_row()?).await,
    }
}

pub async fn delete_row<S: DataStore + ?Sized>(store: &S, table: Table, id: RowId) -> Result<()> {
    store.delete(table, id).await
}

/// Loads the current row so an edit starts from what the store holds.
pub async fn find_row<T, S>(store: &S, table: Table, id: RowId) -> Result<T>
where
    T: DeserializeOwned,
    S: DataStore + ?Sized,
{
    let query = Query::default().eq("id", id).limit(1);
    let rows: Vec<serde_json::Value> = store.select(table, &query).await?;
    let row = rows
        .into_iter()
        .find(|row| row.get("id").and_then(|v| v.as_i64()) == Some(id))
        .ok_or_else(|| AdminError::NotFound {
            table: table.name().to_string(),
            id,
        })?;
    Ok(serde_json::from_value(row)?)
}

pub async fn toggle_penalty<S: DataStore + ?Sized>(store: &S, id: RowId) -> Result<PenaltyStatus> {
    let penalty: Penalty = find_row(store, Table::Penalties, id).await?;
    let status = next_penalty_status(&penalty);
    store
        .update(
            Table::Penalties,
            id,
            serde_json::json!({ "status": status.as_str() }),
        )
        .await?;
    tracing::info!("💱 Penalty {} is now {}", id, status);
    Ok(status)
}
