use crate::app::pages::{render_page, Page, PageOptions};
use crate::domain::ports::{ChangeSource, DataStore};
use crate::utils::error::Result;
use std::future::Future;

/// Refresh loop: render once, then re-fetch and re-render on every change event.
///
/// Returns the number of renders once `shutdown` resolves or the change source closes.
/// A failed refresh is logged and the previous output stays on screen.
pub async fn watch_page<S, C, F>(
    store: &S,
    source: &C,
    page: Page,
    options: &PageOptions,
    shutdown: impl Future<Output = ()>,
    mut output: F,
) -> Result<usize>
where
    S: DataStore + ?Sized,
    C: ChangeSource + ?Sized,
    F: FnMut(&str),
{
    output(&render_page(store, page, options).await?);
    let mut renders = 1;

    let mut subscription = source.subscribe(page.tables());
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("👋 Stopping watch on {:?}", page);
                break;
            }
            event = subscription.next() => {
                let Some(event) = event else {
                    tracing::warn!("Change source closed, leaving watch mode");
                    break;
                };
                tracing::debug!("Refreshing {:?} after change in {}", page, event.table);
                match render_page(store, page, options).await {
                    Ok(rendered) => {
                        output(&rendered);
                        renders += 1;
                    }
                    Err(e) => tracing::warn!("⚠️ Refresh of {:?} failed: {}", page, e),
                }
            }
        }
    }

    Ok(renders)
}
