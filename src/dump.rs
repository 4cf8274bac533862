use crate::listing::{FetchListController, Filters, Phase};
use crate::tui::rows::ListRow;
use anyhow::Result;
use std::io::Write;

/// Walk a listing to its last page and write it as a pipe-separated table.
/// Rows loaded before a failure are still written before the error is returned.
pub async fn dump<T, W>(
    controller: &mut FetchListController<T>,
    filters: Filters,
    out: &mut W,
) -> Result<usize>
where
    T: ListRow + Send + 'static,
    W: Write,
{
    controller.reset(filters);
    let phase = controller.load_all().await;

    let state = controller.state();
    let header: Vec<&str> = T::columns().into_iter().map(|(name, _)| name).collect();
    writeln!(out, "{}", header.join(" | "))?;
    for item in state.items() {
        writeln!(out, "{}", item.cells().join(" | "))?;
    }

    match phase {
        Phase::Empty => writeln!(out, "No results")?,
        Phase::Errored => {
            let error = state
                .error()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string());
            anyhow::bail!(
                "listing stopped after {} items (page {}): {}",
                state.items().len(),
                state.page_index() + 1,
                error
            );
        }
        _ => {}
    }
    Ok(state.items().len())
}
