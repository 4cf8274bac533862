use super::query::Filters;
use super::state::{Applied, FetchRequest, ListState, Phase};
use super::{Identified, ListPage, PageSource};
use crate::api::error::FetchError;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A finished fetch, tagged with the generation it was issued under.
pub struct Completion<T> {
    pub generation: u64,
    pub result: Result<ListPage<T>, FetchError>,
}

/// Drives a [`ListState`] against a [`PageSource`].
///
/// Fetches run as spawned tasks and report back over a channel; state is only
/// touched by whoever owns the controller, when it calls [`Self::next_completion`]
/// or [`Self::drain_ready`].
pub struct FetchListController<T: Identified> {
    state: ListState<T>,
    source: Arc<dyn PageSource<T>>,
    tx: mpsc::UnboundedSender<Completion<T>>,
    rx: mpsc::UnboundedReceiver<Completion<T>>,
    tasks: Vec<JoinHandle<()>>,
}

impl<T> FetchListController<T>
where
    T: Identified + Send + 'static,
{
    pub fn new(source: Arc<dyn PageSource<T>>, page_size: u32) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state: ListState::new(page_size),
            source,
            tx,
            rx,
            tasks: Vec::new(),
        }
    }

    pub fn state(&self) -> &ListState<T> {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn reset(&mut self, filters: Filters) {
        tracing::debug!(filters = %filters.summary(), "listing reset");
        let req = self.state.reset(filters);
        self.dispatch(req);
    }

    pub fn load_next_page(&mut self) {
        let req = self.state.load_next_page();
        self.dispatch(req);
    }

    pub fn on_sentinel_visible(&mut self) {
        let req = self.state.sentinel_visible();
        self.dispatch(req);
    }

    pub fn retry(&mut self) {
        let req = self.state.retry();
        self.dispatch(req);
    }

    /// Apply a detail refresh to the listed copy of the item.
    pub fn update_item(&mut self, item: T) -> bool {
        self.state.update_item(item)
    }

    /// Stop applying results and abort whatever is still running.
    pub fn unmount(&mut self) {
        self.state.unmount();
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.rx.close();
    }

    /// Wait for the next completion and apply it. `None` once unmounted.
    pub async fn next_completion(&mut self) -> Option<Applied> {
        if !self.state.is_mounted() {
            return None;
        }
        let completion = self.rx.recv().await?;
        Some(self.apply(completion))
    }

    /// Apply every completion that has already arrived, without waiting.
    pub fn drain_ready(&mut self) -> Vec<Applied> {
        let mut applied = Vec::new();
        if !self.state.is_mounted() {
            return applied;
        }
        while let Ok(completion) = self.rx.try_recv() {
            applied.push(self.apply(completion));
        }
        applied
    }

    /// Wait until the current generation's fetch has landed.
    pub async fn settle(&mut self) -> Phase {
        while self.state.is_loading() {
            if self.next_completion().await.is_none() {
                break;
            }
        }
        self.state.phase()
    }

    /// Walk the listing to its last page (or first error).
    pub async fn load_all(&mut self) -> Phase {
        loop {
            match self.settle().await {
                Phase::Loaded | Phase::Idle => self.load_next_page(),
                phase => return phase,
            }
        }
    }

    fn apply(&mut self, completion: Completion<T>) -> Applied {
        let generation = completion.generation;
        let applied = match completion.result {
            Ok(page) => self.state.page_arrived(generation, page),
            Err(e) => {
                let applied = self.state.page_failed(generation, e.clone());
                if applied == Applied::Failed {
                    tracing::warn!(page = self.state.page_index(), error = %e, "page fetch failed");
                }
                applied
            }
        };
        match applied {
            Applied::Appended { added, duplicates } => {
                tracing::debug!(
                    page = self.state.page_index(),
                    added,
                    duplicates,
                    has_more = self.state.has_more(),
                    "page applied"
                );
            }
            Applied::Stale => {
                tracing::debug!(generation, current = self.state.generation(), "discarded stale page");
            }
            Applied::Failed => {}
        }
        applied
    }

    fn dispatch(&mut self, req: Option<FetchRequest>) {
        let Some(req) = req else { return };
        self.tasks.retain(|t| !t.is_finished());

        tracing::debug!(
            generation = req.generation,
            page = req.page_index,
            size = req.page_size,
            "fetching page"
        );
        let source = self.source.clone();
        let tx = self.tx.clone();
        let (generation, page_index) = (req.generation, req.page_index);
        let handle = tokio::spawn(async move {
            // Inner task so a panicking source still reports a completion.
            let mut fetch = AbortOnDrop(tokio::spawn(async move {
                source
                    .fetch_page(req.page_index, req.page_size, &req.filters)
                    .await
            }));
            let result = match (&mut fetch.0).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(page = page_index, error = %e, "page fetch task died");
                    Err(FetchError::Transport(format!("page fetch failed: {}", e)))
                }
            };
            // receiver gone means the view unmounted
            let _ = tx.send(Completion { generation, result });
        });
        self.tasks.push(handle);
    }
}

/// Aborts the wrapped task when dropped, so aborting the outer task also
/// cancels the request it is waiting on.
struct AbortOnDrop<R>(JoinHandle<R>);

impl<R> Drop for AbortOnDrop<R> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl<T: Identified> Drop for FetchListController<T> {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
