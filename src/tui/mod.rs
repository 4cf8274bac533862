pub mod render;
pub mod rows;
pub mod state;

use crate::api::FetchError;
use crate::listing::{Applied, DetailSource, FetchListController, Identified, VisibilitySentinel};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use rows::ListRow;
use state::ViewState;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

type DetailResult<T> = (<T as Identified>::Id, Result<T, FetchError>);

/// What a key press asks the loop to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCommand {
    Quit,
    Up(usize),
    Down(usize),
    Top,
    Bottom,
    Retry,
    Refresh,
    OpenFilter,
    ClearFilter,
    OpenDetail,
    CloseDetail,
}

/// Everything the list browser needs, wired by `main`.
pub struct ListView<T: Identified> {
    pub controller: FetchListController<T>,
    pub details: Arc<dyn DetailSource<T>>,
    pub sentinel: VisibilitySentinel,
    pub view: ViewState<T>,
    pub tick: Duration,
}

/// Run the list browser until the user quits. The controller is unmounted on
/// the way out so late responses never touch it.
pub async fn run_tui<T>(list_view: ListView<T>) -> Result<()>
where
    T: ListRow + Clone + Send + 'static,
{
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = tui_loop(&mut terminal, list_view).await;

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

async fn tui_loop<T>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    list_view: ListView<T>,
) -> Result<()>
where
    T: ListRow + Clone + Send + 'static,
{
    let ListView {
        mut controller,
        details,
        mut sentinel,
        mut view,
        tick,
    } = list_view;
    let (detail_tx, mut detail_rx) = mpsc::unbounded_channel::<DetailResult<T>>();
    let mut spinner_frame: u8 = 0;

    sentinel.observe();

    loop {
        for applied in controller.drain_ready() {
            if let Applied::Appended { .. } = applied {
                sentinel.rearm();
            }
            if applied == Applied::Failed {
                if let Some(e) = controller.state().error() {
                    view.push_log("ERROR", e.to_string());
                    if e.is_unauthorized() {
                        view.push_log("WARN", "session rejected; clear BIZBOOKER_TOKEN in .env and log in again".to_string());
                    }
                }
            }
        }
        while let Ok((id, result)) = detail_rx.try_recv() {
            if let Ok(item) = &result {
                controller.update_item(item.clone());
            }
            if let Err(e) = &result {
                tracing::warn!(id = %id, error = %e, "detail fetch failed");
            }
            view.detail_arrived(&id, result.map_err(|e| e.user_message()));
        }

        let total = controller.state().items().len();
        view.ensure_visible(total);
        terminal.draw(|f| render::draw(f, controller.state(), &mut view, spinner_frame))?;

        if let Some(true) = sentinel.check(view.viewport(total)) {
            controller.on_sentinel_visible();
        }

        if event::poll(tick)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if view.input.is_some() {
                    handle_filter_input(key, &mut controller, &mut view, &mut sentinel);
                    continue;
                }
                let Some(cmd) = map_key(key.code, view.detail.is_some()) else { continue };
                match cmd {
                    ViewCommand::Quit => {
                        controller.unmount();
                        sentinel.disconnect();
                        return Ok(());
                    }
                    ViewCommand::Up(n) => view.move_selection(-(n as isize), total),
                    ViewCommand::Down(n) => view.move_selection(n as isize, total),
                    ViewCommand::Top => view.select_first(),
                    ViewCommand::Bottom => view.select_last(total),
                    ViewCommand::Retry => {
                        if controller.state().error().is_some() {
                            view.push_log("INFO", "retrying".to_string());
                            controller.retry();
                        }
                    }
                    ViewCommand::Refresh => {
                        let filters = controller.state().filters().clone();
                        view.rewind();
                        sentinel.observe();
                        controller.reset(filters);
                    }
                    ViewCommand::OpenFilter => {
                        let current = controller.state().filters().get(view.filter_key).unwrap_or("");
                        view.input = Some(current.to_string());
                    }
                    ViewCommand::ClearFilter => {
                        let mut filters = controller.state().filters().clone();
                        if filters.get(view.filter_key).is_some() {
                            filters.set(view.filter_key, None);
                            view.rewind();
                            sentinel.observe();
                            controller.reset(filters);
                        }
                    }
                    ViewCommand::OpenDetail => {
                        if let Some(item) = controller.state().items().get(view.selected).cloned() {
                            let id = item.id();
                            view.open_detail(item);
                            let details = details.clone();
                            let tx = detail_tx.clone();
                            tokio::spawn(async move {
                                let result = details.fetch_detail(&id).await;
                                let _ = tx.send((id, result));
                            });
                        }
                    }
                    ViewCommand::CloseDetail => view.detail = None,
                }
            }
        }

        spinner_frame = spinner_frame.wrapping_add(1);
        tokio::task::yield_now().await;
    }
}

fn handle_filter_input<T>(
    key: KeyEvent,
    controller: &mut FetchListController<T>,
    view: &mut ViewState<T>,
    sentinel: &mut VisibilitySentinel,
) where
    T: ListRow + Clone + Send + 'static,
{
    let Some(buf) = view.input.as_mut() else { return };
    match key.code {
        KeyCode::Char(c) => buf.push(c),
        KeyCode::Backspace => {
            buf.pop();
        }
        KeyCode::Esc => view.input = None,
        KeyCode::Enter => {
            let value = buf.clone();
            view.input = None;
            let mut filters = controller.state().filters().clone();
            filters.set(view.filter_key, Some(value.as_str()));
            if &filters != controller.state().filters() {
                view.push_log("INFO", format!("filter {}", filters.summary()));
                view.rewind();
                sentinel.observe();
                controller.reset(filters);
            }
        }
        _ => {}
    }
}

/// Key bindings outside the filter prompt.
pub fn map_key(code: KeyCode, detail_open: bool) -> Option<ViewCommand> {
    let cmd = match code {
        KeyCode::Char('q') => ViewCommand::Quit,
        KeyCode::Esc if detail_open => ViewCommand::CloseDetail,
        KeyCode::Esc => ViewCommand::Quit,
        KeyCode::Char('k') | KeyCode::Up => ViewCommand::Up(1),
        KeyCode::Char('j') | KeyCode::Down => ViewCommand::Down(1),
        KeyCode::PageUp => ViewCommand::Up(10),
        KeyCode::PageDown => ViewCommand::Down(10),
        KeyCode::Char('g') | KeyCode::Home => ViewCommand::Top,
        KeyCode::Char('G') | KeyCode::End => ViewCommand::Bottom,
        KeyCode::Char('r') => ViewCommand::Retry,
        KeyCode::Char('R') => ViewCommand::Refresh,
        KeyCode::Char('/') => ViewCommand::OpenFilter,
        KeyCode::Char('x') => ViewCommand::ClearFilter,
        KeyCode::Enter => ViewCommand::OpenDetail,
        _ => return None,
    };
    Some(cmd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_closes_detail_before_quitting() {
        assert_eq!(map_key(KeyCode::Esc, true), Some(ViewCommand::CloseDetail));
        assert_eq!(map_key(KeyCode::Esc, false), Some(ViewCommand::Quit));
    }

    #[test]
    fn test_scroll_bindings() {
        assert_eq!(map_key(KeyCode::Char('j'), false), Some(ViewCommand::Down(1)));
        assert_eq!(map_key(KeyCode::PageUp, false), Some(ViewCommand::Up(10)));
        assert_eq!(map_key(KeyCode::Char('G'), false), Some(ViewCommand::Bottom));
        assert_eq!(map_key(KeyCode::Char('z'), false), None);
    }

    #[test]
    fn test_retry_and_refresh_are_distinct() {
        assert_eq!(map_key(KeyCode::Char('r'), false), Some(ViewCommand::Retry));
        assert_eq!(map_key(KeyCode::Char('R'), false), Some(ViewCommand::Refresh));
    }
}
