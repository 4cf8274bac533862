use std::borrow::Cow;

use super::rows::ListRow;
use super::state::ViewState;
use crate::listing::{ListState, Phase};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};

const SPINNER_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

pub fn draw<T: ListRow + Clone>(
    f: &mut Frame,
    list: &ListState<T>,
    view: &mut ViewState<T>,
    spinner_frame: u8,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_header(f, list, view, chunks[0]);

    if view.detail.is_some() {
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);
        draw_list(f, list, view, body[0], spinner_frame);
        draw_detail(f, view, body[1], spinner_frame);
    } else {
        draw_list(f, list, view, chunks[1], spinner_frame);
    }

    draw_status(f, list, view, chunks[2], spinner_frame);
    draw_footer(f, view, chunks[3]);
}

fn spinner(frame: u8) -> char {
    SPINNER_FRAMES[(frame as usize) % SPINNER_FRAMES.len()]
}

fn draw_header<T: ListRow + Clone>(f: &mut Frame, list: &ListState<T>, view: &ViewState<T>, area: Rect) {
    let filters = list.filters();
    let filter_text = if filters.is_empty() {
        "no filters".to_string()
    } else {
        filters.summary()
    };
    let (phase_text, phase_color) = match list.phase() {
        Phase::Loading => ("loading", Color::Cyan),
        Phase::Loaded => ("more available", Color::Green),
        Phase::Exhausted => ("complete", Color::DarkGray),
        Phase::Empty => ("no results", Color::Yellow),
        Phase::Errored => ("error", Color::Red),
        Phase::Idle => ("idle", Color::DarkGray),
        Phase::Unmounted => ("closed", Color::DarkGray),
    };
    let line = Line::from(vec![
        Span::styled(" Items: ", Style::default().fg(Color::DarkGray)),
        Span::raw(list.items().len().to_string()),
        Span::styled(" | Pages: ", Style::default().fg(Color::DarkGray)),
        Span::raw(list.page_index().to_string()),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(phase_text, Style::default().fg(phase_color)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::raw(filter_text),
        Span::styled(format!(" | Up {}", view.uptime()), Style::default().fg(Color::DarkGray)),
    ]);
    let block = Block::default()
        .title(format!(" BizBooker \u{00b7} {} ", view.title))
        .borders(Borders::ALL);
    f.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_list<T: ListRow + Clone>(
    f: &mut Frame,
    list: &ListState<T>,
    view: &mut ViewState<T>,
    area: Rect,
    spinner_frame: u8,
) {
    // borders + header row
    view.list_height = area.height.saturating_sub(3) as usize;
    let block = Block::default().title(" Results ").borders(Borders::ALL);

    if list.items().is_empty() {
        let message = match list.phase() {
            Phase::Loading => Line::from(Span::styled(
                format!("{} Loading...", spinner(spinner_frame)),
                Style::default().fg(Color::Cyan),
            )),
            Phase::Empty => Line::from(Span::styled(
                "No results",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )),
            Phase::Errored => Line::from(Span::styled(
                "Could not load this list. Press [r] to retry.",
                Style::default().fg(Color::Red),
            )),
            _ => Line::from(Span::styled("Nothing loaded yet", Style::default().fg(Color::DarkGray))),
        };
        let para = Paragraph::new(vec![Line::from(""), message])
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(para, area);
        return;
    }

    let columns = T::columns();
    let widths: Vec<Constraint> = columns.iter().map(|(_, c)| *c).collect();
    let col_width = |i: usize| -> usize {
        match widths.get(i) {
            Some(Constraint::Length(n)) => *n as usize,
            _ => area.width.saturating_sub(2) as usize,
        }
    };
    let header = Row::new(columns.iter().map(|(name, _)| *name))
        .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = list
        .items()
        .iter()
        .enumerate()
        .skip(view.scroll_offset)
        .take(view.list_height)
        .map(|(idx, item)| {
            let cells: Vec<Cell> = item
                .cells()
                .into_iter()
                .enumerate()
                .map(|(i, text)| Cell::from(truncate_with_ellipsis(&text, col_width(i)).into_owned()))
                .collect();
            let style = if idx == view.selected {
                Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Row::new(cells).style(style)
        })
        .collect();

    let title = format!(
        " Results [{}-{} of {}{}] ",
        view.scroll_offset + 1,
        (view.scroll_offset + view.list_height).min(list.items().len()),
        list.items().len(),
        if list.has_more() { "+" } else { "" },
    );
    let table = Table::new(rows, widths.clone())
        .header(header)
        .block(block.title(title));
    f.render_widget(table, area);
}

fn draw_detail<T: ListRow + Clone>(f: &mut Frame, view: &ViewState<T>, area: Rect, spinner_frame: u8) {
    let Some(pane) = view.detail.as_ref() else { return };
    let label_width = 10;
    let mut lines: Vec<Line> = pane
        .item
        .detail()
        .into_iter()
        .map(|(label, value)| {
            Line::from(vec![
                Span::styled(format!("{:<label_width$}", label), Style::default().fg(Color::DarkGray)),
                Span::raw(value),
            ])
        })
        .collect();

    if pane.loading {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("{} refreshing...", spinner(spinner_frame)),
            Style::default().fg(Color::Cyan),
        )));
    }
    if let Some(err) = &pane.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(err.clone(), Style::default().fg(Color::Red))));
    }

    let block = Block::default().title(" Details ").borders(Borders::ALL);
    let para = Paragraph::new(lines).wrap(Wrap { trim: true }).block(block);
    f.render_widget(para, area);
}

fn draw_status<T: ListRow + Clone>(
    f: &mut Frame,
    list: &ListState<T>,
    view: &ViewState<T>,
    area: Rect,
    spinner_frame: u8,
) {
    let width = area.width as usize;
    let line = if let Some(input) = &view.input {
        Line::from(vec![
            Span::styled(format!(" {}: ", view.filter_key), Style::default().fg(Color::Yellow)),
            Span::raw(format!("{}_", input)),
        ])
    } else {
        match list.phase() {
            Phase::Loading => Line::from(Span::styled(
                format!(" {} Loading page {}...", spinner(spinner_frame), list.page_index() + 1),
                Style::default().fg(Color::Cyan),
            )),
            Phase::Errored => {
                let message = list
                    .error()
                    .map(|e| e.user_message())
                    .unwrap_or_default();
                Line::from(vec![
                    Span::styled(
                        format!(" Error: {} ", truncate_with_ellipsis(&message, width.saturating_sub(20))),
                        Style::default().fg(Color::Red),
                    ),
                    Span::styled("[r]", Style::default().fg(Color::Yellow)),
                    Span::raw("etry"),
                ])
            }
            Phase::Exhausted => Line::from(Span::styled(" End of list", Style::default().fg(Color::DarkGray))),
            Phase::Empty => Line::from(Span::styled(" No results", Style::default().fg(Color::Yellow))),
            Phase::Loaded => Line::from(Span::styled(
                " Scroll down for more",
                Style::default().fg(Color::DarkGray),
            )),
            Phase::Idle | Phase::Unmounted => match view.last_log() {
                Some(log) => Line::from(Span::styled(
                    format!(" {} [{}] {}", log.time, log.level, log.message),
                    Style::default().fg(Color::DarkGray),
                )),
                None => Line::from(""),
            },
        }
    };
    f.render_widget(Paragraph::new(line), area);
}

fn draw_footer<T: ListRow + Clone>(f: &mut Frame, view: &ViewState<T>, area: Rect) {
    let line = if view.input.is_some() {
        Line::from(vec![
            Span::styled("  [Enter]", Style::default().fg(Color::Yellow)),
            Span::raw(" apply  "),
            Span::styled("[Esc]", Style::default().fg(Color::Yellow)),
            Span::raw(" cancel  "),
        ])
    } else {
        Line::from(vec![
            Span::styled("  [q]", Style::default().fg(Color::Yellow)),
            Span::raw("uit  "),
            Span::styled("[j/k]", Style::default().fg(Color::Yellow)),
            Span::raw(" scroll  "),
            Span::styled("[g/G]", Style::default().fg(Color::Yellow)),
            Span::raw(" top/bottom  "),
            Span::styled("[/]", Style::default().fg(Color::Yellow)),
            Span::raw(format!(" {}  ", view.filter_key)),
            Span::styled("[x]", Style::default().fg(Color::Yellow)),
            Span::raw(" clear  "),
            Span::styled("[Enter]", Style::default().fg(Color::Yellow)),
            Span::raw(" details  "),
            Span::styled("[R]", Style::default().fg(Color::Yellow)),
            Span::raw("efresh  "),
        ])
    };
    f.render_widget(Paragraph::new(line), area);
}

fn truncate_with_ellipsis(s: &str, max_width: usize) -> Cow<'_, str> {
    let char_count = s.chars().count();
    if char_count <= max_width {
        Cow::Borrowed(s)
    } else if max_width <= 3 {
        Cow::Owned(".".repeat(max_width))
    } else {
        let end = s
            .char_indices()
            .nth(max_width - 3)
            .map(|(i, _)| i)
            .unwrap_or(s.len());
        Cow::Owned(format!("{}...", &s[..end]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("Glow Spa", 20), "Glow Spa");
        assert_eq!(truncate_with_ellipsis("Fade Masters Barbershop", 10), "Fade Ma...");
        assert_eq!(truncate_with_ellipsis("abcdef", 2), "..");
    }

    #[test]
    fn test_spinner_wraps() {
        assert_eq!(spinner(0), spinner(SPINNER_FRAMES.len() as u8));
    }
}
