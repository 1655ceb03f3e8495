use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::app::{FocusPane, NoteController, SessionState, ViewState};
use crate::config::{Palette, ThemeMode};
use crate::search::build_highlight_regex;

pub fn draw_app(
    frame: &mut Frame,
    controller: &NoteController,
    view: &ViewState,
    list_state: &mut ListState,
) {
    let palette = Palette::for_mode(controller.theme_mode().unwrap_or_default());
    let base = Style::default().fg(palette.foreground).bg(palette.background);
    frame.render_widget(Block::default().style(base), frame.size());

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(vertical[1]);

    let editor = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(columns[1]);

    let search = Paragraph::new(view.search.as_str()).block(pane_block(
        "Search",
        view.focus == FocusPane::Search,
        true,
        &palette,
    ));
    frame.render_widget(search, vertical[0]);

    draw_note_list(frame, controller, view, list_state, columns[0], &palette);

    let session = controller.session();
    let input_enabled = controller.input_enabled();
    let field_style = if input_enabled {
        base
    } else {
        base.fg(palette.disabled)
    };

    let title = Paragraph::new(session.title_field())
        .style(field_style)
        .block(pane_block(
            "Title",
            view.focus == FocusPane::Title,
            input_enabled,
            &palette,
        ));
    frame.render_widget(title, editor[0]);

    let body = Paragraph::new(session.text_field())
        .style(field_style)
        .wrap(Wrap { trim: false })
        .block(pane_block(
            "Note",
            view.focus == FocusPane::Body,
            input_enabled,
            &palette,
        ));
    frame.render_widget(body, editor[1]);

    let cursor = match view.focus {
        FocusPane::Search => text_cursor_position(&view.search, vertical[0], false),
        FocusPane::Title if input_enabled => {
            text_cursor_position(session.title_field(), editor[0], false)
        }
        FocusPane::Body if input_enabled => {
            text_cursor_position(session.text_field(), editor[1], true)
        }
        _ => None,
    };
    if let Some((x, y)) = cursor {
        frame.set_cursor(x, y);
    }

    let status = Paragraph::new(build_status_line(controller, &palette)).style(base);
    frame.render_widget(status, vertical[2]);
}

fn draw_note_list(
    frame: &mut Frame,
    controller: &NoteController,
    view: &ViewState,
    list_state: &mut ListState,
    area: Rect,
    palette: &Palette,
) {
    let store = controller.store();
    let highlight_regex = build_highlight_regex(store.query());
    let match_style = Style::default()
        .fg(palette.match_fg)
        .add_modifier(Modifier::BOLD);

    let mut items: Vec<ListItem> = store
        .filtered_notes()
        .map(|note| {
            let title = if note.title.is_empty() {
                "(untitled)"
            } else {
                note.title.as_str()
            };
            let title_line = Line::from(highlight_line(
                title,
                highlight_regex.as_ref(),
                match_style,
                Style::default().add_modifier(Modifier::BOLD),
            ));
            let date_line = Line::from(Span::styled(
                note.display_date().to_string(),
                Style::default().fg(palette.muted),
            ));
            ListItem::new(vec![title_line, date_line])
        })
        .collect();
    if items.is_empty() {
        let hint = if store.is_empty() {
            "No notes yet. Press Ctrl-n to create one."
        } else {
            "No notes match the search."
        };
        items.push(ListItem::new(Span::styled(
            hint,
            Style::default().fg(palette.muted),
        )));
    }

    let list = List::new(items)
        .block(pane_block(
            "Notes",
            view.focus == FocusPane::List,
            true,
            palette,
        ))
        .highlight_style(
            Style::default()
                .bg(palette.highlight_bg)
                .fg(palette.highlight_fg)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");
    frame.render_stateful_widget(list, area, list_state);
}

fn pane_block<'a>(title: &'a str, focused: bool, enabled: bool, palette: &Palette) -> Block<'a> {
    let border = if !enabled {
        Style::default().fg(palette.disabled)
    } else if focused {
        Style::default().fg(palette.accent)
    } else {
        Style::default().fg(palette.muted)
    };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border)
}

fn build_status_line(controller: &NoteController, palette: &Palette) -> Text<'static> {
    let store = controller.store();
    let session = controller.session();
    let state = match session.state() {
        SessionState::Idle => "idle",
        SessionState::Editing => "editing",
        SessionState::Dirty => "unsaved changes",
    };
    let save_style = if controller.save_enabled() {
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(palette.disabled)
    };
    let theme = match controller.theme_mode() {
        Some(ThemeMode::Dark) => "dark",
        Some(ThemeMode::Light) => "light",
        None => "default",
    };

    let spans = vec![
        Span::raw(format!(
            "Notes: {}/{} ",
            store.displayed_len(),
            store.len()
        )),
        Span::raw(" | Session: "),
        Span::styled(
            state.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        Span::styled("[Save]", save_style),
        Span::raw(format!(" | Theme: {theme}")),
    ];
    let keys = Line::from(Span::styled(
        "Ctrl-n new • Ctrl-s save • Ctrl-d delete • Ctrl-t theme • Tab focus • / search • q quit",
        Style::default().fg(palette.muted),
    ));
    Text::from(vec![Line::from(spans), keys])
}

fn highlight_line(
    text: &str,
    regex: Option<&Regex>,
    highlight_style: Style,
    base_style: Style,
) -> Vec<Span<'static>> {
    if let Some(re) = regex {
        let mut spans = Vec::new();
        let mut last = 0;
        for mat in re.find_iter(text) {
            if mat.start() > last {
                spans.push(Span::styled(
                    text[last..mat.start()].to_string(),
                    base_style,
                ));
            }
            spans.push(Span::styled(mat.as_str().to_string(), highlight_style));
            last = mat.end();
        }
        if last < text.len() {
            spans.push(Span::styled(text[last..].to_string(), base_style));
        }
        if spans.is_empty() {
            spans.push(Span::styled(text.to_string(), base_style));
        }
        spans
    } else {
        vec![Span::styled(text.to_string(), base_style)]
    }
}

/// Screen position just past the end of `text` inside a bordered `area`.
fn text_cursor_position(text: &str, area: Rect, wrap_enabled: bool) -> Option<(u16, u16)> {
    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);
    if inner_width == 0 || inner_height == 0 {
        return None;
    }

    let width_limit = inner_width as usize;
    let mut row = 0u16;
    let mut col = 0usize;
    for grapheme in text.graphemes(true) {
        if grapheme == "\n" || grapheme == "\r\n" {
            row += 1;
            col = 0;
            continue;
        }
        let glyph_width = UnicodeWidthStr::width(grapheme);
        if wrap_enabled && glyph_width > 0 && col + glyph_width > width_limit {
            row += 1;
            col = 0;
        }
        col += glyph_width;
    }

    let row = row.min(inner_height - 1);
    let col = col.min(width_limit - 1) as u16;
    Some((area.x + 1 + col, area.y + 1 + row))
}
