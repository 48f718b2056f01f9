//! Request form view: service and role pickers, submit button, department tree

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, HighlightSpacing, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::cli::tui::app::{App, Focus};
use crate::cli::tui::selector::TreeRow;
use crate::cli::tui::utils::{truncate_str, viewport_offset};

/// Draw the form layout
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),   // Main content
            Constraint::Length(3), // Status bar
        ])
        .split(area);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40), // Form fields
            Constraint::Percentage(60), // Department tree
        ])
        .split(main_chunks[0]);

    let form = app.form();
    let field_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(form.services().len() as u16 + 2),
            Constraint::Length(form.roles().len() as u16 + 2),
            Constraint::Length(3), // Submit button
            Constraint::Min(0),    // Feedback
        ])
        .split(content_chunks[0]);

    draw_services(frame, app, field_chunks[0]);
    draw_roles(frame, app, field_chunks[1]);
    draw_submit(frame, app, field_chunks[2]);
    draw_feedback(frame, app, field_chunks[3]);
    draw_tree(frame, app, content_chunks[1]);
    draw_status_bar(frame, app, main_chunks[1]);
}

fn panel(title: &str, focused: bool) -> Block<'_> {
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style)
}

fn draw_services(frame: &mut Frame, app: &App, area: Rect) {
    let form = app.form();
    let width = area.width.saturating_sub(6) as usize;

    let items: Vec<ListItem> = form
        .services()
        .iter()
        .map(|service| {
            if form.is_pending(&service.id) {
                ListItem::new(format!("{} (pending)", truncate_str(&service.name, width)))
                    .style(Style::default().fg(Color::DarkGray))
            } else {
                ListItem::new(truncate_str(&service.name, width))
            }
        })
        .collect();

    let selected = form
        .service_id()
        .and_then(|id| form.services().iter().position(|s| &s.id == id));

    let list = List::new(items)
        .block(panel("Service", app.focus() == Focus::Service))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD))
        .highlight_symbol("● ")
        .highlight_spacing(HighlightSpacing::Always);

    let mut state = ListState::default().with_selected(selected);
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_roles(frame: &mut Frame, app: &App, area: Rect) {
    let form = app.form();

    let items: Vec<ListItem> = form
        .roles()
        .iter()
        .map(|role| ListItem::new(role.name.as_str()))
        .collect();

    let selected = form
        .role_id()
        .and_then(|id| form.roles().iter().position(|r| &r.id == id));

    let list = List::new(items)
        .block(panel("Role", app.focus() == Focus::Role))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD))
        .highlight_symbol("● ")
        .highlight_spacing(HighlightSpacing::Always);

    let mut state = ListState::default().with_selected(selected);
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_submit(frame: &mut Frame, app: &App, area: Rect) {
    app.set_submit_area(area);
    let form = app.form();

    let style = if form.can_submit() {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let button = Paragraph::new(format!("[ {} ]", form.submit_label()))
        .style(style)
        .alignment(Alignment::Center)
        .block(panel("", app.focus() == Focus::Submit));

    frame.render_widget(button, area);
}

fn draw_feedback(frame: &mut Frame, app: &App, area: Rect) {
    let Some(message) = app.form().message() else {
        return;
    };

    let style = if message.is_error() {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Green)
    };

    let paragraph = Paragraph::new(message.text())
        .style(style)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn tree_item<'a>(row: &TreeRow<'a>) -> ListItem<'a> {
    let indent = " ".repeat(row.indent as usize);
    let line = Line::from(vec![
        Span::raw(indent),
        Span::styled(row.disclosure.symbol(), Style::default().fg(Color::Yellow)),
        Span::raw(row.node.name.as_str()),
    ]);

    if row.selected {
        ListItem::new(line).style(Style::default().fg(Color::Blue).bg(Color::LightCyan))
    } else {
        ListItem::new(line)
    }
}

fn draw_tree(frame: &mut Frame, app: &App, area: Rect) {
    app.set_tree_area(area);

    let form = app.form();
    let selector = app.selector();
    let rows = selector.rows(app.forest(), form.department_id());
    let items: Vec<ListItem> = rows.iter().map(tree_item).collect();

    let focused = app.focus() == Focus::Tree;
    let mut block = panel("Department", focused);
    if let Some(label) = form.selected_label(app.forest()) {
        block = block.title_bottom(Line::from(label).style(Style::default().fg(Color::Blue)));
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(if focused {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        })
        .highlight_symbol("> ")
        .highlight_spacing(HighlightSpacing::Always);

    let height = area.height.saturating_sub(2) as usize;
    let cursor = (!rows.is_empty()).then_some(selector.cursor());
    let mut state = ListState::default()
        .with_offset(viewport_offset(selector.cursor(), height))
        .with_selected(cursor);

    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let msg = app.status_message().unwrap_or(
        "[Tab]focus [j/k]move [Enter]select [o]pen/close [s]ubmit [x]clear [q]uit [?]help",
    );

    let status_text = format!("permit {}", msg);
    let paragraph = Paragraph::new(status_text).block(Block::default().borders(Borders::ALL));

    frame.render_widget(paragraph, area);
}
