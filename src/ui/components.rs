//! Shared UI components: status bar, loading spinner, and popups.
//!
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::keymap::{KeyAction, format_action};
use crate::app::view::Phase;
use crate::app::{AppState, InputMode, ModalState};

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn spinner_frame(tick: usize) -> &'static str {
    SPINNER_FRAMES[tick % SPINNER_FRAMES.len()]
}

/// Render the bottom status bar with mode, phase and counts.
pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let mode = match app.input_mode {
        InputMode::Normal => "NORMAL",
        InputMode::Search => "SEARCH",
        InputMode::Modal => "MODAL",
    };
    let phase = match app.view.phase() {
        Phase::Idle => "idle",
        Phase::Loading => "loading",
        Phase::Exhausted => "exhausted",
    };
    let msg = format!(
        "mode: {mode}  {phase}  users:{}  roles:{}  row:{}  rows/page:{}",
        app.view.users().len(),
        app.view.roles().len(),
        app.selected_user_index + 1,
        app.rows_per_page,
    );
    let style = Style::default()
        .fg(app.theme.status_fg)
        .bg(app.theme.status_bg);
    f.render_widget(Paragraph::new(msg).style(style), area);
}

/// Dimmed overlay over the whole table while a page is loading; the rows
/// underneath are hidden until the page settles.
pub fn render_spinner(f: &mut Frame, area: Rect, app: &AppState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.muted))
        .style(Style::default().fg(app.theme.muted).bg(app.theme.status_bg));
    let inner = block.inner(area);
    f.render_widget(Clear, area);
    f.render_widget(block, area);

    let label = Paragraph::new(format!("{} 加载中...", spinner_frame(app.tick)))
        .centered()
        .style(
            Style::default()
                .fg(app.theme.highlight_fg)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(label, centered_rect(inner.width, 1, inner));
}

/// Compute a rectangle centered within `area` with a maximum size.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

pub fn render_modal(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    match state {
        ModalState::Help => render_help_modal(f, area, app),
        ModalState::Error { message } => {
            render_message_modal(f, area, app, "Error", message, app.theme.error)
        }
    }
}

fn render_message_modal(
    f: &mut Frame,
    area: Rect,
    app: &AppState,
    title: &str,
    message: &str,
    border: ratatui::style::Color,
) {
    // Wide enough for most backend errors; long text wraps
    let max_w = area.width.saturating_sub(6).max(30);
    let width = 60u16.min(max_w);
    let per_line = width.saturating_sub(4).max(10);
    let approx_lines = (message.chars().count() as u16 / per_line).max(1);
    let max_h = area.height.saturating_sub(6).max(5);
    let height = (approx_lines + 4).min(max_h).max(5);
    let rect = centered_rect(width, height, area);
    let hint = Style::default()
        .fg(app.theme.muted)
        .add_modifier(Modifier::ITALIC);
    let body = vec![
        Line::raw(message.to_string()),
        Line::raw(""),
        Line::from(Span::styled("Esc / Enter", hint)),
    ];
    let p = Paragraph::new(body).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(title.to_string())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

/// Help lists the configured keys for each action.
fn render_help_modal(f: &mut Frame, area: Rect, app: &AppState) {
    let entries = [
        (KeyAction::MoveDown, "下一行 (到底部时加载更多)"),
        (KeyAction::MoveUp, "上一行"),
        (KeyAction::PageDown, "下一页"),
        (KeyAction::PageUp, "上一页"),
        (KeyAction::First, "第一行"),
        (KeyAction::Last, "最后一行"),
        (KeyAction::RoleLeft, "上一个角色"),
        (KeyAction::RoleRight, "下一个角色"),
        (KeyAction::ToggleRole, "切换角色"),
        (KeyAction::StartSearch, "按手机号搜索"),
        (KeyAction::Refresh, "刷新"),
        (KeyAction::Quit, "退出"),
    ];
    let mut lines = Vec::with_capacity(entries.len() + 2);
    for (action, label) in entries {
        let keys = app.keymap.keys_for(action).join(", ");
        let name = format!("{:>12}  ", format_action(action));
        lines.push(Line::from(vec![
            Span::styled(name, Style::default().fg(app.theme.title)),
            Span::styled(keys, Style::default().add_modifier(Modifier::ITALIC)),
            Span::raw(format!("  {label}")),
        ]));
    }
    lines.push(Line::raw(""));
    let hint = Span::styled("Esc / Enter", Style::default().fg(app.theme.muted));
    lines.push(Line::from(hint));

    let width = 64u16.min(area.width.saturating_sub(4)).max(40);
    let height = (lines.len() as u16 + 2).min(area.height);
    let rect = centered_rect(width, height, area);
    let p = Paragraph::new(lines).block(
        Block::default()
            .title("Help")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}
