pub mod components;
pub mod users;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{AppState, InputMode};

/// Title shown in the header block.
pub const TITLE: &str = "用户管理";
/// Label of the search form's submit action.
pub const SEARCH_LABEL: &str = "搜索";

pub fn render(f: &mut Frame, app: &mut AppState) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_header(f, root[0], app);
    users::render_users_table(f, root[1], app);
    components::render_status_bar(f, root[2], app);

    if app.view.state().loading {
        components::render_spinner(f, root[1], app);
    }
    if let Some(modal) = app.modal.clone() {
        let area = f.area();
        components::render_modal(f, area, app, &modal);
    }
}

/// Title on the left, the inline phone search form on the right.
fn render_header(f: &mut Frame, area: Rect, app: &AppState) {
    let block = Block::default()
        .title(TITLE)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border))
        .style(Style::default().fg(app.theme.header_fg).bg(app.theme.header_bg));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let form = match app.input_mode {
        InputMode::Search => Line::from(vec![
            Span::raw("手机号: "),
            Span::styled(
                format!("{}▏", app.search_query),
                Style::default()
                    .fg(app.theme.highlight_fg)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  [Enter] {SEARCH_LABEL}  [Esc] 取消"),
                Style::default().fg(app.theme.muted),
            ),
        ]),
        _ => {
            let active = match &app.view.state().filter {
                Some(f) => format!("手机号 = {}", f.phone),
                None => "全部用户".to_string(),
            };
            Line::from(vec![
                Span::raw(active),
                Span::styled(
                    format!("  [/] {SEARCH_LABEL}  [?] 帮助"),
                    Style::default().fg(app.theme.muted),
                ),
            ])
        }
    };
    f.render_widget(Paragraph::new(form).right_aligned(), inner);
}
