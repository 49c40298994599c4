//! The user table: phone, registration time, and one toggle per role.
//!
use chrono::{DateTime, Local, TimeZone, Utc};
use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Row, Table};

use crate::app::AppState;
use crate::service::{RoleRecord, UserRecord};

pub const HEADERS: [&str; 3] = ["手机号", "注册时间", "角色"];

/// Registration time in the operator's local zone.
pub fn format_timestamp<Tz: TimeZone>(ts: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    ts.with_timezone(tz).format("%Y/%m/%d %H:%M:%S").to_string()
}

/// One `[x] name` toggle per known role; `focus` marks the toggle under the cursor.
pub fn role_toggles<'a>(
    user: &UserRecord,
    roles: &'a [RoleRecord],
    focus: Option<usize>,
    app: &AppState,
) -> Line<'a> {
    let mut spans = Vec::with_capacity(roles.len() * 2);
    for (i, role) in roles.iter().enumerate() {
        let checked = user.has_role(&role.name);
        let mut style = if checked {
            Style::default().fg(app.theme.role_on)
        } else {
            Style::default().fg(app.theme.text)
        };
        if focus == Some(i) {
            style = style.add_modifier(Modifier::REVERSED);
        }
        let mark = if checked { "[x]" } else { "[ ]" };
        spans.push(Span::styled(format!("{mark} {}", role.name), style));
        spans.push(Span::raw("  "));
    }
    spans.pop();
    Line::from(spans)
}

/// Render the table for the page of rows around the selection. The
/// block's bottom title is the load-more footer.
pub fn render_users_table(f: &mut Frame, area: Rect, app: &mut AppState) {
    // borders + header row
    let body_height = area.height.saturating_sub(3) as usize;
    if body_height > 0 {
        app.rows_per_page = body_height;
    }

    let users = app.view.users();
    let roles = app.view.roles();
    let start = (app.selected_user_index / app.rows_per_page) * app.rows_per_page;
    let end = (start + app.rows_per_page).min(users.len());
    let slice = &users[start.min(end)..end];

    let rows = slice.iter().enumerate().map(|(i, u)| {
        let absolute_index = start + i;
        let selected = absolute_index == app.selected_user_index;
        let style = if selected {
            Style::default()
                .fg(app.theme.highlight_fg)
                .bg(app.theme.highlight_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.text)
        };
        let focus = selected.then_some(app.selected_role_index);
        Row::new(vec![
            Cell::from(u.mobile_phone_number.clone()),
            Cell::from(format_timestamp(&u.created_at, &Local)),
            Cell::from(role_toggles(u, roles, focus, app)),
        ])
        .style(style)
    });

    let widths = [
        Constraint::Length(16),
        Constraint::Length(21),
        Constraint::Min(20),
    ];

    let header = Row::new(HEADERS.to_vec())
        .style(Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD));

    let title = format!("用户 ({})", users.len());
    let footer = Span::styled(app.view.footer_text(), Style::default().fg(app.theme.muted));
    let footer = Line::from(footer).centered();

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_bottom(footer)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .column_spacing(1);

    f.render_widget(table, area);
}
