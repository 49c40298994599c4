//! Event loop and input handling.
//!
//! Each iteration drains the worker (model events first, then replies),
//! draws a frame, and handles at most one terminal event. Key and mouse
//! handlers take the gateway as a parameter so they can be driven in tests.
use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind,
};
use ratatui::Terminal;
use ratatui::backend::Backend;
use std::time::Duration;

use super::edge::{self, Movement};
use super::keymap::KeyAction;
use super::view::{Edge, PageOutcome, UserGateway};
use super::worker::{WorkerLink, WorkerReply};
use super::{AppState, InputMode, ModalState};
use crate::search::apply_search;
use crate::ui;

/// Whether the loop keeps running after an input.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut AppState,
    link: &WorkerLink,
) -> Result<()> {
    app.view.mount(&link.worker);
    // The table starts empty, so its bottom edge is already in view.
    app.view.load_more(Edge::Bottom, &link.worker);

    loop {
        pump(app, link);

        terminal.draw(|f| {
            ui::render(f, app);
        })?;

        if event::poll(Duration::from_millis(100))? {
            let flow = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    handle_key(app, key, &link.worker)
                }
                Event::Mouse(mouse) => {
                    handle_mouse(app, mouse, &link.worker);
                    Flow::Continue
                }
                _ => Flow::Continue,
            };
            if flow == Flow::Quit {
                break;
            }
        }

        app.tick = app.tick.wrapping_add(1);
    }

    tracing::info!(uptime = ?app.started_at.elapsed(), "leaving event loop");
    Ok(())
}

/// Apply everything the worker has reported since the last frame.
pub fn pump(app: &mut AppState, link: &WorkerLink) {
    // Replies are collected before events so every list change a reply
    // depends on is observed before the reply is applied.
    let replies: Vec<WorkerReply> = link.replies.try_iter().collect();
    for ev in link.events.try_iter() {
        app.view.observe(ev);
    }
    for reply in replies {
        apply_reply(app, reply);
    }
    app.clamp_selection();
}

pub fn apply_reply(app: &mut AppState, reply: WorkerReply) {
    match reply {
        WorkerReply::PageSettled { ticket, outcome } => {
            if app.view.settle(ticket, &outcome)
                && let PageOutcome::Failed(message) = outcome
            {
                app.open_modal(ModalState::Error { message });
            }
        }
        WorkerReply::Failed { op, message } => {
            tracing::error!(op, %message, "background operation failed");
            app.open_modal(ModalState::Error {
                message: format!("{op}: {message}"),
            });
        }
    }
}

pub fn handle_key(app: &mut AppState, key: KeyEvent, gateway: &impl UserGateway) -> Flow {
    match app.input_mode {
        InputMode::Normal => {
            let Some(action) = app.keymap.resolve(&key) else {
                return Flow::Continue;
            };
            handle_action(app, action, gateway)
        }
        InputMode::Search => {
            match key.code {
                KeyCode::Enter => apply_search(app, gateway),
                KeyCode::Esc => {
                    app.input_mode = InputMode::Normal;
                    app.search_query.clear();
                }
                KeyCode::Backspace => {
                    app.search_query.pop();
                }
                KeyCode::Char(c) => app.search_query.push(c),
                _ => {}
            }
            Flow::Continue
        }
        InputMode::Modal => {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('?')
            ) {
                app.close_modal();
            }
            Flow::Continue
        }
    }
}

fn handle_action(app: &mut AppState, action: KeyAction, gateway: &impl UserGateway) -> Flow {
    let rows = app.view.users().len();
    let sel = app.selected_user_index;
    let page = app.rows_per_page.max(1) as isize;
    match action {
        KeyAction::Quit => return Flow::Quit,
        KeyAction::StartSearch => {
            app.search_query.clear();
            app.input_mode = InputMode::Search;
        }
        KeyAction::Refresh => {
            let phone = match &app.view.state().filter {
                Some(f) => f.phone.clone(),
                None => String::new(),
            };
            if app.view.search(&phone, gateway) {
                app.selected_user_index = 0;
            }
        }
        KeyAction::OpenHelp => app.open_modal(ModalState::Help),
        KeyAction::MoveUp => step(app, edge::move_selection(sel, rows, -1), gateway),
        KeyAction::MoveDown => step(app, edge::move_selection(sel, rows, 1), gateway),
        KeyAction::PageUp => step(app, edge::move_selection(sel, rows, -page), gateway),
        KeyAction::PageDown => step(app, edge::move_selection(sel, rows, page), gateway),
        KeyAction::First => step(app, edge::jump(rows, false), gateway),
        KeyAction::Last => step(app, edge::jump(rows, true), gateway),
        KeyAction::RoleLeft => {
            app.selected_role_index = app.selected_role_index.saturating_sub(1);
        }
        KeyAction::RoleRight => {
            let roles = app.view.roles().len();
            if app.selected_role_index + 1 < roles {
                app.selected_role_index += 1;
            }
        }
        KeyAction::ToggleRole => toggle_focused_role(app, gateway),
        KeyAction::Ignore => {}
    }
    Flow::Continue
}

fn step(app: &mut AppState, movement: Movement, gateway: &impl UserGateway) {
    app.selected_user_index = movement.index;
    if let Some(edge) = movement.edge {
        app.view.load_more(edge, gateway);
    }
}

/// Flip the focused toggle of the selected row. The checkbox's new state
/// is the opposite of the user's current membership.
fn toggle_focused_role(app: &mut AppState, gateway: &impl UserGateway) {
    let Some(user) = app.view.users().get(app.selected_user_index) else {
        return;
    };
    let Some(role) = app.view.roles().get(app.selected_role_index) else {
        return;
    };
    let checked = !user.has_role(&role.name);
    app.view.toggle_role(&user.id, &role.id, checked, gateway);
}

pub fn handle_mouse(app: &mut AppState, mouse: MouseEvent, gateway: &impl UserGateway) {
    if app.input_mode != InputMode::Normal {
        return;
    }
    let rows = app.view.users().len();
    let sel = app.selected_user_index;
    match mouse.kind {
        MouseEventKind::ScrollDown => step(app, edge::move_selection(sel, rows, 1), gateway),
        MouseEventKind::ScrollUp => step(app, edge::move_selection(sel, rows, -1), gateway),
        _ => {}
    }
}
