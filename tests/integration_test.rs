// Integration tests for user-admin

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use chrono::{TimeZone, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{Terminal, backend::TestBackend};
use user_admin::app::update::{apply_reply, handle_key, pump};
use user_admin::app::view::{
    Edge, FOOTER_EXHAUSTED, FOOTER_MORE, PageOutcome, Phase, Ticket, UserGateway,
};
use user_admin::app::worker::{self, WorkerReply};
use user_admin::app::{AppState, InputMode};
use user_admin::model::{ModelEvent, UserModel};
use user_admin::search::PhoneFilter;
use user_admin::service::memory::MemoryService;
use user_admin::service::{RoleRecord, UserRecord};
use user_admin::ui::render;

fn mk_user(id: &str, phone: &str, day: u32, roles: &[&str]) -> UserRecord {
    UserRecord {
        id: id.to_string(),
        mobile_phone_number: phone.to_string(),
        created_at: Utc.with_ymd_and_hms(2020, 3, day, 8, 0, 0).unwrap(),
        roles: roles.iter().map(|r| r.to_string()).collect::<BTreeSet<_>>(),
    }
}

fn roles() -> Vec<RoleRecord> {
    vec![
        RoleRecord {
            id: "r1".into(),
            name: "Admin".into(),
        },
        RoleRecord {
            id: "r2".into(),
            name: "Editor".into(),
        },
    ]
}

/// Runs every gateway call against a real model on the spot, records the
/// calls, and queues the replies a worker would have sent.
struct InlineGateway {
    model: RefCell<UserModel>,
    calls: RefCell<Vec<String>>,
    replies: RefCell<Vec<WorkerReply>>,
}

impl InlineGateway {
    fn new(users: Vec<UserRecord>, page_size: usize) -> (Self, Receiver<ModelEvent>) {
        let service = MemoryService::new(roles(), users);
        let mut model = UserModel::new(Box::new(service), page_size);
        let events = model.subscribe();
        let gw = Self {
            model: RefCell::new(model),
            calls: RefCell::new(Vec::new()),
            replies: RefCell::new(Vec::new()),
        };
        (gw, events)
    }

    fn page_calls(&self) -> usize {
        self.calls.borrow().iter().filter(|c| c.starts_with("page")).count()
    }
}

impl UserGateway for InlineGateway {
    fn get_roles(&self) {
        self.calls.borrow_mut().push("roles".into());
        self.model.borrow_mut().get_roles().unwrap();
    }

    fn get_next_page(&self, ticket: Ticket, filter: Option<PhoneFilter>) {
        let phone = filter.as_ref().map_or("", |f| f.phone.as_str());
        self.calls.borrow_mut().push(format!("page:{phone}"));
        let outcome = match self.model.borrow_mut().get_next_page(filter.as_ref()) {
            Ok(Some(page)) => PageOutcome::Loaded(page.len()),
            Ok(None) => PageOutcome::Empty,
            Err(e) => PageOutcome::Failed(e.to_string()),
        };
        self.replies.borrow_mut().push(WorkerReply::PageSettled { ticket, outcome });
    }

    fn clear(&self) {
        self.calls.borrow_mut().push("clear".into());
        self.model.borrow_mut().clear();
    }

    fn add_role(&self, user_id: &str, role_id: &str) {
        self.calls.borrow_mut().push(format!("add:{user_id}:{role_id}"));
        self.model.borrow_mut().add_role(user_id, role_id).unwrap();
    }

    fn remove_role(&self, user_id: &str, role_id: &str) {
        self.calls.borrow_mut().push(format!("remove:{user_id}:{role_id}"));
        self.model.borrow_mut().remove_role(user_id, role_id).unwrap();
    }
}

fn sync(app: &mut AppState, gw: &InlineGateway, events: &Receiver<ModelEvent>) {
    for ev in events.try_iter() {
        app.view.observe(ev);
    }
    let replies: Vec<WorkerReply> = gw.replies.borrow_mut().drain(..).collect();
    for r in replies {
        apply_reply(app, r);
    }
    app.clamp_selection();
}

fn press(app: &mut AppState, gw: &InlineGateway, code: KeyCode) {
    handle_key(app, KeyEvent::new(code, KeyModifiers::NONE), gw);
}

fn screen_text(terminal: &Terminal<TestBackend>) -> String {
    // Wide glyphs leave a blank cell behind them; drop spaces to match CJK text.
    terminal
        .backend()
        .buffer()
        .content()
        .iter()
        .map(|c| c.symbol())
        .collect::<String>()
        .replace(' ', "")
}

// 1) Two users loaded, next page empty: footer flips and further scrolling is a no-op
#[test]
fn exhausted_list_stops_fetching_and_says_so() {
    let users = vec![
        mk_user("u1", "13800000001", 1, &[]),
        mk_user("u2", "13800000002", 2, &[]),
    ];
    let (gw, events) = InlineGateway::new(users, 2);
    let mut app = AppState::default();
    app.view.mount(&gw);
    app.view.load_more(Edge::Bottom, &gw);
    sync(&mut app, &gw, &events);
    assert_eq!(app.view.users().len(), 2);
    assert_eq!(app.view.footer_text(), FOOTER_MORE);

    // moving onto the last row touches the bottom edge; the backend has nothing more
    press(&mut app, &gw, KeyCode::Down);
    sync(&mut app, &gw, &events);
    assert!(app.view.state().no_more);
    assert_eq!(app.view.phase(), Phase::Exhausted);
    assert_eq!(gw.page_calls(), 2);

    let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
    terminal.draw(|f| render(f, &mut app)).unwrap();
    assert!(screen_text(&terminal).contains(FOOTER_EXHAUSTED));

    press(&mut app, &gw, KeyCode::Down);
    press(&mut app, &gw, KeyCode::End);
    assert_eq!(gw.page_calls(), 2);
    assert!(gw.replies.borrow().is_empty());
}

// 2) Searching by phone clears the list, fetches once with the filter, and resets exhaustion
#[test]
fn phone_search_replaces_list() {
    let (gw, events) = InlineGateway::new(
        vec![
            mk_user("u1", "13800000001", 1, &[]),
            mk_user("u2", "13800000002", 2, &[]),
            mk_user("u3", "13800000000", 3, &["Admin"]),
        ],
        10,
    );
    let mut app = AppState::default();
    app.view.load_more(Edge::Bottom, &gw);
    sync(&mut app, &gw, &events);
    press(&mut app, &gw, KeyCode::End);
    sync(&mut app, &gw, &events);
    assert!(app.view.state().no_more);

    press(&mut app, &gw, KeyCode::Char('/'));
    for c in "13800000000".chars() {
        press(&mut app, &gw, KeyCode::Char(c));
    }
    press(&mut app, &gw, KeyCode::Enter);
    assert_eq!(app.input_mode, InputMode::Normal);
    sync(&mut app, &gw, &events);

    assert_eq!(app.view.state().filter, PhoneFilter::from_input("13800000000"));
    assert!(!app.view.state().no_more);
    assert_eq!(app.view.users().len(), 1);
    assert_eq!(app.view.users()[0].id, "u3");
    let calls = gw.calls.borrow().clone();
    assert_eq!(calls[calls.len() - 2..], ["clear", "page:13800000000"]);

    // an empty search lifts the filter
    press(&mut app, &gw, KeyCode::Char('/'));
    press(&mut app, &gw, KeyCode::Enter);
    sync(&mut app, &gw, &events);
    assert_eq!(app.view.state().filter, None);
    assert_eq!(app.view.users().len(), 3);
}

// 3) Toggling a role goes through the model and the row re-renders from its event
#[test]
fn role_toggle_round_trips_through_model() {
    let users = vec![mk_user("u1", "13800000001", 1, &["Editor"])];
    let (gw, events) = InlineGateway::new(users, 10);
    let mut app = AppState::default();
    app.view.mount(&gw);
    app.view.load_more(Edge::Bottom, &gw);
    sync(&mut app, &gw, &events);
    let before = app.view.state().clone();

    press(&mut app, &gw, KeyCode::Char(' '));
    sync(&mut app, &gw, &events);
    assert!(app.view.users()[0].has_role("Admin"));

    press(&mut app, &gw, KeyCode::Char('l'));
    press(&mut app, &gw, KeyCode::Char(' '));
    sync(&mut app, &gw, &events);
    assert!(!app.view.users()[0].has_role("Editor"));

    assert_eq!(app.view.state(), &before);
    let calls = gw.calls.borrow();
    assert_eq!(calls[calls.len() - 2..], ["add:u1:r1", "remove:u1:r2"]);

    let mut terminal = Terminal::new(TestBackend::new(100, 12)).unwrap();
    terminal.draw(|f| render(f, &mut app)).unwrap();
    let text = screen_text(&terminal);
    assert!(text.contains("[x]Admin"), "{text}");
    assert!(text.contains("[]Editor"), "{text}");
}

// 4) The threaded worker drives the same flow end to end
#[test]
fn worker_backed_session_loads_pages() {
    let users = (1..=5)
        .map(|d| mk_user(&format!("u{d}"), &format!("1380000000{d}"), d, &[]))
        .collect();
    let model = UserModel::new(Box::new(MemoryService::new(roles(), users)), 3);
    let link = worker::start(model);
    let mut app = AppState::default();

    app.view.mount(&link.worker);
    app.view.load_more(Edge::Bottom, &link.worker);
    wait_settled(&mut app, &link);
    assert_eq!(app.view.users().len(), 3);
    assert_eq!(app.view.roles().len(), 2);

    let end = KeyEvent::new(KeyCode::End, KeyModifiers::NONE);
    handle_key(&mut app, end, &link.worker);
    wait_settled(&mut app, &link);
    assert_eq!(app.view.users().len(), 5);
    assert!(!app.view.state().no_more);

    handle_key(&mut app, end, &link.worker);
    wait_settled(&mut app, &link);
    assert!(app.view.state().no_more);
}

fn wait_settled(app: &mut AppState, link: &worker::WorkerLink) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        pump(app, link);
        if !app.view.state().loading {
            break;
        }
        assert!(Instant::now() < deadline, "page never settled");
        std::thread::sleep(Duration::from_millis(5));
    }
    // role catalog arrives independently of the page
    while app.view.roles().is_empty() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
        pump(app, link);
    }
}

/// Accepts every call and never answers, so a page stays in flight.
struct Silent;

impl UserGateway for Silent {
    fn get_roles(&self) {}
    fn get_next_page(&self, _: Ticket, _: Option<PhoneFilter>) {}
    fn clear(&self) {}
    fn add_role(&self, _: &str, _: &str) {}
    fn remove_role(&self, _: &str, _: &str) {}
}

// 5) Loading overlay shows while a page is in flight
#[test]
fn spinner_overlay_while_loading() {
    let mut app = AppState::default();
    app.view.load_more(Edge::Bottom, &Silent);
    let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
    terminal.draw(|f| render(f, &mut app)).unwrap();
    assert!(screen_text(&terminal).contains("加载中"));
}

// 6) The overlay hides the rows already loaded, not just a box in the middle
#[test]
fn spinner_covers_loaded_rows() {
    let mut app = AppState::default();
    let users = vec![
        mk_user("u1", "13912345678", 1, &["Admin"]),
        mk_user("u2", "13987654321", 2, &[]),
    ];
    app.view.observe(ModelEvent::RolesChanged(roles()));
    app.view.observe(ModelEvent::ListChanged(users));

    let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
    terminal.draw(|f| render(f, &mut app)).unwrap();
    assert!(screen_text(&terminal).contains("13912345678"));

    app.view.load_more(Edge::Bottom, &Silent);
    terminal.draw(|f| render(f, &mut app)).unwrap();
    let text = screen_text(&terminal);
    assert!(text.contains("加载中"), "{text}");
    assert!(!text.contains("13912345678"), "{text}");
    assert!(!text.contains("13987654321"), "{text}");
}
