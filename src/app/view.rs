//! The admin view's pagination and search state machine.
//!
//! [`AdminView`] owns only transient state: the `loading`/`no_more` flags,
//! the active phone filter and the ticket of the page request in flight.
//! The users and roles it renders are snapshots received from the model.
//! All outbound work goes through a [`UserGateway`], so the state machine
//! can be driven without a backend.
use crate::model::ModelEvent;
use crate::search::PhoneFilter;
use crate::service::{RoleRecord, UserRecord};

/// Footer text while more pages may exist.
pub const FOOTER_MORE: &str = "加载更多...";
/// Footer text once the backend reported an empty page.
pub const FOOTER_EXHAUSTED: &str = "没有更多数据了";

/// Outbound operations the view issues. Implementations run them
/// asynchronously and report page completions back through [`AdminView::settle`].
pub trait UserGateway {
    fn get_roles(&self);
    fn get_next_page(&self, ticket: Ticket, filter: Option<PhoneFilter>);
    fn clear(&self);
    fn add_role(&self, user_id: &str, role_id: &str);
    fn remove_role(&self, user_id: &str, role_id: &str);
}

/// Identifies one page request; completions with any other ticket are stale.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(pub u64);

/// Boundary of the scrollable table that the cursor ran into.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Edge {
    Top,
    Bottom,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Exhausted,
}

/// Result of a page request as reported by the gateway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageOutcome {
    /// The page held this many users.
    Loaded(usize),
    Empty,
    Failed(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewState {
    pub loading: bool,
    pub no_more: bool,
    pub filter: Option<PhoneFilter>,
}

#[derive(Debug, Default)]
pub struct AdminView {
    state: ViewState,
    pending: Option<Ticket>,
    next_ticket: u64,
    users: Vec<UserRecord>,
    roles: Vec<RoleRecord>,
}

impl AdminView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn users(&self) -> &[UserRecord] {
        &self.users
    }

    pub fn roles(&self) -> &[RoleRecord] {
        &self.roles
    }

    pub fn phase(&self) -> Phase {
        if self.state.loading {
            Phase::Loading
        } else if self.state.no_more {
            Phase::Exhausted
        } else {
            Phase::Idle
        }
    }

    pub fn footer_text(&self) -> &'static str {
        if self.state.no_more {
            FOOTER_EXHAUSTED
        } else {
            FOOTER_MORE
        }
    }

    /// Request the role catalog. Not gated on `loading`.
    pub fn mount(&mut self, gateway: &impl UserGateway) {
        gateway.get_roles();
    }

    /// React to an edge signal; returns whether a page was requested.
    pub fn load_more(&mut self, edge: Edge, gateway: &impl UserGateway) -> bool {
        if edge != Edge::Bottom || self.state.loading || self.state.no_more {
            return false;
        }
        let ticket = self.begin_loading();
        gateway.get_next_page(ticket, self.state.filter.clone());
        true
    }

    /// Submit a phone search; returns whether it was issued.
    ///
    /// Empty input drops the filter. The model's list is cleared before the
    /// first page for the new filter is requested.
    pub fn search(&mut self, input: &str, gateway: &impl UserGateway) -> bool {
        if self.state.loading {
            tracing::debug!("search ignored while a page is loading");
            return false;
        }
        let ticket = self.begin_loading();
        gateway.clear();
        self.state.filter = PhoneFilter::from_input(input);
        let phone = self.state.filter.as_ref().map(|f| f.phone.as_str());
        tracing::info!(phone, "search");
        gateway.get_next_page(ticket, self.state.filter.clone());
        true
    }

    /// Checking a toggle grants the role, unchecking revokes it.
    pub fn toggle_role(
        &self,
        user_id: &str,
        role_id: &str,
        checked: bool,
        gateway: &impl UserGateway,
    ) {
        if checked {
            gateway.add_role(user_id, role_id);
        } else {
            gateway.remove_role(user_id, role_id);
        }
    }

    /// Apply a page completion. Returns `false` for a stale ticket.
    pub fn settle(&mut self, ticket: Ticket, outcome: &PageOutcome) -> bool {
        if self.pending != Some(ticket) {
            tracing::warn!(?ticket, pending = ?self.pending, "dropping stale page completion");
            return false;
        }
        self.pending = None;
        self.state.loading = false;
        match outcome {
            PageOutcome::Loaded(_) => self.state.no_more = false,
            PageOutcome::Empty => self.state.no_more = true,
            PageOutcome::Failed(msg) => tracing::error!(%msg, "page fetch failed"),
        }
        true
    }

    /// Take in a change published by the model.
    pub fn observe(&mut self, event: ModelEvent) {
        match event {
            ModelEvent::ListChanged(users) => self.users = users,
            ModelEvent::RolesChanged(roles) => self.roles = roles,
        }
    }

    fn begin_loading(&mut self) -> Ticket {
        self.next_ticket += 1;
        let ticket = Ticket(self.next_ticket);
        self.pending = Some(ticket);
        self.state.loading = true;
        self.state.no_more = false;
        ticket
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Roles,
        Page(Ticket, Option<String>),
        Clear,
        Add(String, String),
        Remove(String, String),
    }

    #[derive(Default)]
    struct Recorder(RefCell<Vec<Call>>);

    impl Recorder {
        fn calls(&self) -> Vec<Call> {
            self.0.borrow().clone()
        }

        fn push(&self, call: Call) {
            self.0.borrow_mut().push(call);
        }
    }

    impl UserGateway for Recorder {
        fn get_roles(&self) {
            self.push(Call::Roles);
        }
        fn get_next_page(&self, ticket: Ticket, filter: Option<PhoneFilter>) {
            self.push(Call::Page(ticket, filter.map(|f| f.phone)));
        }
        fn clear(&self) {
            self.push(Call::Clear);
        }
        fn add_role(&self, user_id: &str, role_id: &str) {
            self.push(Call::Add(user_id.into(), role_id.into()));
        }
        fn remove_role(&self, user_id: &str, role_id: &str) {
            self.push(Call::Remove(user_id.into(), role_id.into()));
        }
    }

    #[test]
    fn mount_requests_roles_without_loading() {
        let gw = Recorder::default();
        let mut view = AdminView::new();
        view.mount(&gw);
        assert_eq!(gw.calls(), vec![Call::Roles]);
        assert!(!view.state().loading);
    }

    #[test]
    fn top_edge_is_ignored() {
        let gw = Recorder::default();
        let mut view = AdminView::new();
        assert!(!view.load_more(Edge::Top, &gw));
        assert!(gw.calls().is_empty());
        assert_eq!(view.state(), &ViewState::default());
    }

    #[test]
    fn bottom_edge_while_loading_is_ignored() {
        let gw = Recorder::default();
        let mut view = AdminView::new();
        assert!(view.load_more(Edge::Bottom, &gw));
        assert!(!view.load_more(Edge::Bottom, &gw));
        assert_eq!(gw.calls().len(), 1);
        assert_eq!(view.phase(), Phase::Loading);
    }

    #[test]
    fn empty_page_exhausts_until_next_search() {
        let gw = Recorder::default();
        let mut view = AdminView::new();
        view.load_more(Edge::Bottom, &gw);
        assert!(view.settle(Ticket(1), &PageOutcome::Empty));
        assert_eq!(view.phase(), Phase::Exhausted);
        assert_eq!(view.footer_text(), FOOTER_EXHAUSTED);
        assert!(!view.load_more(Edge::Bottom, &gw));

        assert!(view.search("", &gw));
        assert!(!view.state().no_more);
        assert_eq!(view.phase(), Phase::Loading);
    }

    #[test]
    fn search_clears_then_fetches_with_filter() {
        let gw = Recorder::default();
        let mut view = AdminView::new();
        assert!(view.search("13800000000", &gw));
        assert_eq!(
            gw.calls(),
            vec![Call::Clear, Call::Page(Ticket(1), Some("13800000000".into()))]
        );
        assert_eq!(view.state().filter, PhoneFilter::from_input("13800000000"));
        view.settle(Ticket(1), &PageOutcome::Loaded(1));
        assert_eq!(view.phase(), Phase::Idle);
    }

    #[test]
    fn blank_search_drops_filter() {
        let gw = Recorder::default();
        let mut view = AdminView::new();
        view.search("13800000000", &gw);
        view.settle(Ticket(1), &PageOutcome::Loaded(1));
        view.search("", &gw);
        assert_eq!(view.state().filter, None);
        assert_eq!(gw.calls().last(), Some(&Call::Page(Ticket(2), None)));
    }

    #[test]
    fn whitespace_search_is_sent_as_typed() {
        let gw = Recorder::default();
        let mut view = AdminView::new();
        view.search("   ", &gw);
        let filter = Some(PhoneFilter {
            phone: "   ".to_string(),
        });
        assert_eq!(view.state().filter, filter);
        assert_eq!(
            gw.calls().last(),
            Some(&Call::Page(Ticket(1), Some("   ".to_string())))
        );
    }

    #[test]
    fn later_pages_keep_filter() {
        let gw = Recorder::default();
        let mut view = AdminView::new();
        view.search("138", &gw);
        view.settle(Ticket(1), &PageOutcome::Loaded(20));
        view.load_more(Edge::Bottom, &gw);
        assert_eq!(
            gw.calls().last(),
            Some(&Call::Page(Ticket(2), Some("138".into())))
        );
    }

    #[test]
    fn search_while_loading_is_ignored() {
        let gw = Recorder::default();
        let mut view = AdminView::new();
        view.load_more(Edge::Bottom, &gw);
        assert!(!view.search("138", &gw));
        assert_eq!(gw.calls().len(), 1);
        assert_eq!(view.state().filter, None);
    }

    #[test]
    fn stale_ticket_is_dropped() {
        let gw = Recorder::default();
        let mut view = AdminView::new();
        view.load_more(Edge::Bottom, &gw);
        assert!(!view.settle(Ticket(7), &PageOutcome::Empty));
        assert!(view.state().loading);
        assert!(view.settle(Ticket(1), &PageOutcome::Loaded(3)));
        assert!(!view.settle(Ticket(1), &PageOutcome::Empty));
        assert!(!view.state().no_more);
    }

    #[test]
    fn failed_page_releases_loading_and_keeps_exhaustion_flag() {
        let gw = Recorder::default();
        let mut view = AdminView::new();
        view.load_more(Edge::Bottom, &gw);
        view.settle(Ticket(1), &PageOutcome::Failed("timeout".into()));
        assert_eq!(view.phase(), Phase::Idle);
        assert!(view.load_more(Edge::Bottom, &gw));
    }

    #[test]
    fn toggle_maps_checked_state_to_call() {
        let gw = Recorder::default();
        let view = AdminView::new();
        view.toggle_role("u1", "r1", true, &gw);
        view.toggle_role("u1", "r1", false, &gw);
        assert_eq!(
            gw.calls(),
            vec![
                Call::Add("u1".into(), "r1".into()),
                Call::Remove("u1".into(), "r1".into())
            ]
        );
        assert_eq!(view.state(), &ViewState::default());
    }

    #[test]
    fn observe_replaces_snapshots() {
        let mut view = AdminView::new();
        view.observe(ModelEvent::RolesChanged(vec![RoleRecord {
            id: "r1".into(),
            name: "Admin".into(),
        }]));
        assert_eq!(view.roles().len(), 1);
        view.observe(ModelEvent::ListChanged(Vec::new()));
        assert!(view.users().is_empty());
    }
}
