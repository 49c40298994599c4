//! The user-list model: accumulated pages, role catalog and page cursor.
//!
//! The model is the only writer of the list. Views never touch it directly;
//! they call the operations below and redraw from the [`ModelEvent`]s it
//! publishes to subscribers.
use std::sync::mpsc::{Receiver, Sender, channel};

use crate::error::{Context, Result};
use crate::search::PhoneFilter;
use crate::service::{Page, RoleRecord, UserRecord, UserService};

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Change notification carrying a snapshot of the collection that changed.
#[derive(Clone, Debug, PartialEq)]
pub enum ModelEvent {
    ListChanged(Vec<UserRecord>),
    RolesChanged(Vec<RoleRecord>),
}

pub struct UserModel {
    service: Box<dyn UserService>,
    list: Vec<UserRecord>,
    roles: Vec<RoleRecord>,
    cursor: usize,
    page_size: usize,
    observers: Vec<Sender<ModelEvent>>,
}

impl UserModel {
    pub fn new(service: Box<dyn UserService>, page_size: usize) -> Self {
        Self {
            service,
            list: Vec::new(),
            roles: Vec::new(),
            cursor: 0,
            page_size: page_size.max(1),
            observers: Vec::new(),
        }
    }

    pub fn list(&self) -> &[UserRecord] {
        &self.list
    }

    /// Register for change notifications. Dropped receivers are pruned on the next publish.
    pub fn subscribe(&mut self) -> Receiver<ModelEvent> {
        let (tx, rx) = channel();
        self.observers.push(tx);
        rx
    }

    fn publish(&mut self, event: ModelEvent) {
        self.observers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Replace the role catalog with the backend's.
    pub fn get_roles(&mut self) -> Result<&[RoleRecord]> {
        self.roles = self
            .service
            .list_roles()
            .with_ctx(|| "load roles".to_string())?;
        tracing::debug!(count = self.roles.len(), "role catalog loaded");
        self.publish(ModelEvent::RolesChanged(self.roles.clone()));
        Ok(&self.roles)
    }

    /// Fetch the page after the cursor and append it to the list.
    ///
    /// Returns `None` when the backend had nothing more for `filter`.
    pub fn get_next_page(&mut self, filter: Option<&PhoneFilter>) -> Result<Option<Page>> {
        let page = self
            .service
            .list_users(filter, self.cursor, self.page_size)
            .with_ctx(|| format!("load users from offset {}", self.cursor))?;
        tracing::debug!(
            offset = self.cursor,
            received = page.len(),
            phone = filter.map(|f| f.phone.as_str()),
            "page fetched"
        );
        if page.is_empty() {
            return Ok(None);
        }
        self.cursor += page.len();
        self.list.extend(page.iter().cloned());
        self.publish(ModelEvent::ListChanged(self.list.clone()));
        Ok(Some(page))
    }

    /// Drop every accumulated user and rewind the cursor.
    pub fn clear(&mut self) {
        self.list.clear();
        self.cursor = 0;
        self.publish(ModelEvent::ListChanged(Vec::new()));
    }

    pub fn add_role(&mut self, user_id: &str, role_id: &str) -> Result<()> {
        let updated = self
            .service
            .add_role(user_id, role_id)
            .with_ctx(|| format!("add role {role_id} to user {user_id}"))?;
        tracing::info!(user = user_id, role = role_id, "role granted");
        self.replace_user(updated);
        Ok(())
    }

    pub fn remove_role(&mut self, user_id: &str, role_id: &str) -> Result<()> {
        let updated = self
            .service
            .remove_role(user_id, role_id)
            .with_ctx(|| format!("remove role {role_id} from user {user_id}"))?;
        tracing::info!(user = user_id, role = role_id, "role revoked");
        self.replace_user(updated);
        Ok(())
    }

    fn replace_user(&mut self, updated: UserRecord) {
        if let Some(slot) = self.list.iter_mut().find(|u| u.id == updated.id) {
            *slot = updated;
            self.publish(ModelEvent::ListChanged(self.list.clone()));
        }
    }
}
