//! Backend layer: user and role records and the [`UserService`] trait.
//!
//! Two backends are provided:
//! - [`http::HttpService`] talks JSON to the admin API
//! - [`memory::MemoryService`] keeps everything in process (demo mode, tests)
pub mod http;
pub mod memory;

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::search::PhoneFilter;

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// One application user as returned by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(rename = "objectId")]
    pub id: String,
    pub mobile_phone_number: String,
    pub created_at: DateTime<Utc>,
    /// Names of the roles the user holds.
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

impl UserRecord {
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.contains(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    #[serde(rename = "objectId")]
    pub id: String,
    pub name: String,
}

/// A batch of users; an empty page means the cursor is exhausted.
pub type Page = Vec<UserRecord>;

/// Operations the user model needs from a backend.
pub trait UserService: Send {
    fn list_roles(&self) -> ServiceResult<Vec<RoleRecord>>;

    /// Users newest first, optionally constrained by `filter`, starting at `skip`.
    fn list_users(
        &self,
        filter: Option<&PhoneFilter>,
        skip: usize,
        limit: usize,
    ) -> ServiceResult<Page>;

    /// Grant a role; returns the user as stored afterwards.
    fn add_role(&mut self, user_id: &str, role_id: &str) -> ServiceResult<UserRecord>;

    /// Revoke a role; returns the user as stored afterwards.
    fn remove_role(&mut self, user_id: &str, role_id: &str) -> ServiceResult<UserRecord>;
}

impl<S: UserService + ?Sized> UserService for Box<S> {
    fn list_roles(&self) -> ServiceResult<Vec<RoleRecord>> {
        (**self).list_roles()
    }

    fn list_users(
        &self,
        filter: Option<&PhoneFilter>,
        skip: usize,
        limit: usize,
    ) -> ServiceResult<Page> {
        (**self).list_users(filter, skip, limit)
    }

    fn add_role(&mut self, user_id: &str, role_id: &str) -> ServiceResult<UserRecord> {
        (**self).add_role(user_id, role_id)
    }

    fn remove_role(&mut self, user_id: &str, role_id: &str) -> ServiceResult<UserRecord> {
        (**self).remove_role(user_id, role_id)
    }
}
