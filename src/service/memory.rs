//! In-process backend seeded from a JSON fixture.
use std::path::Path;

use serde::Deserialize;

use super::{Page, RoleRecord, ServiceResult, UserRecord, UserService};
use crate::error::{Context, Result, ServiceError};
use crate::search::PhoneFilter;

/// Fixture layout: `{ "roles": [...], "users": [...] }`.
#[derive(Debug, Default, Deserialize)]
struct Fixture {
    #[serde(default)]
    roles: Vec<RoleRecord>,
    #[serde(default)]
    users: Vec<UserRecord>,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryService {
    roles: Vec<RoleRecord>,
    users: Vec<UserRecord>,
}

impl MemoryService {
    /// Users are kept newest first, matching the HTTP backend's ordering.
    pub fn new(roles: Vec<RoleRecord>, mut users: Vec<UserRecord>) -> Self {
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Self { roles, users }
    }

    pub fn from_fixture<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_ctx(|| format!("read fixture {}", path.display()))?;
        let fixture: Fixture = serde_json::from_str(&contents)
            .with_ctx(|| format!("parse fixture {}", path.display()))?;
        tracing::info!(
            roles = fixture.roles.len(),
            users = fixture.users.len(),
            "loaded fixture {}",
            path.display()
        );
        Ok(Self::new(fixture.roles, fixture.users))
    }

    fn role(&self, role_id: &str) -> ServiceResult<&RoleRecord> {
        self.roles
            .iter()
            .find(|r| r.id == role_id)
            .ok_or_else(|| ServiceError::NotFound {
                kind: "role",
                id: role_id.to_string(),
            })
    }

    fn user_mut(&mut self, user_id: &str) -> ServiceResult<&mut UserRecord> {
        self.users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| ServiceError::NotFound {
                kind: "user",
                id: user_id.to_string(),
            })
    }
}

impl UserService for MemoryService {
    fn list_roles(&self) -> ServiceResult<Vec<RoleRecord>> {
        Ok(self.roles.clone())
    }

    fn list_users(
        &self,
        filter: Option<&PhoneFilter>,
        skip: usize,
        limit: usize,
    ) -> ServiceResult<Page> {
        Ok(self
            .users
            .iter()
            .filter(|u| filter.is_none_or(|f| f.matches(u)))
            .skip(skip)
            .take(limit)
            .cloned()
            .collect())
    }

    fn add_role(&mut self, user_id: &str, role_id: &str) -> ServiceResult<UserRecord> {
        let name = self.role(role_id)?.name.clone();
        let user = self.user_mut(user_id)?;
        user.roles.insert(name);
        Ok(user.clone())
    }

    fn remove_role(&mut self, user_id: &str, role_id: &str) -> ServiceResult<UserRecord> {
        let name = self.role(role_id)?.name.clone();
        let user = self.user_mut(user_id)?;
        user.roles.remove(&name);
        Ok(user.clone())
    }
}
