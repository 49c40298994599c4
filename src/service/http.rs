//! JSON-over-HTTP backend for the admin API.
//!
//! Endpoints, relative to the configured base URL:
//! - `GET /roles`
//! - `GET /users?skip=N&limit=M[&phone=P]`
//! - `POST /users/{uid}/roles/{rid}` and `DELETE /users/{uid}/roles/{rid}`
//!
//! Ids are added as escaped path segments, so a `/` or `?` inside an id
//! stays part of that segment.
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;

use super::{Page, RoleRecord, ServiceResult, UserRecord, UserService};
use crate::error::ServiceError;
use crate::search::PhoneFilter;

pub struct HttpService {
    client: Client,
    base: Url,
    token: Option<String>,
}

impl HttpService {
    pub fn new(base: &str, token: Option<String>, timeout: Duration) -> ServiceResult<Self> {
        let base = Url::parse(base)
            .map_err(|e| ServiceError::InvalidEndpoint(format!("{base}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ServiceError::InvalidEndpoint(format!(
                "{base}: not a base URL"
            )));
        }
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("user-admin/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// The base URL with `segments` appended, each one escaped.
    fn url(&self, segments: &[&str]) -> ServiceResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ServiceError::InvalidEndpoint(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> ServiceResult<RequestBuilder> {
        let req = self.client.request(method, self.url(segments)?);
        Ok(match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        })
    }

    fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> ServiceResult<T> {
        let resp = req
            .send()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        let status = resp.status();
        tracing::debug!(status = status.as_u16(), url = %resp.url(), "backend response");
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }
        resp
            .json::<T>()
            .map_err(|e| ServiceError::Decode(e.to_string()))
    }

    fn role_request(
        &self,
        method: Method,
        user_id: &str,
        role_id: &str,
    ) -> ServiceResult<RequestBuilder> {
        self.request(method, &["users", user_id, "roles", role_id])
    }
}

fn users_query(
    filter: Option<&PhoneFilter>,
    skip: usize,
    limit: usize,
) -> Vec<(&'static str, String)> {
    let mut query = vec![("skip", skip.to_string()), ("limit", limit.to_string())];
    if let Some(f) = filter {
        query.push(("phone", f.phone.clone()));
    }
    query
}

impl UserService for HttpService {
    fn list_roles(&self) -> ServiceResult<Vec<RoleRecord>> {
        self.send(self.request(Method::GET, &["roles"])?)
    }

    fn list_users(
        &self,
        filter: Option<&PhoneFilter>,
        skip: usize,
        limit: usize,
    ) -> ServiceResult<Page> {
        let req = self
            .request(Method::GET, &["users"])?
            .query(&users_query(filter, skip, limit));
        self.send(req)
    }

    fn add_role(&mut self, user_id: &str, role_id: &str) -> ServiceResult<UserRecord> {
        self.send(self.role_request(Method::POST, user_id, role_id)?)
    }

    fn remove_role(&mut self, user_id: &str, role_id: &str) -> ServiceResult<UserRecord> {
        self.send(self.role_request(Method::DELETE, user_id, role_id)?)
    }
}
