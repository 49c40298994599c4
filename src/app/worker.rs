//! Background worker that owns the [`UserModel`].
//!
//! Commands queue on a channel and run one at a time, so there is never
//! more than one backend request in flight. Model changes reach the UI
//! through the model's own subscription; page completions and failures
//! come back as [`WorkerReply`]s.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread::JoinHandle;

use super::view::{PageOutcome, Ticket, UserGateway};
use crate::model::{ModelEvent, UserModel};
use crate::search::PhoneFilter;

#[derive(Debug)]
enum Command {
    GetRoles,
    NextPage {
        ticket: Ticket,
        filter: Option<PhoneFilter>,
    },
    Clear,
    AddRole { user_id: String, role_id: String },
    RemoveRole { user_id: String, role_id: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkerReply {
    PageSettled {
        ticket: Ticket,
        outcome: PageOutcome,
    },
    /// A fire-and-forget operation (roles, role toggles) failed.
    Failed { op: &'static str, message: String },
}

pub struct Worker {
    tx: Option<Sender<Command>>,
    handle: Option<JoinHandle<()>>,
    /// Set on drop; commands still queued at that point are skipped.
    stopping: Arc<AtomicBool>,
}

/// Everything the event loop needs to talk to the worker.
pub struct WorkerLink {
    pub worker: Worker,
    pub replies: Receiver<WorkerReply>,
    pub events: Receiver<ModelEvent>,
}

/// Subscribe to `model` and move it onto a worker thread.
pub fn start(mut model: UserModel) -> WorkerLink {
    let events = model.subscribe();
    let (worker, replies) = Worker::spawn(model);
    WorkerLink { worker, replies, events }
}

impl Worker {
    pub fn spawn(mut model: UserModel) -> (Self, Receiver<WorkerReply>) {
        let (tx, rx) = channel::<Command>();
        let (reply_tx, reply_rx) = channel();
        let stopping = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&stopping);
        let handle = std::thread::Builder::new()
            .name("user-admin-worker".into())
            .spawn(move || {
                for cmd in rx {
                    if stop.load(Ordering::Acquire) {
                        tracing::debug!("shutting down; skipping queued commands");
                        break;
                    }
                    tracing::debug!(?cmd, "worker command");
                    if let Some(reply) = execute(&mut model, cmd)
                        && reply_tx.send(reply).is_err()
                    {
                        break;
                    }
                }
                tracing::debug!("worker stopped");
            });
        let handle = match handle {
            Ok(h) => Some(h),
            Err(e) => {
                tracing::error!(error = %e, "failed to spawn worker thread");
                None
            }
        };
        let worker = Self {
            tx: Some(tx),
            handle,
            stopping,
        };
        (worker, reply_rx)
    }

    fn submit(&self, cmd: Command) {
        let sent = self.tx.as_ref().is_some_and(|tx| tx.send(cmd).is_ok());
        if !sent {
            tracing::warn!("worker is gone; command dropped");
        }
    }
}

fn execute(model: &mut UserModel, cmd: Command) -> Option<WorkerReply> {
    match cmd {
        Command::GetRoles => model.get_roles().err().map(|e| failed("load roles", e)),
        Command::NextPage { ticket, filter } => {
            let outcome = match model.get_next_page(filter.as_ref()) {
                Ok(Some(page)) => PageOutcome::Loaded(page.len()),
                Ok(None) => PageOutcome::Empty,
                Err(e) => PageOutcome::Failed(e.to_string()),
            };
            tracing::debug!(?ticket, total = model.list().len(), "page request settled");
            Some(WorkerReply::PageSettled { ticket, outcome })
        }
        Command::Clear => {
            model.clear();
            None
        }
        Command::AddRole { user_id, role_id } => model
            .add_role(&user_id, &role_id)
            .err()
            .map(|e| failed("add role", e)),
        Command::RemoveRole { user_id, role_id } => model
            .remove_role(&user_id, &role_id)
            .err()
            .map(|e| failed("remove role", e)),
    }
}

fn failed(op: &'static str, err: crate::error::DynError) -> WorkerReply {
    WorkerReply::Failed {
        op,
        message: err.to_string(),
    }
}

impl UserGateway for Worker {
    fn get_roles(&self) {
        self.submit(Command::GetRoles);
    }

    fn get_next_page(&self, ticket: Ticket, filter: Option<PhoneFilter>) {
        self.submit(Command::NextPage { ticket, filter });
    }

    fn clear(&self) {
        self.submit(Command::Clear);
    }

    fn add_role(&self, user_id: &str, role_id: &str) {
        self.submit(Command::AddRole {
            user_id: user_id.into(),
            role_id: role_id.into(),
        });
    }

    fn remove_role(&self, user_id: &str, role_id: &str) {
        self.submit(Command::RemoveRole {
            user_id: user_id.into(),
            role_id: role_id.into(),
        });
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // A command already running finishes; nothing queued behind it starts.
        self.stopping.store(true, Ordering::Release);
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::memory::MemoryService;
    use crate::service::{RoleRecord, UserRecord};
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeSet;
    use std::time::Duration;

    fn mk_model() -> UserModel {
        let users = (1..=3)
            .map(|d| UserRecord {
                id: format!("u{d}"),
                mobile_phone_number: format!("1390000000{d}"),
                created_at: Utc.with_ymd_and_hms(2023, 1, d, 0, 0, 0).unwrap(),
                roles: BTreeSet::new(),
            })
            .collect();
        let roles = vec![RoleRecord {
            id: "r1".into(),
            name: "Admin".into(),
        }];
        UserModel::new(Box::new(MemoryService::new(roles, users)), 2)
    }

    fn settled(ticket: u64, outcome: PageOutcome) -> WorkerReply {
        WorkerReply::PageSettled {
            ticket: Ticket(ticket),
            outcome,
        }
    }

    fn recv(rx: &Receiver<WorkerReply>) -> WorkerReply {
        rx.recv_timeout(Duration::from_secs(5)).expect("worker reply")
    }

    #[test]
    fn pages_settle_in_order() {
        let link = start(mk_model());
        link.worker.get_next_page(Ticket(1), None);
        link.worker.get_next_page(Ticket(2), None);
        link.worker.get_next_page(Ticket(3), None);
        assert_eq!(recv(&link.replies), settled(1, PageOutcome::Loaded(2)));
        assert_eq!(recv(&link.replies), settled(2, PageOutcome::Loaded(1)));
        assert_eq!(recv(&link.replies), settled(3, PageOutcome::Empty));
    }

    #[test]
    fn role_failure_is_reported() {
        let link = start(mk_model());
        link.worker.add_role("u1", "missing");
        match recv(&link.replies) {
            WorkerReply::Failed { op, message } => {
                assert_eq!(op, "add role");
                assert!(message.contains("missing"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn model_events_reach_subscriber() {
        let link = start(mk_model());
        link.worker.get_roles();
        link.worker.get_next_page(Ticket(1), None);
        recv(&link.replies);
        let first = link.events.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(first, ModelEvent::RolesChanged(ref r) if r.len() == 1));
        let second = link.events.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(second, ModelEvent::ListChanged(ref l) if l.len() == 2));
    }

    struct SlowService {
        pages: Arc<std::sync::atomic::AtomicUsize>,
    }

    impl crate::service::UserService for SlowService {
        fn list_roles(&self) -> crate::service::ServiceResult<Vec<RoleRecord>> {
            Ok(Vec::new())
        }

        fn list_users(
            &self,
            _filter: Option<&PhoneFilter>,
            _skip: usize,
            _limit: usize,
        ) -> crate::service::ServiceResult<crate::service::Page> {
            self.pages.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(100));
            Ok(Vec::new())
        }

        fn add_role(
            &mut self,
            user_id: &str,
            _: &str,
        ) -> crate::service::ServiceResult<UserRecord> {
            Err(crate::error::ServiceError::NotFound {
                kind: "user",
                id: user_id.to_string(),
            })
        }

        fn remove_role(
            &mut self,
            user_id: &str,
            _: &str,
        ) -> crate::service::ServiceResult<UserRecord> {
            Err(crate::error::ServiceError::NotFound {
                kind: "user",
                id: user_id.to_string(),
            })
        }
    }

    #[test]
    fn drop_skips_queued_commands() {
        let pages = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let service = SlowService {
            pages: Arc::clone(&pages),
        };
        let link = start(UserModel::new(Box::new(service), 2));
        for n in 1..=5 {
            link.worker.get_next_page(Ticket(n), None);
        }
        drop(link);
        assert!(pages.load(Ordering::SeqCst) < 5);
    }
}
