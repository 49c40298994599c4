//! Library crate for user-admin.
//!
//! This crate exposes the building blocks of the TUI:
//! - Application state, view state machine and event loop (`app`)
//! - Error and result types (`error`)
//! - The user-list model and its change notifications (`model`)
//! - Phone-number search (`search`)
//! - Backend services (`service`)
//! - UI rendering and widgets (`ui`)
//!
//! It is used by the `user-admin` binary and by tests.
#![doc = include_str!("../README.md")]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod app;
pub mod error;
pub mod model;
pub mod search;
pub mod service;
pub mod ui;

/// Convenient error and result types shared across the crate.
pub use error::{DynError, Result};
