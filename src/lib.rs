//! Library crate for user-admin-tui.
//!
//! This crate exposes the building blocks of the TUI:
//! - User service wire types and HTTP client (`api`)
//! - Local copy of the user collection (`store`)
//! - Filter, search and sort projection over it (`search`)
//! - Application state, panels, dispatch and event loop (`app`)
//! - Error and result types (`error`)
//! - UI rendering and widgets (`ui`)
//!
//! It is used by the `user-admin-tui` binary and by tests.
#![deny(rustdoc::broken_intra_doc_links)]

pub mod api;
pub mod app;
pub mod error;
pub mod search;
pub mod store;
pub mod ui;

pub use error::{ApiError, ValidationError};
