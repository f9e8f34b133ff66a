//! Taskboard - projects and tasks against a REST backend
//!
//! This crate provides the client library and the `tb` CLI.
//!
//! # Architecture
//!
//! - [`model`] - Data types (Project, Task, DueDate, Session)
//! - [`cache`] - Query cache with tag-based invalidation and request de-duplication
//! - [`api`] - HTTP transport plus auth, project, and task clients
//! - [`config`] - Base URL resolution and the persisted CLI session
//! - [`validate`] - Client-side input rules
//! - [`cli`] - Command-line interface using clap
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod validate;

pub use error::{Error, Result};
