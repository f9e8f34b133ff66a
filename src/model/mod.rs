//! Data models for Taskboard.
//!
//! This module contains all domain models:
//! - Project
//! - Task
//! - DueDate
//! - Session

pub mod due_date;
pub mod project;
pub mod session;
pub mod task;

pub use due_date::DueDate;
pub use project::{Project, ProjectDraft, ProjectFilter, ProjectId, ProjectStatus, StatusFilter};
pub use session::{Credentials, Session, SessionContext};
pub use task::{Task, TaskDraft, TaskFilter, TaskId, TaskStatus};
