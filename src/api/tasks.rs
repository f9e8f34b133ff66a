//! Task resource client.
//!
//! Task lists are cached per project. Each list entry carries the ids of the
//! tasks it contains, the owning project's `ProjectTasks` tag, and the
//! `TaskList` sentinel. A change to one task therefore refreshes every list
//! that shows it.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use super::http::ApiClient;
use crate::cache::{CacheKey, QueryCache, Tag};
use crate::error::{Error, Result};
use crate::model::{ProjectId, Task, TaskDraft, TaskId};
use crate::validate::{require_id, validate_task_create, validate_task_update};

/// Cache endpoint name for per-project task lists.
pub const LIST_TASKS: &str = "list_tasks_by_project";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TaskListResponse {
    Wrapped {
        #[serde(default)]
        success: Option<bool>,
        tasks: Vec<Task>,
    },
    Bare(Vec<Task>),
}

impl TaskListResponse {
    fn into_tasks(self) -> Result<Vec<Task>> {
        match self {
            Self::Wrapped {
                success: Some(false),
                ..
            } => Err(Error::Remote {
                status: 200,
                message: "task list was not acknowledged".to_string(),
            }),
            Self::Wrapped { tasks, .. } | Self::Bare(tasks) => Ok(tasks),
        }
    }
}

/// Cache key of one project's task list.
#[must_use]
pub fn list_key(project_id: &ProjectId) -> CacheKey {
    CacheKey::new(LIST_TASKS, project_id.as_str())
}

/// Tags provided by a project's task list.
#[must_use]
pub fn list_tags(project_id: &ProjectId, tasks: &[Task]) -> Vec<Tag> {
    tasks
        .iter()
        .map(|t| Tag::Task(t.id.clone()))
        .chain([Tag::ProjectTasks(project_id.clone()), Tag::TaskList])
        .collect()
}

fn collection_path(project_id: &ProjectId) -> String {
    format!("/task/{project_id}/tasks")
}

fn item_path(task_id: &TaskId) -> String {
    format!("/task/task/{task_id}")
}

/// Task operations bound to one client.
pub struct TaskApi<'a> {
    http: &'a ApiClient,
    cache: &'a QueryCache,
}

impl<'a> TaskApi<'a> {
    pub(crate) fn new(http: &'a ApiClient, cache: &'a QueryCache) -> Self {
        Self { http, cache }
    }

    /// Tasks of one project. Tasks the backend returns without a project
    /// reference are attributed to `project_id`.
    pub async fn list_by_project(&self, project_id: &ProjectId) -> Result<Arc<Vec<Task>>> {
        require_id("project_id", project_id.as_str())?;
        let http = self.http.clone();
        let owner = project_id.clone();
        let tag_owner = project_id.clone();
        self.cache
            .query(
                list_key(project_id),
                move || async move {
                    let mut tasks = http
                        .get::<TaskListResponse>(&collection_path(&owner))
                        .await?
                        .into_tasks()?;
                    for task in &mut tasks {
                        task.project_id.get_or_insert_with(|| owner.clone());
                    }
                    Ok(tasks)
                },
                move |tasks: &Vec<Task>| list_tags(&tag_owner, tasks),
            )
            .await
    }

    /// Look a task up in its project's (cached) task list.
    pub async fn find(&self, project_id: &ProjectId, task_id: &TaskId) -> Result<Task> {
        require_id("task_id", task_id.as_str())?;
        self.list_by_project(project_id)
            .await?
            .iter()
            .find(|t| &t.id == task_id)
            .cloned()
            .ok_or_else(|| Error::TaskNotFound {
                id: task_id.to_string(),
            })
    }

    pub async fn create(&self, project_id: &ProjectId, draft: TaskDraft) -> Result<Task> {
        require_id("project_id", project_id.as_str())?;
        let draft = validate_task_create(draft)?;
        let path = collection_path(project_id);
        let created = self
            .cache
            .mutate(self.http.post::<_, Task>(&path, &draft), |_| {
                vec![Tag::ProjectTasks(project_id.clone()), Tag::TaskList]
            })
            .await?;
        info!(id = %created.id, project = %project_id, "task created");
        Ok(created)
    }

    /// Partial update. Invalidates the task itself and, when the response
    /// names its project, that project's task list.
    pub async fn update(&self, task_id: &TaskId, draft: TaskDraft) -> Result<Task> {
        require_id("task_id", task_id.as_str())?;
        let draft = validate_task_update(draft)?;
        let path = item_path(task_id);
        self.cache
            .mutate(self.http.put::<_, Task>(&path, &draft), |task: &Task| {
                let mut tags = vec![Tag::Task(task_id.clone())];
                if let Some(project_id) = &task.project_id {
                    tags.push(Tag::ProjectTasks(project_id.clone()));
                }
                tags
            })
            .await
    }

    pub async fn delete(&self, task_id: &TaskId) -> Result<()> {
        require_id("task_id", task_id.as_str())?;
        let path = item_path(task_id);
        self.cache
            .mutate(
                self.http.delete_ack(&path, "delete task"),
                |_| vec![Tag::Task(task_id.clone()), Tag::TaskList],
            )
            .await?;
        info!(id = %task_id, "task deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_accepts_both_shapes() {
        let wrapped: TaskListResponse = serde_json::from_str(
            r#"{"success":true,"tasks":[{"_id":"t1","title":"A","status":"todo"}]}"#,
        )
        .unwrap();
        assert_eq!(wrapped.into_tasks().unwrap().len(), 1);

        let bare: TaskListResponse = serde_json::from_str(r"[]").unwrap();
        assert!(bare.into_tasks().unwrap().is_empty());

        let refused: TaskListResponse =
            serde_json::from_str(r#"{"success":false,"tasks":[]}"#).unwrap();
        assert!(refused.into_tasks().is_err());
    }

    #[test]
    fn test_list_tags_are_scoped_to_project() {
        let tasks: Vec<Task> =
            serde_json::from_str(r#"[{"_id":"t1","title":"A"},{"_id":"t2","title":"B"}]"#).unwrap();
        let tags = list_tags(&"p1".into(), &tasks);
        assert_eq!(
            tags,
            vec![
                Tag::Task("t1".into()),
                Tag::Task("t2".into()),
                Tag::ProjectTasks("p1".into()),
                Tag::TaskList,
            ]
        );
        assert_ne!(list_key(&"p1".into()), list_key(&"p2".into()));
    }

    #[test]
    fn test_paths() {
        assert_eq!(collection_path(&"p1".into()), "/task/p1/tasks");
        assert_eq!(item_path(&"t9".into()), "/task/task/t9");
    }
}
