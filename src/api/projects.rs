//! Project resource client.
//!
//! | Operation | Call | Invalidates |
//! |---|---|---|
//! | `list` | `GET /project/projects` | none (provides `Project(id)` per project, `ProjectList`) |
//! | `create` | `POST /project/projects` | `ProjectList` |
//! | `update` | `PUT /project/projects/{id}` | `Project(id)` |
//! | `delete` | `DELETE /project/projects/{id}` | `Project(id)`, `ProjectList` |

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use super::http::ApiClient;
use crate::cache::{CacheKey, QueryCache, Tag};
use crate::error::{Error, Result};
use crate::model::{Project, ProjectDraft, ProjectId};
use crate::validate::{require_id, validate_project_create, validate_project_update};

const COLLECTION: &str = "/project/projects";

/// Cache endpoint name for the project list.
pub const LIST_PROJECTS: &str = "list_projects";

/// The backend answers either with a bare array or a wrapper object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProjectListResponse {
    Bare(Vec<Project>),
    Wrapped {
        #[serde(default)]
        success: Option<bool>,
        projects: Vec<Project>,
    },
}

impl ProjectListResponse {
    fn into_projects(self) -> Result<Vec<Project>> {
        match self {
            Self::Bare(projects) => Ok(projects),
            Self::Wrapped {
                success: Some(false),
                ..
            } => Err(Error::Remote {
                status: 200,
                message: "project list was not acknowledged".to_string(),
            }),
            Self::Wrapped { projects, .. } => Ok(projects),
        }
    }
}

/// Cache key of the project list.
#[must_use]
pub fn list_key() -> CacheKey {
    CacheKey::unit(LIST_PROJECTS)
}

/// Tags provided by a project list: each project plus the list sentinel.
#[must_use]
pub fn list_tags(projects: &[Project]) -> Vec<Tag> {
    projects
        .iter()
        .map(|p| Tag::Project(p.id.clone()))
        .chain(std::iter::once(Tag::ProjectList))
        .collect()
}

fn item_path(id: &ProjectId) -> String {
    format!("{COLLECTION}/{id}")
}

/// Project operations bound to one client.
pub struct ProjectApi<'a> {
    http: &'a ApiClient,
    cache: &'a QueryCache,
}

impl<'a> ProjectApi<'a> {
    pub(crate) fn new(http: &'a ApiClient, cache: &'a QueryCache) -> Self {
        Self { http, cache }
    }

    /// All projects visible to the current user.
    pub async fn list(&self) -> Result<Arc<Vec<Project>>> {
        let http = self.http.clone();
        self.cache
            .query(
                list_key(),
                move || async move {
                    http.get::<ProjectListResponse>(COLLECTION)
                        .await?
                        .into_projects()
                },
                |projects: &Vec<Project>| list_tags(projects),
            )
            .await
    }

    /// Look a project up in the (cached) list.
    pub async fn find(&self, id: &ProjectId) -> Result<Project> {
        self.list()
            .await?
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| Error::ProjectNotFound { id: id.to_string() })
    }

    pub async fn create(&self, draft: ProjectDraft) -> Result<Project> {
        let draft = validate_project_create(draft)?;
        let created = self
            .cache
            .mutate(self.http.post::<_, Project>(COLLECTION, &draft), |_| {
                vec![Tag::ProjectList]
            })
            .await?;
        info!(id = %created.id, title = %created.title, "project created");
        Ok(created)
    }

    pub async fn update(&self, id: &ProjectId, draft: ProjectDraft) -> Result<Project> {
        require_id("project_id", id.as_str())?;
        let draft = validate_project_update(draft)?;
        let path = item_path(id);
        self.cache
            .mutate(self.http.put::<_, Project>(&path, &draft), |_| {
                vec![Tag::Project(id.clone())]
            })
            .await
    }

    pub async fn delete(&self, id: &ProjectId) -> Result<()> {
        require_id("project_id", id.as_str())?;
        let path = item_path(id);
        self.cache
            .mutate(
                self.http.delete_ack(&path, "delete project"),
                |_| vec![Tag::Project(id.clone()), Tag::ProjectList],
            )
            .await?;
        info!(id = %id, "project deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_accepts_both_shapes() {
        let bare: ProjectListResponse =
            serde_json::from_str(r#"[{"_id":"p1","title":"A","status":"active"}]"#).unwrap();
        assert_eq!(bare.into_projects().unwrap().len(), 1);

        let wrapped: ProjectListResponse = serde_json::from_str(
            r#"{"success":true,"projects":[{"_id":"p1","title":"A"},{"_id":"p2","title":"B"}]}"#,
        )
        .unwrap();
        assert_eq!(wrapped.into_projects().unwrap().len(), 2);
    }

    #[test]
    fn test_list_tags_cover_every_project_and_sentinel() {
        let projects: Vec<Project> = serde_json::from_str(
            r#"[{"_id":"p1","title":"A"},{"_id":"p2","title":"B"}]"#,
        )
        .unwrap();
        let tags = list_tags(&projects);
        assert_eq!(
            tags,
            vec![
                Tag::Project("p1".into()),
                Tag::Project("p2".into()),
                Tag::ProjectList
            ]
        );
        assert_eq!(list_tags(&[]), vec![Tag::ProjectList]);
    }
}
