//! Dashboard: filtered projects, each with its task list.
//!
//! Task lists are fetched concurrently. A project whose tasks fail to load
//! is still shown, with the error in place of its tasks.

use colored::Colorize;
use futures::future::join_all;
use serde::Serialize;

use super::project::{build_filter, ProjectOutput};
use super::task::{print_task, TaskOutput};
use super::{block_on, paint_project_status, print_json, AppContext};
use crate::api::Client;
use crate::cli::DashboardArgs;
use crate::error::Result;
use crate::model::{Project, ProjectFilter, Task, TaskFilter};
use crate::validate::parse_task_filter;
use std::sync::Arc;

#[derive(Serialize)]
struct DashboardEntry {
    #[serde(flatten)]
    project: ProjectOutput,
    #[serde(skip_serializing_if = "Option::is_none")]
    tasks: Option<Vec<TaskOutput>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tasks_error: Option<String>,
}

#[derive(Serialize)]
struct DashboardOutput {
    user: Option<String>,
    projects: Vec<DashboardEntry>,
    count: usize,
    total: usize,
}

type Row = (Project, Result<Arc<Vec<Task>>>);

fn welcome(email: Option<&str>) -> String {
    match email {
        Some(email) => format!("Welcome, {email}"),
        None => "Welcome (not logged in)".to_string(),
    }
}

/// Load the project list, filter it, then load each visible project's tasks.
async fn load(client: &Client, filter: &ProjectFilter) -> Result<(usize, Vec<Row>)> {
    let projects = client.projects().list().await?;
    let visible: Vec<Project> = filter.apply(&projects).into_iter().cloned().collect();

    let tasks = client.tasks();
    let lists = join_all(visible.iter().map(|p| tasks.list_by_project(&p.id))).await;

    Ok((projects.len(), visible.into_iter().zip(lists).collect()))
}

pub fn execute(args: &DashboardArgs, api_url: Option<&str>, json: bool) -> Result<()> {
    let filter = build_filter(args.search.as_deref(), &args.status)?;
    let task_filter = TaskFilter {
        status: parse_task_filter(&args.task_status)?,
    };
    let ctx = AppContext::load(api_url, json)?;

    let (total, rows) = block_on(load(&ctx.client, &filter))??;
    let user = ctx.client.session().email();

    if ctx.json {
        let projects: Vec<DashboardEntry> = rows
            .iter()
            .map(|(project, tasks)| {
                let (tasks, tasks_error) = match tasks {
                    Ok(list) => (
                        Some(task_filter.apply(list).into_iter().map(TaskOutput::from).collect()),
                        None,
                    ),
                    Err(e) => (None, Some(e.to_string())),
                };
                DashboardEntry {
                    project: ProjectOutput::from(project),
                    tasks,
                    tasks_error,
                }
            })
            .collect();
        return print_json(&DashboardOutput {
            user,
            count: projects.len(),
            projects,
            total,
        });
    }

    println!("{}\n", welcome(user.as_deref()).bold());

    if rows.is_empty() {
        if total == 0 {
            println!("No projects yet.");
            println!("\nCreate one with: tb project create <title>");
        } else {
            println!("No projects match the filter ({total} total).");
        }
        return Ok(());
    }

    println!("Dashboard ({} of {total} projects)\n", rows.len());
    for (project, tasks) in &rows {
        println!(
            "{} [{}]  ({})",
            project.title.bold(),
            paint_project_status(project.status),
            project.id.to_string().dimmed()
        );
        match tasks {
            Ok(list) => {
                let visible = task_filter.apply(list);
                if visible.is_empty() {
                    println!("    {}", "No tasks.".dimmed());
                }
                for task in visible {
                    print_task(task, "    ");
                }
            }
            Err(e) => println!("    {} {e}", "Failed to load tasks:".red()),
        }
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_names_the_session_user() {
        assert_eq!(welcome(Some("dev@example.com")), "Welcome, dev@example.com");
        assert_eq!(welcome(None), "Welcome (not logged in)");
    }
}
