//! Task commands.
//!
//! - `tb task list <project-id>` - List a project's tasks
//! - `tb task show <project-id> <id>` - Show one task
//! - `tb task create <project-id> <title>` - Create a task
//! - `tb task update <id>` - Update a task
//! - `tb task delete <id>` - Delete a task

use colored::Colorize;
use serde::Serialize;

use super::{block_on, paint_task_status, print_json, AppContext};
use crate::cli::{TaskCommands, TaskCreateArgs, TaskUpdateArgs};
use crate::error::Result;
use crate::model::{DueDate, ProjectId, Task, TaskDraft, TaskFilter, TaskId, TaskStatus};
use crate::validate::{normalize_task_status, parse_due_date, parse_task_filter};

#[derive(Serialize)]
pub(crate) struct TaskOutput {
    pub id: String,
    pub project_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: Option<String>,
    pub overdue: bool,
}

impl From<&Task> for TaskOutput {
    fn from(t: &Task) -> Self {
        Self {
            id: t.id.to_string(),
            project_id: t.project_id.as_ref().map(ToString::to_string),
            title: t.title.clone(),
            description: t.description.clone(),
            status: t.status,
            due_date: t.due_date.map(|d| d.to_string()),
            overdue: is_overdue(t, DueDate::today()),
        }
    }
}

#[derive(Serialize)]
struct TaskListOutput {
    project_id: String,
    tasks: Vec<TaskOutput>,
    count: usize,
}

/// An unfinished task whose due date lies before `today`.
pub(crate) fn is_overdue(task: &Task, today: DueDate) -> bool {
    task.status != TaskStatus::Done && task.due_date.is_some_and(|d| d < today)
}

/// One line of human output for a task.
pub(crate) fn print_task(task: &Task, indent: &str) {
    let due = match task.due_date {
        Some(d) if is_overdue(task, DueDate::today()) => format!(" due {}", d.to_string().red()),
        Some(d) => format!(" due {d}"),
        None => String::new(),
    };
    println!(
        "{indent}[{}] {}{due}  ({})",
        paint_task_status(task.status),
        task.title,
        task.id.to_string().dimmed()
    );
    if let Some(desc) = &task.description {
        println!("{indent}    {desc}");
    }
}

/// Execute a task command.
pub fn execute(command: &TaskCommands, api_url: Option<&str>, json: bool) -> Result<()> {
    let ctx = AppContext::load(api_url, json)?;

    match command {
        TaskCommands::List { project_id, status } => execute_list(&ctx, project_id, status),
        TaskCommands::Show { project_id, id } => execute_show(&ctx, project_id, id),
        TaskCommands::Create(args) => execute_create(&ctx, args),
        TaskCommands::Update(args) => execute_update(&ctx, args),
        TaskCommands::Delete { id } => execute_delete(&ctx, id),
    }
}

fn execute_list(ctx: &AppContext, project_id: &str, status: &str) -> Result<()> {
    let filter = TaskFilter {
        status: parse_task_filter(status)?,
    };
    let project_id = ProjectId::from(project_id);
    let tasks = block_on(ctx.client.tasks().list_by_project(&project_id))??;
    let visible = filter.apply(&tasks);

    if ctx.json {
        return print_json(&TaskListOutput {
            project_id: project_id.to_string(),
            count: visible.len(),
            tasks: visible.into_iter().map(TaskOutput::from).collect(),
        });
    }

    if visible.is_empty() {
        println!("No tasks.");
        println!("\nCreate one with: tb task create {project_id} <title>");
        return Ok(());
    }

    println!("Tasks ({}):\n", visible.len());
    for task in visible {
        print_task(task, "  ");
    }
    Ok(())
}

fn execute_show(ctx: &AppContext, project_id: &str, id: &str) -> Result<()> {
    let task = block_on(
        ctx.client
            .tasks()
            .find(&ProjectId::from(project_id), &TaskId::from(id)),
    )??;

    if ctx.json {
        return print_json(&TaskOutput::from(&task));
    }

    println!("Task: {}", task.title);
    println!("  ID:          {}", task.id);
    println!("  Project:     {project_id}");
    println!("  Status:      {}", paint_task_status(task.status));
    match task.due_date {
        Some(due) if is_overdue(&task, DueDate::today()) => {
            println!("  Due:         {} (overdue)", due.to_string().red());
        }
        Some(due) => println!("  Due:         {due}"),
        None => println!("  Due:         -"),
    }
    println!(
        "  Description: {}",
        task.description.as_deref().unwrap_or("-")
    );
    Ok(())
}

fn execute_create(ctx: &AppContext, args: &TaskCreateArgs) -> Result<()> {
    let draft = TaskDraft {
        title: Some(args.title.clone()),
        description: args.description.clone(),
        status: Some(normalize_task_status(&args.status)?),
        due_date: args.due.as_deref().map(parse_due_date).transpose()?,
    };
    let project_id = ProjectId::from(args.project_id.as_str());
    let task = block_on(ctx.client.tasks().create(&project_id, draft))??;

    if ctx.json {
        return print_json(&TaskOutput::from(&task));
    }

    println!("Created task: {}", task.title);
    println!("  ID:     {}", task.id);
    println!("  Status: {}", paint_task_status(task.status));
    if let Some(due) = task.due_date {
        println!("  Due:    {due}");
    }
    Ok(())
}

fn execute_update(ctx: &AppContext, args: &TaskUpdateArgs) -> Result<()> {
    let draft = TaskDraft {
        title: args.title.clone(),
        description: args.description.clone(),
        status: args
            .status
            .as_deref()
            .map(normalize_task_status)
            .transpose()?,
        due_date: args.due.as_deref().map(parse_due_date).transpose()?,
    };
    let task = block_on(
        ctx.client
            .tasks()
            .update(&TaskId::from(args.id.as_str()), draft),
    )??;

    if ctx.json {
        return print_json(&TaskOutput::from(&task));
    }

    println!("Updated task: {}", task.title);
    if args.status.is_some() {
        println!("  Status: {}", paint_task_status(task.status));
    }
    if args.due.is_some() {
        if let Some(due) = task.due_date {
            println!("  Due:    {due}");
        }
    }
    Ok(())
}

fn execute_delete(ctx: &AppContext, id: &str) -> Result<()> {
    block_on(ctx.client.tasks().delete(&TaskId::from(id)))??;

    if ctx.json {
        print_json(&serde_json::json!({ "deleted": true, "id": id }))
    } else {
        println!("Deleted task: {id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn task(status: TaskStatus, due: Option<(i32, u32, u32)>) -> Task {
        Task {
            id: TaskId::from("t1"),
            title: "Write docs".into(),
            description: None,
            status,
            due_date: due.map(|(y, m, d)| DueDate::new(NaiveDate::from_ymd_opt(y, m, d).unwrap())),
            project_id: Some(ProjectId::from("p1")),
        }
    }

    #[test]
    fn test_overdue_only_for_unfinished_past_tasks() {
        let today = DueDate::new(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());

        assert!(is_overdue(&task(TaskStatus::Todo, Some((2024, 6, 9))), today));
        assert!(!is_overdue(&task(TaskStatus::Done, Some((2024, 6, 9))), today));
        assert!(!is_overdue(&task(TaskStatus::InProgress, Some((2024, 6, 10))), today));
        assert!(!is_overdue(&task(TaskStatus::Todo, None), today));
    }

    #[test]
    fn test_output_formats_due_date_as_plain_date() {
        let out = TaskOutput::from(&task(TaskStatus::InProgress, Some((2030, 1, 2))));
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["due_date"], "2030-01-02");
        assert_eq!(json["status"], "in-progress");
        assert_eq!(json["project_id"], "p1");
        assert_eq!(json["overdue"], false);
    }
}
