//! Project management commands.
//!
//! - `tb project list` - List projects, optionally filtered
//! - `tb project show <id>` - Show one project
//! - `tb project create <title>` - Create a project
//! - `tb project update <id>` - Update title, description, or status
//! - `tb project delete <id>` - Delete a project

use serde::Serialize;

use super::{block_on, paint_project_status, print_json, AppContext};
use crate::cli::{ProjectCommands, ProjectCreateArgs, ProjectListArgs, ProjectUpdateArgs};
use crate::error::Result;
use crate::model::{Project, ProjectDraft, ProjectFilter, ProjectId, ProjectStatus};
use crate::validate::{normalize_project_status, parse_project_filter};

#[derive(Serialize)]
pub(crate) struct ProjectOutput {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
}

impl From<&Project> for ProjectOutput {
    fn from(p: &Project) -> Self {
        Self {
            id: p.id.to_string(),
            title: p.title.clone(),
            description: p.description.clone(),
            status: p.status,
        }
    }
}

#[derive(Serialize)]
struct ProjectListOutput {
    projects: Vec<ProjectOutput>,
    count: usize,
}

/// Build a [`ProjectFilter`] from command-line values.
pub(crate) fn build_filter(search: Option<&str>, status: &str) -> Result<ProjectFilter> {
    Ok(ProjectFilter {
        search: search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from),
        status: parse_project_filter(status)?,
    })
}

/// Execute a project command.
pub fn execute(command: &ProjectCommands, api_url: Option<&str>, json: bool) -> Result<()> {
    let ctx = AppContext::load(api_url, json)?;

    match command {
        ProjectCommands::List(args) => execute_list(&ctx, args),
        ProjectCommands::Show { id } => execute_show(&ctx, id),
        ProjectCommands::Create(args) => execute_create(&ctx, args),
        ProjectCommands::Update(args) => execute_update(&ctx, args),
        ProjectCommands::Delete { id } => execute_delete(&ctx, id),
    }
}

fn execute_list(ctx: &AppContext, args: &ProjectListArgs) -> Result<()> {
    let filter = build_filter(args.search.as_deref(), &args.status)?;
    let projects = block_on(ctx.client.projects().list())??;
    let visible = filter.apply(&projects);

    if ctx.json {
        return print_json(&ProjectListOutput {
            count: visible.len(),
            projects: visible.into_iter().map(ProjectOutput::from).collect(),
        });
    }

    if visible.is_empty() {
        if projects.is_empty() {
            println!("No projects found.");
            println!("\nCreate one with: tb project create <title>");
        } else {
            println!("No projects match the filter ({} total).", projects.len());
        }
        return Ok(());
    }

    println!("Projects ({}):\n", visible.len());
    for project in visible {
        print_project(project);
        println!();
    }
    Ok(())
}

fn print_project(project: &Project) {
    println!("  {} [{}]", project.title, paint_project_status(project.status));
    println!("    ID:   {}", project.id);
    if let Some(desc) = &project.description {
        println!("    Desc: {desc}");
    }
}

fn execute_show(ctx: &AppContext, id: &str) -> Result<()> {
    let project = block_on(ctx.client.projects().find(&ProjectId::from(id)))??;

    if ctx.json {
        return print_json(&ProjectOutput::from(&project));
    }

    println!("Project: {}", project.title);
    println!("  ID:          {}", project.id);
    println!("  Status:      {}", paint_project_status(project.status));
    println!(
        "  Description: {}",
        project.description.as_deref().unwrap_or("-")
    );
    Ok(())
}

fn execute_create(ctx: &AppContext, args: &ProjectCreateArgs) -> Result<()> {
    let draft = ProjectDraft {
        title: Some(args.title.clone()),
        description: args.description.clone(),
        status: Some(normalize_project_status(&args.status)?),
    };
    let project = block_on(ctx.client.projects().create(draft))??;

    if ctx.json {
        return print_json(&ProjectOutput::from(&project));
    }

    println!("Created project: {}", project.title);
    println!("  ID:     {}", project.id);
    println!("  Status: {}", paint_project_status(project.status));
    Ok(())
}

fn execute_update(ctx: &AppContext, args: &ProjectUpdateArgs) -> Result<()> {
    let draft = ProjectDraft {
        title: args.title.clone(),
        description: args.description.clone(),
        status: args
            .status
            .as_deref()
            .map(normalize_project_status)
            .transpose()?,
    };
    let project = block_on(
        ctx.client
            .projects()
            .update(&ProjectId::from(args.id.as_str()), draft),
    )??;

    if ctx.json {
        return print_json(&ProjectOutput::from(&project));
    }

    println!("Updated project: {}", project.title);
    if args.description.is_some() {
        println!(
            "  Description: {}",
            project.description.as_deref().unwrap_or("-")
        );
    }
    if args.status.is_some() {
        println!("  Status: {}", paint_project_status(project.status));
    }
    Ok(())
}

fn execute_delete(ctx: &AppContext, id: &str) -> Result<()> {
    block_on(ctx.client.projects().delete(&ProjectId::from(id)))??;

    if ctx.json {
        print_json(&serde_json::json!({ "deleted": true, "id": id }))
    } else {
        println!("Deleted project: {id}");
        Ok(())
    }
}
