//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};

pub mod commands;

/// Taskboard CLI - projects and tasks against a REST backend
#[derive(Parser, Debug)]
#[command(name = "tb", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend base URL (default: config file, then http://localhost:9000/api)
    #[arg(long, global = true, env = "TB_API_URL")]
    pub api_url: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and remember the session
    Login(LoginArgs),

    /// Create an account and remember the session
    Register(RegisterArgs),

    /// Forget the saved session
    Logout,

    /// Show who is logged in
    Whoami,

    /// Project management
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Task management
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Projects with their tasks
    Dashboard(DashboardArgs),

    /// Show or change configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print version information
    Version,
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email
    pub email: String,

    /// Account password
    #[arg(short, long, env = "TB_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Account email
    pub email: String,

    /// Password (at least 6 characters)
    #[arg(short, long, env = "TB_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Repeat the password
    #[arg(short = 'c', long)]
    pub confirm_password: String,
}

// ============================================================================
// Project Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// List projects
    List(ProjectListArgs),

    /// Show one project
    Show {
        /// Project ID
        id: String,
    },

    /// Create a project
    Create(ProjectCreateArgs),

    /// Update a project
    Update(ProjectUpdateArgs),

    /// Delete a project
    Delete {
        /// Project ID
        id: String,
    },
}

#[derive(Args, Debug, Default)]
pub struct ProjectListArgs {
    /// Case-insensitive title search
    #[arg(long)]
    pub search: Option<String>,

    /// Filter by status (all, active, completed)
    #[arg(short, long, default_value = "all")]
    pub status: String,
}

#[derive(Args, Debug)]
pub struct ProjectCreateArgs {
    /// Project title
    pub title: String,

    /// Project description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Status (active, completed)
    #[arg(short, long, default_value = "active")]
    pub status: String,
}

#[derive(Args, Debug)]
pub struct ProjectUpdateArgs {
    /// Project ID
    pub id: String,

    /// New title
    #[arg(long)]
    pub title: Option<String>,

    /// New description
    #[arg(short, long)]
    pub description: Option<String>,

    /// New status (active, completed)
    #[arg(short, long)]
    pub status: Option<String>,
}

// ============================================================================
// Task Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// List a project's tasks
    List {
        /// Project ID
        project_id: String,

        /// Filter by status (all, todo, in-progress, done)
        #[arg(short, long, default_value = "all")]
        status: String,
    },

    /// Show one task of a project
    Show {
        /// Project ID
        project_id: String,

        /// Task ID
        id: String,
    },

    /// Create a task in a project
    Create(TaskCreateArgs),

    /// Update a task
    Update(TaskUpdateArgs),

    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct TaskCreateArgs {
    /// Project ID
    pub project_id: String,

    /// Task title
    pub title: String,

    /// Task description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Status (todo, in-progress, done)
    #[arg(short, long, default_value = "todo")]
    pub status: String,

    /// Due date: YYYY-MM-DD, today, tomorrow (default: tomorrow)
    #[arg(long)]
    pub due: Option<String>,
}

#[derive(Args, Debug)]
pub struct TaskUpdateArgs {
    /// Task ID
    pub id: String,

    /// New title
    #[arg(long)]
    pub title: Option<String>,

    /// New description
    #[arg(short, long)]
    pub description: Option<String>,

    /// New status (todo, in-progress, done)
    #[arg(short, long)]
    pub status: Option<String>,

    /// New due date: YYYY-MM-DD, today, tomorrow
    #[arg(long)]
    pub due: Option<String>,
}

// ============================================================================
// Dashboard / Config
// ============================================================================

#[derive(Args, Debug)]
pub struct DashboardArgs {
    /// Case-insensitive project title search
    #[arg(long)]
    pub search: Option<String>,

    /// Filter projects by status (all, active, completed)
    #[arg(short, long, default_value = "all")]
    pub status: String,

    /// Filter tasks by status (all, todo, in-progress, done)
    #[arg(long, default_value = "all")]
    pub task_status: String,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the resolved configuration
    Show,

    /// Save configuration values
    Set {
        /// Backend base URL
        #[arg(long = "url")]
        url: Option<String>,

        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}
