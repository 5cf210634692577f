//! CLI command definitions for task-ledger
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod report;

use clap::{Args, Parser, Subcommand};
use report::ReportArgs;

/// Task lifecycle ledger and reporting CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a project
    AddProject {
        /// Project name
        name: String,

        /// Optional description
        #[arg(long)]
        description: Option<String>,
    },

    /// Create a member
    AddMember {
        /// Member name
        name: String,

        /// Skill the member covers (repeatable)
        #[arg(long = "skill")]
        skills: Vec<String>,

        /// Maximum concurrently in-progress tasks
        #[arg(long)]
        capacity: Option<i32>,
    },

    /// Create a task
    Create(CreateArgs),

    /// Assign a task to a member (validated by the assignment rules)
    Assign {
        /// Task id
        task_id: String,

        /// Member id
        member_id: String,
    },

    /// Start a task
    Start(TransitionArgs),

    /// Complete a task
    Complete(TransitionArgs),

    /// Mark a task overdue
    MarkOverdue(TransitionArgs),

    /// Reopen a completed task
    Reopen(TransitionArgs),

    /// Show a task's transition ledger
    History {
        /// Task id
        task_id: String,
    },

    /// List tasks
    List {
        /// Scope to a project id
        #[arg(long)]
        project: Option<String>,
    },

    /// Mark every task with a passed deadline as overdue (system actor)
    Sweep,

    /// Generate a report over a date window
    Report(ReportArgs),
}

/// Arguments for creating a task.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Task title
    pub title: String,

    /// Project id the task belongs to
    #[arg(long)]
    pub project: Option<String>,

    /// Optional description
    #[arg(long)]
    pub description: Option<String>,

    /// Member id to assign immediately
    #[arg(long)]
    pub assignee: Option<String>,

    /// Skill the assignee must cover (repeatable)
    #[arg(long = "skill")]
    pub skills: Vec<String>,

    /// Deadline date (YYYY-MM-DD, end of day)
    #[arg(long)]
    pub deadline: Option<String>,
}

/// Arguments shared by the lifecycle transition commands.
#[derive(Args, Debug)]
pub struct TransitionArgs {
    /// Task id
    pub task_id: String,

    /// Actor id recorded in the ledger (defaults from config)
    #[arg(long)]
    pub actor: Option<String>,
}
