//! task-ledger
//!
//! Command-line frontend for the task lifecycle ledger: task and project
//! administration, lifecycle transitions, the overdue sweep, and report
//! generation.

use anyhow::Result;
use clap::Parser;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use task_ledger::cli::{Cli, Command, CreateArgs, TransitionArgs};
use task_ledger::cli::report::{day_end_ms, ReportArgs};
use task_ledger::config::Config;
use task_ledger::db::{now_ms, Database};
use task_ledger::format;
use task_ledger::lifecycle::Operation;
use task_ledger::types::Task;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    // Load configuration, then apply CLI overrides
    let mut config = match cli.config {
        Some(ref path) => Config::load_from(Path::new(path))?,
        None => Config::load()?,
    };
    if let Some(ref db_path) = cli.database {
        config.db_path = db_path.into();
    }

    config.ensure_db_dir()?;
    let db = Database::open(&config.db_path)?;

    match cli.command {
        Command::AddProject { name, description } => {
            let project = db.create_project(name, description)?;
            println!("Created project {} ({})", project.name, project.id);
        }
        Command::AddMember {
            name,
            skills,
            capacity,
        } => {
            let member = db.create_member(name, skills, capacity)?;
            println!("Created member {} ({})", member.name, member.id);
        }
        Command::Create(args) => {
            run_create(&db, args)?;
        }
        Command::Assign { task_id, member_id } => {
            let (task, warnings) = db.assign_task(&task_id, &member_id)?;
            for warning in &warnings {
                eprintln!("warning: {}", warning);
            }
            println!("Assigned '{}' to {}", task.title, member_id);
        }
        Command::Start(args) => {
            run_transition(&db, &config, args, Operation::Start)?;
        }
        Command::Complete(args) => {
            run_transition(&db, &config, args, Operation::Complete)?;
        }
        Command::MarkOverdue(args) => {
            run_transition(&db, &config, args, Operation::MarkOverdue)?;
        }
        Command::Reopen(args) => {
            run_transition(&db, &config, args, Operation::Reopen)?;
        }
        Command::History { task_id } => {
            run_history(&db, &task_id)?;
        }
        Command::List { project } => {
            let tasks = db.list_tasks(project.as_deref())?;
            println!("{} task(s)", tasks.len());
            for task in &tasks {
                print_task_line(task);
            }
        }
        Command::Sweep => {
            let swept = db.sweep_overdue(now_ms())?;
            println!("Swept {} task(s) overdue", swept.len());
        }
        Command::Report(args) => {
            run_report(&db, &config, args)?;
        }
    }

    Ok(())
}

/// Run the create command
fn run_create(db: &Database, args: CreateArgs) -> Result<()> {
    let deadline = args.deadline.as_deref().map(day_end_ms).transpose()?;

    let task = db.create_task(
        args.project,
        args.title,
        args.description,
        args.assignee,
        args.skills,
        deadline,
    )?;

    println!("Created task '{}' ({})", task.title, task.id);
    Ok(())
}

/// Run a lifecycle transition command
fn run_transition(
    db: &Database,
    config: &Config,
    args: TransitionArgs,
    op: Operation,
) -> Result<()> {
    let actor = args.actor.as_deref().unwrap_or(&config.default_actor);
    let task = db.transition(&args.task_id, op, actor)?;

    println!("{}: '{}' is now {}", op.as_str(), task.title, task.status);
    Ok(())
}

/// Run the history command
fn run_history(db: &Database, task_id: &str) -> Result<()> {
    let entries = db.task_history(task_id)?;

    println!("{} entr(ies) for task {}", entries.len(), task_id);
    for entry in &entries {
        println!(
            "  #{} {} -> {} by {} at {}",
            entry.id, entry.from_status, entry.to_status, entry.actor_id, entry.timestamp
        );
    }
    Ok(())
}

fn print_task_line(task: &Task) {
    let assignee = task
        .assignee_id
        .as_ref()
        .map(|a| format!(" @{}", a))
        .unwrap_or_default();
    println!(
        "  [{}] {} `{}`{}",
        task.status,
        task.title,
        &task.id[..8.min(task.id.len())],
        assignee
    );
}

/// Run the report command
fn run_report(db: &Database, config: &Config, args: ReportArgs) -> Result<()> {
    let params = args.to_parameters(&config.default_format)?;
    let aggregate = db.generate_report(&params)?;

    let output_format = format::resolve_format(&params.output_format);
    let rendered = format::render(&aggregate, output_format)?;
    let rendered_bytes = rendered.as_bytes();

    // Write output
    if let Some(ref path) = args.output {
        if args.gzip {
            // Write gzipped
            use flate2::Compression;
            use flate2::write::GzEncoder;

            let file = std::fs::File::create(path)?;
            let mut encoder = GzEncoder::new(file, Compression::default());
            encoder.write_all(rendered_bytes)?;
            encoder.finish()?;
            eprintln!("Report written to {} (gzipped)", path.display());
        } else {
            std::fs::write(path, &rendered)?;
            eprintln!("Report written to {}", path.display());
        }
        info!(report_id = %aggregate.id, path = %path.display(), "Report written");
    } else {
        print!("{}", rendered);
    }

    Ok(())
}
