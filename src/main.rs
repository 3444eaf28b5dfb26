//! Lifeline - a life timeline kept in git
//!
//! Binary entry point for the command-line interface.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use tracing_subscriber::EnvFilter;

use lifeline::backend::RewriteOutcome;
use lifeline::{InsertOutcome, Lifeline, NewEvent};

/// Environment variable holding the log filter
const LOG_ENV: &str = "LIFELINE_LOG";
const DEFAULT_LOG_FILTER: &str = "lifeline=warn";

/// Exit code when a rewrite stopped and needs manual resolution
const EXIT_NEEDS_RESOLUTION: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "lifeline", version, about = "Keep a life timeline in a git repository")]
struct Cli {
    /// Repository to operate on
    #[arg(short = 'C', long = "repo", global = true, default_value = ".")]
    repo: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record an event, keeping the timeline chronological
    Add {
        title: String,

        /// When the event happened (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Event type, from the configured list
        #[arg(long = "type")]
        event_type: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Files to copy next to the event
        #[arg(long, num_args = 1..)]
        media: Vec<PathBuf>,

        /// Start a new alternate timeline with this event
        #[arg(long)]
        branch: Option<String>,
    },

    /// List events in the current timeline
    List,

    /// List timelines
    Branches,

    /// Manage alternate timelines
    #[command(subcommand)]
    Branch(BranchCommand),

    /// Verify the current timeline is in chronological order
    Check,

    /// Finish or discard a rewrite paused on a conflict
    #[command(subcommand)]
    Rewrite(RewriteCommand),
}

#[derive(Subcommand, Debug)]
enum BranchCommand {
    /// Create a timeline and switch to it
    Create {
        name: String,

        /// Commit to branch from (default: the tip)
        #[arg(long)]
        commit: Option<String>,
    },

    /// Switch to another timeline
    Switch { name: String },
}

#[derive(Subcommand, Debug)]
enum RewriteCommand {
    Continue,
    Abort,
}

fn main() -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut lifeline = Lifeline::open(&cli.repo)
        .wrap_err_with(|| format!("Cannot open timeline at {}", cli.repo.display()))?;
    run(&mut lifeline, cli.command)
}

fn run(lifeline: &mut Lifeline, command: Command) -> color_eyre::Result<ExitCode> {
    match command {
        Command::Add {
            title,
            date,
            event_type,
            description,
            media,
            branch,
        } => {
            let input = NewEvent {
                title,
                date,
                event_type,
                description,
                media,
            };
            let outcome = lifeline.add_event(&input, branch.as_deref())?;
            return report_insert(lifeline, &outcome);
        }
        Command::List => {
            if let Some(branch) = lifeline.current_branch()? {
                println!("Timeline: {}", branch);
            }
            let events = lifeline.list_events()?;
            if events.is_empty() {
                println!("No events yet.");
            }
            for event in events {
                println!("{}  [{}] {}", event.date, event.event_type, event.title);
            }
        }
        Command::Branches => {
            for branch in lifeline.branches()? {
                println!("{} {}", branch.marker(), branch.name);
            }
        }
        Command::Branch(BranchCommand::Create { name, commit }) => {
            lifeline.create_branch(&name, commit.as_deref())?;
            println!("Created timeline {} and switched to it", name);
        }
        Command::Branch(BranchCommand::Switch { name }) => {
            lifeline.switch_branch(&name)?;
            println!("Switched to timeline {}", name);
        }
        Command::Check => {
            let report = lifeline.check()?;
            if report.is_chronological() {
                println!("{} commit(s) in chronological order", report.commits);
            } else {
                println!("Timeline is out of order:");
                for (earlier, later) in &report.violations {
                    println!(
                        "  {} {} ({}) comes before {} {} ({})",
                        earlier.id.short(),
                        earlier.message,
                        earlier.date(),
                        later.id.short(),
                        later.message,
                        later.date(),
                    );
                }
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Rewrite(RewriteCommand::Continue) => {
            if let RewriteOutcome::Conflict { detail } = lifeline.continue_rewrite()? {
                eprintln!("{}", detail);
                report_conflicted_files(lifeline)?;
                eprintln!("Resolve the conflict, stage the result, then run `lifeline rewrite continue`");
                return Ok(ExitCode::from(EXIT_NEEDS_RESOLUTION));
            }
            println!("Rewrite finished");
        }
        Command::Rewrite(RewriteCommand::Abort) => {
            lifeline.abort_rewrite()?;
            println!("Rewrite aborted; events added since remain at the tip");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn report_insert(lifeline: &Lifeline, outcome: &InsertOutcome) -> color_eyre::Result<ExitCode> {
    match outcome {
        InsertOutcome::Appended { commit } => {
            println!("Added {} as {}", commit.message, commit.id.short());
        }
        InsertOutcome::Relocated {
            commit,
            before,
            replayed,
        } => {
            println!(
                "Inserted {} before {} ({} commit(s) rewritten)",
                commit.id.short(),
                before.id.short(),
                replayed
            );
        }
        InsertOutcome::NeedsManualResolution {
            commit,
            before,
            detail,
        } => {
            eprintln!(
                "Event saved as {}, but moving it before {} hit a conflict:",
                commit.id.short(),
                before.id.short()
            );
            eprintln!("{}", detail);
            report_conflicted_files(lifeline)?;
            eprintln!(
                "Resolve it and run `lifeline rewrite continue`, or `lifeline rewrite abort` to keep the event at the tip"
            );
            return Ok(ExitCode::from(EXIT_NEEDS_RESOLUTION));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn report_conflicted_files(lifeline: &Lifeline) -> color_eyre::Result<()> {
    let files = lifeline.conflicted_files()?;
    if !files.is_empty() {
        eprintln!("Conflicted files:");
        for file in files {
            eprintln!("  {}", file.display());
        }
    }
    Ok(())
}
