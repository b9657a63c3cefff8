use clap::{Args, Parser, Subcommand};

use crate::model::config::Position;

#[derive(Parser)]
#[command(name = "na", about = concat!("na v", env!("CARGO_PKG_VERSION"), " - next actions from plain-text project files"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run as if started in DIR
    #[arg(short = 'C', long = "dir", value_name = "DIR", global = true)]
    pub dir: Option<String>,

    /// Project file extension (default from config: taskpaper)
    #[arg(long, value_name = "EXT", global = true)]
    pub ext: Option<String>,

    /// Print output directly instead of through $PAGER
    #[arg(long, global = true)]
    pub no_pager: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log what is being scanned, parsed and written (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List next actions (the default when no command is given)
    Next(NextArgs),
    /// List actions matching a tag query such as `due<2025-06-01` or `priority>=3`
    Tagged(TaggedArgs),
    /// Search action text by regex (case-insensitive)
    Find(FindArgs),
    /// Show the project tree of every file in scope
    Projects(ScopeArgs),
    /// Add an action to a project
    Add(AddArgs),
    /// Create a project file in the current directory
    Init(InitArgs),
}

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

#[derive(Args, Clone, Default)]
pub struct ScopeArgs {
    /// Directory levels to search below the current directory (0 = here only)
    #[arg(short, long)]
    pub depth: Option<usize>,
    /// Use this project file only (repeatable)
    #[arg(short, long = "file", value_name = "FILE", action = clap::ArgAction::Append)]
    pub file: Vec<String>,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args, Clone, Default)]
pub struct NextArgs {
    /// Tag that marks a next action (default from config: na)
    #[arg(short, long)]
    pub tag: Option<String>,
    /// Include finished (@done) actions
    #[arg(long)]
    pub done: bool,
    #[command(flatten)]
    pub scope: ScopeArgs,
}

#[derive(Args)]
pub struct TaggedArgs {
    /// Tag query: `key`, `key=value`, `key!=value`, `key<value`, `key*=part` ...
    pub query: String,
    /// Include finished (@done) actions
    #[arg(long)]
    pub done: bool,
    #[command(flatten)]
    pub scope: ScopeArgs,
}

#[derive(Args)]
pub struct FindArgs {
    /// Regex to search for
    pub pattern: String,
    /// Include finished (@done) actions
    #[arg(long)]
    pub done: bool,
    #[command(flatten)]
    pub scope: ScopeArgs,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Action text
    pub text: String,
    /// Project to add to, e.g. `Work/Backend` (default from config: Inbox)
    #[arg(short, long)]
    pub project: Option<String>,
    /// Where in the project: start or end (default from config: end)
    #[arg(long = "at", value_name = "POSITION")]
    pub at: Option<Position>,
    /// Add @priority(N)
    #[arg(long)]
    pub priority: Option<u32>,
    /// Note line under the action (repeatable)
    #[arg(short, long, action = clap::ArgAction::Append)]
    pub note: Vec<String>,
    /// Add the action already finished (@done with the current time)
    #[arg(long)]
    pub finish: bool,
    /// Project file to add to
    #[arg(short, long)]
    pub file: Option<String>,
    /// Directory levels to search for project files
    #[arg(short, long)]
    pub depth: Option<usize>,
}

#[derive(Args)]
pub struct InitArgs {
    /// File name without extension (default: the directory name)
    pub name: Option<String>,
}
