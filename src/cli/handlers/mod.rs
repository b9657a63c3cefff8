mod init;
pub use init::cmd_init;

use std::path::{Path, PathBuf};

use chrono::Local;
use crossterm::tty::IsTty;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::cli::pager::Pager;
use crate::io::config_io;
use crate::io::git;
use crate::io::project_io::load_project_file;
use crate::io::scanner::{self, ScanError, ScanOptions};
use crate::model::config::Config;
use crate::model::query::{MatchQuery, Scope, TagExpr};
use crate::ops::index::{ActionIndex, ActionMatch};
use crate::ops::insert::{self, InsertError, InsertOptions, NewAction};
use crate::ops::search;
use crate::parse::{ParseOptions, parse_tags};

/// Everything a command needs from the global flags and the config file
pub struct Context {
    pub config: Config,
    /// Directory the command runs in (`-C` or the current directory)
    pub cwd: PathBuf,
    pub json: bool,
    pub pager: bool,
    pub style: Style,
}

impl Context {
    pub fn new(cli: &Cli) -> Result<Self, Box<dyn std::error::Error>> {
        let cwd = match &cli.dir {
            Some(dir) => std::fs::canonicalize(dir)
                .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?,
            None => std::env::current_dir()?,
        };
        let config = apply_overrides(config_io::load_config(), cli);
        let tty = std::io::stdout().is_tty();
        let no_color_env = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());

        Ok(Context {
            pager: config.pager && !cli.json && tty,
            style: Style {
                color: config.color && tty && !no_color_env,
            },
            json: cli.json,
            cwd,
            config,
        })
    }

    fn parse_options(&self) -> ParseOptions {
        ParseOptions::from(&self.config)
    }

    fn absolute(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }
}

/// Per-invocation flags win over the config file.
fn apply_overrides(mut config: Config, cli: &Cli) -> Config {
    if let Some(ext) = &cli.ext {
        config.extension = ext.trim_start_matches('.').to_string();
    }
    if cli.no_color {
        config.color = false;
    }
    if cli.no_pager {
        config.pager = false;
    }
    config
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::new(&cli)?;

    match cli.command.unwrap_or(Commands::Next(NextArgs::default())) {
        // Read commands
        Commands::Next(args) => cmd_next(&ctx, args),
        Commands::Tagged(args) => cmd_tagged(&ctx, args),
        Commands::Find(args) => cmd_find(&ctx, args),
        Commands::Projects(args) => cmd_projects(&ctx, args),

        // Write commands
        Commands::Add(args) => cmd_add(&ctx, args),
        Commands::Init(args) => cmd_init(&ctx, args),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Decide which files a command looks at.
///
/// Explicit `--file`s win. Otherwise, inside a git repository with a project
/// file at its root, that file is the whole scope unless `--depth` asks for a
/// directory search. Everything else scans the working directory.
fn resolve_scope(ctx: &Context, args: &ScopeArgs) -> Scope {
    match args.file.as_slice() {
        [] => {}
        [one] => return Scope::File(ctx.absolute(one)),
        many => return Scope::Files(many.iter().map(|f| ctx.absolute(f)).collect()),
    }
    if args.depth.is_none()
        && ctx.config.git_scope
        && let Some(scope) = git::resolve_git_scope(&ctx.cwd, &ctx.config.extension)
    {
        return Scope::File(scope.file);
    }
    Scope::Directory {
        root: ctx.cwd.clone(),
        depth: args.depth.unwrap_or(ctx.config.depth),
    }
}

/// The index of a scope, plus the entries the scanner could not follow
struct Loaded {
    index: ActionIndex,
    scan_errors: Vec<ScanError>,
}

impl Loaded {
    /// Scan errors, unreadable files, then parse problems
    fn problems(&self) -> Vec<ProblemJson> {
        let mut problems: Vec<ProblemJson> =
            self.scan_errors.iter().map(scan_error_to_json).collect();
        problems.extend(self.index.failures().iter().map(load_error_to_json));
        problems.extend(
            self.index
                .parse_errors()
                .into_iter()
                .map(|(path, error)| problem_to_json(path, error)),
        );
        problems
    }
}

/// Discover and parse every file in scope. Files come shallowest first, then
/// in scan order.
fn load_index(ctx: &Context, scope: &Scope) -> Result<Loaded, Box<dyn std::error::Error>> {
    let mut discovery = scanner::discover(scope, &ScanOptions::from(&ctx.config))?;
    discovery.shallowest_first();
    if let Some(primary) = discovery.primary() {
        log::debug!("primary project file: {}", primary.path.display());
    }
    let index = ActionIndex::build(discovery.paths(), &ctx.parse_options());
    if index.is_empty() && !ctx.json {
        eprintln!(
            "no .{} files found in {}",
            ctx.config.extension,
            ctx.cwd.display()
        );
    }
    Ok(Loaded {
        index,
        scan_errors: discovery.errors,
    })
}

/// Parse problems go to the log (text output) or into the JSON document.
/// Scan and read failures were already logged where they happened.
fn report_problems(index: &ActionIndex) {
    for (path, error) in index.parse_errors() {
        log::warn!("{}: {}", path.display(), error);
    }
}

fn emit(ctx: &Context, lines: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let mut pager = Pager::start(ctx.pager);
    pager.write_lines(lines)?;
    pager.finish()?;
    Ok(())
}

fn emit_matches(
    ctx: &Context,
    loaded: &Loaded,
    matches: &[ActionMatch<'_>],
) -> Result<(), Box<dyn std::error::Error>> {
    if ctx.json {
        let doc = ActionListJson {
            actions: matches.iter().map(action_to_json).collect(),
            problems: loaded.problems(),
        };
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }
    report_problems(&loaded.index);
    emit(ctx, &format_action_list(matches, ctx.style))
}

/// `Work/Backend`, `Work:Backend` or `Work > Backend` as a list of titles
pub fn split_project_path(path: &str) -> Vec<String> {
    path.split(['/', ':', '>'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Add the next-action tag, priority and done markers to an action's text.
pub fn build_action_text(
    text: &str,
    tag: &str,
    priority: Option<u32>,
    finished: Option<&str>,
) -> String {
    let mut out = text.trim().to_string();
    let existing = parse_tags(&out).tags;
    let tag = tag.trim_start_matches('@');
    if finished.is_none() && !tag.is_empty() && !existing.iter().any(|t| t.has_key(tag)) {
        out.push_str(&format!(" @{}", tag));
    }
    if let Some(p) = priority
        && !existing.iter().any(|t| t.has_key("priority"))
    {
        out.push_str(&format!(" @priority({})", p));
    }
    if let Some(when) = finished {
        out.push_str(&format!(" @done({})", when));
    }
    out
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_next(ctx: &Context, args: NextArgs) -> Result<(), Box<dyn std::error::Error>> {
    let tag_name = args.tag.as_deref().unwrap_or(&ctx.config.tag);
    let tag: TagExpr = tag_name.parse()?;
    let scope = resolve_scope(ctx, &args.scope);
    let loaded = load_index(ctx, &scope)?;

    let mut query = MatchQuery::new(tag, scope);
    query.include_done = args.done;
    let matches = loaded.index.query(&query);
    log::debug!("{} match(es) for {}", matches.len(), query.tag);
    emit_matches(ctx, &loaded, &matches)
}

fn cmd_tagged(ctx: &Context, args: TaggedArgs) -> Result<(), Box<dyn std::error::Error>> {
    let tag: TagExpr = args.query.parse()?;
    let scope = resolve_scope(ctx, &args.scope);
    let loaded = load_index(ctx, &scope)?;

    let mut query = MatchQuery::new(tag, scope);
    query.include_done = args.done;
    let matches = loaded.index.query(&query);
    emit_matches(ctx, &loaded, &matches)
}

fn cmd_find(ctx: &Context, args: FindArgs) -> Result<(), Box<dyn std::error::Error>> {
    let re = search::build_pattern(&args.pattern)?;
    let scope = resolve_scope(ctx, &args.scope);
    let loaded = load_index(ctx, &scope)?;
    let hits = search::search_actions(&loaded.index, &re, Some(&scope), args.done);

    if ctx.json {
        let doc = ActionListJson {
            actions: hits.iter().map(|h| action_to_json(&h.found)).collect(),
            problems: loaded.problems(),
        };
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }
    report_problems(&loaded.index);
    emit(ctx, &format_search_hits(&hits, ctx.style))
}

fn cmd_projects(ctx: &Context, args: ScopeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let scope = resolve_scope(ctx, &args);
    let loaded = load_index(ctx, &scope)?;
    let listing = loaded.index.projects();

    if ctx.json {
        let doc: Vec<ProjectFileJson> = listing
            .iter()
            .map(|(file, entries)| ProjectFileJson {
                file: file.path.display().to_string(),
                projects: entries.iter().map(project_to_json).collect(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    report_problems(&loaded.index);
    let mut lines = Vec::new();
    for (file, entries) in &listing {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.extend(format_project_tree(&file.display_name(), entries, ctx.style));
    }
    emit(ctx, &lines)
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(ctx: &Context, args: AddArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.text.trim().is_empty() {
        return Err(InsertError::EmptyAction.into());
    }
    let project_path = split_project_path(args.project.as_deref().unwrap_or(&ctx.config.inbox));
    let position = args.at.unwrap_or(ctx.config.position);
    let finished = args
        .finish
        .then(|| Local::now().format("%Y-%m-%d %H:%M").to_string());
    let text = build_action_text(&args.text, &ctx.config.tag, args.priority, finished.as_deref());
    let action = NewAction {
        text,
        notes: args.note,
    };
    let opts = InsertOptions::from(&ctx.config);

    let target = match &args.file {
        Some(file) => {
            let file = load_project_file(&ctx.absolute(file), &opts.parse)?;
            insert::resolve(&file, &project_path, position, &opts)?
        }
        None => {
            let scope = resolve_scope(
                ctx,
                &ScopeArgs {
                    depth: args.depth,
                    file: Vec::new(),
                },
            );
            let loaded = load_index(ctx, &scope)?;
            match insert::resolve_in_index(&loaded.index, &project_path, position, &opts) {
                Err(InsertError::NoFile) => {
                    return Err(format!(
                        "no .{} file to add to (run `na init` or pass --file)",
                        ctx.config.extension
                    )
                    .into());
                }
                other => other?,
            }
        }
    };
    let updated = insert::apply(&target, &action, &opts)?;

    // The first non-blank line of the new action, now in the re-parsed file
    let line = target.line + target.create.len();
    if ctx.json {
        let doc = AddedJson {
            file: updated.path.display().to_string(),
            project: target.project_path.clone(),
            line: line + 1,
            text: action.text.clone(),
        };
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        println!(
            "{}",
            format_added(&updated.path, &target.project_path, &action.text, ctx.style)
        );
    }
    Ok(())
}
