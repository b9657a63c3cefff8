use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::cli::handlers::Context;
use crate::io::project_io;

/// File name to use when none is given: the directory's own name
fn infer_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "todo".to_string())
}

/// Reject names that would put the file somewhere else
fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("file name cannot be empty".to_string());
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(format!("invalid file name '{}'", name));
    }
    Ok(())
}

fn render_template(inbox: &str) -> String {
    format!("{}:\n", inbox)
}

pub fn cmd_init(ctx: &Context, args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let name = args.name.unwrap_or_else(|| infer_name(&ctx.cwd));
    validate_name(&name)?;

    let ext = &ctx.config.extension;
    let file_name = if name.to_lowercase().ends_with(&format!(".{}", ext.to_lowercase())) {
        name
    } else {
        format!("{}.{}", name, ext)
    };
    let path = ctx.cwd.join(&file_name);
    match project_io::create_project_text(&path, &render_template(&ctx.config.inbox)) {
        Err(e) if e.source.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(format!("{} already exists", path.display()).into());
        }
        other => other?,
    }
    log::info!("created {}", path.display());
    println!("Created {}", file_name);
    Ok(())
}
