use crate::model::project::Project;

/// Render a project tree in canonical form.
///
/// Each project emits its title line, then its notes, then its actions (each
/// followed by its own notes one level deeper), then its sub-projects.
/// Re-parsing the output yields a structurally identical tree.
pub fn serialize_outline(root: &Project, indent_unit: &str, action_prefix: &str) -> String {
    let mut lines = Vec::new();
    serialize_project(root, indent_unit, action_prefix, &mut lines);
    if lines.is_empty() {
        return String::new();
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn serialize_project(
    project: &Project,
    indent_unit: &str,
    action_prefix: &str,
    lines: &mut Vec<String>,
) {
    if !project.is_root() {
        let mut title = format!(
            "{}{}:",
            indent_unit.repeat(project.depth - 1),
            project.title
        );
        for tag in &project.tags {
            title.push_str(&format!(" {}", tag));
        }
        lines.push(title);
    }

    let inner = indent_unit.repeat(project.depth);
    for note in &project.notes {
        lines.push(format!("{}{}", inner, note));
    }
    for action in &project.actions {
        lines.push(format!("{}{}{}", inner, action_prefix, action.text).trim_end().to_string());
        for note in &action.notes {
            lines.push(format!("{}{}{}", inner, indent_unit, note));
        }
    }
    for child in &project.children {
        serialize_project(child, indent_unit, action_prefix, lines);
    }
}
