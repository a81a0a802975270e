use codes_core::{AppViewModel, CodeRowView, EmptyState};

const CODE_WIDTH: usize = 10;
const CONTACT_WIDTH: usize = 28;

/// Renders the view model as plain text, one row per code.
pub fn render(view: &AppViewModel) -> String {
    let mut lines = Vec::new();

    if let Some(banner) = &view.banner {
        lines.push(format!("! {banner}"));
    }
    if view.is_loading {
        lines.push("refreshing...".to_string());
    }
    if view.is_deleting {
        lines.push("deleting...".to_string());
    }

    match view.empty_state {
        EmptyState::NotConfigured => {
            lines.push("No endpoint configured. Run `codes config set --endpoint <URL>`.".to_string());
        }
        EmptyState::NoCodes => lines.push("No verification codes.".to_string()),
        EmptyState::None => lines.extend(view.rows.iter().map(render_row)),
    }

    if let Some(footer) = render_footer(view) {
        lines.push(footer);
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn render_footer(view: &AppViewModel) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(label) = &view.last_refresh_label {
        parts.push(format!("last refresh {label}"));
    }
    if view.auto_refresh_secs > 0 {
        parts.push(format!("auto-refresh {}s", view.auto_refresh_secs));
    }
    match view.dark_mode {
        Some(true) => parts.push("dark theme".to_string()),
        Some(false) => parts.push("light theme".to_string()),
        None => {}
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" | "))
    }
}

fn render_row(row: &CodeRowView) -> String {
    let mut line = format!(
        "{:<code_w$} {:<contact_w$} {} ({})",
        row.code,
        row.contact,
        row.relative_time,
        row.absolute_time,
        code_w = CODE_WIDTH,
        contact_w = CONTACT_WIDTH,
    );
    if let Some(source) = &row.source {
        line.push_str(&format!("  from {source}"));
    }
    if row.copied {
        line.push_str("  [copied]");
    }
    line
}
