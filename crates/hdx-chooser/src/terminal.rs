//! Plain-text front end
//!
//! Turns render requests into terminal output and input lines into
//! commands. Used by the `hdx-chooser` binary; kept free of I/O so it can be
//! tested directly.

use std::fmt::Write as _;

use crate::navigation::{NoticeLevel, RenderRequest};

const CRUMB_SEPARATOR: &str = " \u{bb} ";

pub const HELP: &str = "\
Commands:
  <n>        open item n
  /<text>    search datasets
  #<token>   restore a bookmark token
  ..         go up one level
  ?          show this help
  q, esc     close without choosing";

/// A parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Zero-based listing index
    Select(usize),
    Search(String),
    Restore(String),
    Up,
    Help,
    Cancel,
    Unknown(String),
}

/// Parse one input line; `None` for a blank line
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let command = match line {
        "q" | "quit" | "esc" | "\u{1b}" => Command::Cancel,
        ".." => Command::Up,
        "?" | "help" => Command::Help,
        _ => {
            if let Some(query) = line.strip_prefix('/') {
                Command::Search(query.trim().to_string())
            } else if let Some(token) = line.strip_prefix('#') {
                Command::Restore(token.to_string())
            } else {
                match line.parse::<usize>() {
                    Ok(n) if n > 0 => Command::Select(n - 1),
                    _ => Command::Unknown(line.to_string()),
                }
            }
        }
    };
    Some(command)
}

/// Format a screen
pub fn format_render(render: &RenderRequest) -> String {
    let mut out = String::new();

    let crumbs: Vec<String> = render
        .breadcrumbs
        .iter()
        .map(|crumb| {
            if crumb.current {
                format!("[{}]", crumb.label)
            } else {
                crumb.label.clone()
            }
        })
        .collect();

    let _ = writeln!(out, "== {} ==", render.page_title);
    let _ = writeln!(out, "{}", crumbs.join(CRUMB_SEPARATOR));
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", render.overview_title);
    for fact in &render.overview {
        let _ = writeln!(out, "  {}: {}", fact.label, fact.value);
    }
    let _ = writeln!(out, "  Bookmark: #{}", render.token);
    let _ = writeln!(out);

    let labels = render.listing.labels();
    if labels.is_empty() {
        let _ = writeln!(out, "  (nothing here)");
    }
    let width = labels.len().to_string().len();
    for (i, label) in labels.iter().enumerate() {
        let _ = writeln!(out, "  {:>width$}. {}", i + 1, label, width = width);
    }

    out
}

/// Format a notice line
pub fn format_notice(level: NoticeLevel, message: &str) -> String {
    let prefix = match level {
        NoticeLevel::Info => "note",
        NoticeLevel::Warning => "warning",
        NoticeLevel::Error => "error",
    };
    format!("{}: {}", prefix, message)
}
