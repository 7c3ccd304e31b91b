//! Terminal styling for command output.

use console::Style;

fn paint(style: Style, msg: &str) -> String {
    style.apply_to(msg).to_string()
}

fn marked(mark: &str, style: Style, msg: &str) -> String {
    format!("{} {}", style.apply_to(mark), msg)
}

/// `✓ msg`, mark in green.
pub fn success(msg: &str) -> String {
    marked("✓", Style::new().green(), msg)
}

/// `✗ msg`, mark in red.
pub fn error(msg: &str) -> String {
    marked("✗", Style::new().red(), msg)
}

pub fn header(msg: &str) -> String {
    paint(Style::new().bold(), msg)
}

pub fn dim(msg: &str) -> String {
    paint(Style::new().dim(), msg)
}

/// Labels for the `diff` change column.
pub fn added(msg: &str) -> String {
    paint(Style::new().green(), msg)
}

pub fn removed(msg: &str) -> String {
    paint(Style::new().red(), msg)
}

pub fn changed(msg: &str) -> String {
    paint(Style::new().yellow(), msg)
}
