//! Shared styling helpers for CLI output.

use std::io::IsTerminal;

use owo_colors::OwoColorize;

fn should_color() -> bool {
    std::io::stdout().is_terminal()
}

#[derive(Debug, Clone, Copy)]
enum Tone {
    Green,
    Yellow,
    Red,
    Cyan,
    Dim,
}

fn paint(text: &str, tone: Tone) -> String {
    if !should_color() {
        return text.to_string();
    }
    match tone {
        Tone::Green => text.green().to_string(),
        Tone::Yellow => text.yellow().to_string(),
        Tone::Red => text.red().to_string(),
        Tone::Cyan => text.cyan().to_string(),
        Tone::Dim => text.dimmed().to_string(),
    }
}

pub fn success(text: impl AsRef<str>) -> String {
    paint(text.as_ref(), Tone::Green)
}

pub fn warning(text: impl AsRef<str>) -> String {
    paint(text.as_ref(), Tone::Yellow)
}

pub fn error(text: impl AsRef<str>) -> String {
    paint(text.as_ref(), Tone::Red)
}

pub fn accent(text: impl AsRef<str>) -> String {
    paint(text.as_ref(), Tone::Cyan)
}

/// Colors one line of a partition summary by its `+`/`~`/`-` marker.
pub fn change_line(line: &str) -> String {
    let tone = match line.trim_start().chars().next() {
        Some('+') => Tone::Green,
        Some('~') => Tone::Yellow,
        Some('-') => Tone::Red,
        Some('x') => Tone::Dim,
        _ => Tone::Cyan,
    };
    paint(line, tone)
}
