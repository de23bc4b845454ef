//! Interactive prompt helpers for review flows.

use std::io::{self, IsTerminal, Write};

use dialoguer::{theme::ColorfulTheme, Confirm, Select};

fn use_dialoguer() -> bool {
    std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
}

/// Answer to a per-change review question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Review {
    Accept,
    Reject,
    AcceptRest,
    RejectRest,
}

const REVIEW_OPTIONS: [&str; 4] = ["accept", "reject", "accept rest", "reject rest"];

pub(crate) fn prompt_review(label: &str) -> anyhow::Result<Review> {
    let index = if use_dialoguer() {
        let theme = ColorfulTheme::default();
        Select::with_theme(&theme)
            .with_prompt(label)
            .items(&REVIEW_OPTIONS)
            .default(0)
            .interact()?
    } else {
        print!("{label} [a]ccept/[r]eject/[A]ccept rest/[R]eject rest (a): ");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        match line.trim() {
            "" | "a" | "accept" => 0,
            "r" | "reject" => 1,
            "A" => 2,
            "R" => 3,
            other => anyhow::bail!("Unknown answer '{other}'. Expected a, r, A or R."),
        }
    };
    Ok(match index {
        0 => Review::Accept,
        1 => Review::Reject,
        2 => Review::AcceptRest,
        _ => Review::RejectRest,
    })
}

pub(crate) fn prompt_yes_no(label: &str, default: bool) -> anyhow::Result<bool> {
    if use_dialoguer() {
        let theme = ColorfulTheme::default();
        let confirmed = Confirm::with_theme(&theme)
            .with_prompt(label)
            .default(default)
            .interact()?;
        return Ok(confirmed);
    }
    let default_text = if default { "Y/n" } else { "y/N" };
    print!("{label} [{default_text}]: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    match line.trim().to_ascii_lowercase().as_str() {
        "" => Ok(default),
        "y" | "yes" => Ok(true),
        "n" | "no" => Ok(false),
        _ => anyhow::bail!("Please answer yes or no."),
    }
}
