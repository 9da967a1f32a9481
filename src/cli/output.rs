use colored::Colorize;
use std::fmt;
use std::sync::{OnceLock, RwLock};

use crate::config::Theme;

/// Message categories used by the CLI output helpers.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Warning,
    Error,
    Hint,
    Section,
}

static THEME: OnceLock<RwLock<Theme>> = OnceLock::new();

pub fn set_theme(theme: Theme) {
    let lock = THEME.get_or_init(|| RwLock::new(Theme::default()));
    if let Ok(mut guard) = lock.write() {
        *guard = theme;
    }
}

pub fn current_theme() -> Theme {
    THEME
        .get_or_init(|| RwLock::new(Theme::default()))
        .read()
        .map(|guard| *guard)
        .unwrap_or_default()
}

fn label(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::Info => "[i]",
        MessageKind::Success => "[+]",
        MessageKind::Warning => "[!]",
        MessageKind::Error => "[x]",
        MessageKind::Hint => "[?]",
        MessageKind::Section => "",
    }
}

fn apply_style(kind: MessageKind, message: impl fmt::Display, theme: Theme) -> String {
    let text = message.to_string();
    let formatted = match kind {
        MessageKind::Section => format!("=== {} ===", text.trim()),
        _ => format!("{} {}", label(kind), text),
    };

    // Dark terminals get the bright palette, light ones the regular colors.
    match (kind, theme) {
        (MessageKind::Section, _) => formatted.bold().to_string(),
        (MessageKind::Info, _) => formatted,
        (MessageKind::Success, Theme::Dark) => formatted.bright_green().to_string(),
        (MessageKind::Success, Theme::Light) => formatted.green().to_string(),
        (MessageKind::Warning, Theme::Dark) => formatted.bright_yellow().to_string(),
        (MessageKind::Warning, Theme::Light) => formatted.yellow().to_string(),
        (MessageKind::Error, Theme::Dark) => formatted.bright_red().to_string(),
        (MessageKind::Error, Theme::Light) => formatted.red().to_string(),
        (MessageKind::Hint, Theme::Dark) => formatted.bright_cyan().to_string(),
        (MessageKind::Hint, Theme::Light) => formatted.cyan().to_string(),
    }
}

pub fn print(kind: MessageKind, message: impl fmt::Display) {
    let formatted = apply_style(kind, message, current_theme());
    match kind {
        MessageKind::Section => println!("\n{}", formatted),
        _ => println!("{}", formatted),
    }
}

pub fn info(message: impl fmt::Display) {
    print(MessageKind::Info, message);
}

pub fn success(message: impl fmt::Display) {
    print(MessageKind::Success, message);
}

pub fn warning(message: impl fmt::Display) {
    print(MessageKind::Warning, message);
}

pub fn error(message: impl fmt::Display) {
    print(MessageKind::Error, message);
}

pub fn hint(message: impl fmt::Display) {
    print(MessageKind::Hint, message);
}

pub fn section(title: impl fmt::Display) {
    print(MessageKind::Section, title);
}

/// Prints pre-rendered text without a label.
pub fn plain(text: impl fmt::Display) {
    println!("{}", text);
}

/// Formats a money amount in the configured currency.
pub fn money(amount: f64, currency: &str) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let digits = format!("{:.2}", amount.abs());
    let (whole, cents) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));
    let mut grouped = String::new();
    for (idx, ch) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    match currency {
        "USD" => format!("{sign}${grouped}.{cents}"),
        "EUR" => format!("{sign}€{grouped}.{cents}"),
        "GBP" => format!("{sign}£{grouped}.{cents}"),
        other => format!("{sign}{grouped}.{cents} {other}"),
    }
}
