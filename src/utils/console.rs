// src/utils/console.rs

//! Human-facing console output with server-style formatting.
//!
//! Diagnostics go through the `log` facade; this module renders the
//! operator report (headers, steps, indented items, summaries).

use std::sync::OnceLock;

use chrono::Local;

/// Console verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "debug" | "trace" => Level::Debug,
            "info" => Level::Info,
            "warn" | "warning" => Level::Warn,
            "error" | "critical" => Level::Error,
            _ => Level::Info,
        }
    }
}

static LEVEL: OnceLock<Level> = OnceLock::new();

/// Set the console level once; later calls are ignored.
pub fn init(level: &str) {
    let _ = LEVEL.set(Level::parse(level));
}

fn should_print(level: Level) -> bool {
    level >= LEVEL.get().copied().unwrap_or(Level::Info)
}

fn format_line(level: Level, message: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    format!("[{}] [{}] {}", timestamp, level.as_str(), message)
}

pub fn info(message: &str) {
    if should_print(Level::Info) {
        println!("{}", format_line(Level::Info, message));
    }
}

pub fn warn(message: &str) {
    if should_print(Level::Warn) {
        eprintln!("{}", format_line(Level::Warn, message));
    }
}

pub fn error(message: &str) {
    if should_print(Level::Error) {
        eprintln!("{}", format_line(Level::Error, message));
    }
}

/// Always shown, regardless of level.
pub fn success(message: &str) {
    println!("{}", format_line(Level::Info, &format!("✓ {}", message)));
}

pub fn step(step_num: usize, total: usize, message: &str) {
    if should_print(Level::Info) {
        let msg = format!("[ETAPA {}/{}] {}", step_num, total, message);
        println!("{}", format_line(Level::Info, &msg));
    }
}

pub fn separator() {
    if should_print(Level::Info) {
        println!("{}", "─".repeat(70));
    }
}

pub fn header(title: &str) {
    if should_print(Level::Info) {
        println!("{}", "═".repeat(70));
        println!("  {}", title);
        println!("{}", "═".repeat(70));
    }
}

pub fn sub_item(message: &str) {
    if should_print(Level::Info) {
        println!("    {}", message);
    }
}

pub fn summary(title: &str, items: &[(&str, String)]) {
    if should_print(Level::Info) {
        println!();
        println!("{}", format_line(Level::Info, &format!("[RESUMO] {}", title)));
        for (key, value) in items {
            println!("    {}: {}", key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
    }

    #[test]
    fn test_level_parse() {
        assert_eq!(Level::parse("debug"), Level::Debug);
        assert_eq!(Level::parse("INFO"), Level::Info);
        assert_eq!(Level::parse("CRITICAL"), Level::Error);
        assert_eq!(Level::parse("unknown"), Level::Info);
    }
}
