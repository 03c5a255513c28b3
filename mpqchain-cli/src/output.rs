use crate::{opts, OutputFormat};
use colored::*;
use serde::Serialize;
use std::io;

/// Print output according to the global format settings
pub fn print_output<T: Serialize>(data: &T) -> Result<(), io::Error> {
    let opts = opts();

    if opts.quiet {
        return Ok(());
    }

    match opts.output {
        OutputFormat::Json => print_json(data),
        OutputFormat::Csv => print_csv(data),
        OutputFormat::Text => Ok(()), // Text output is handled by individual commands
    }
}

/// Print JSON output
pub fn print_json<T: Serialize>(data: &T) -> Result<(), io::Error> {
    let json = serde_json::to_string_pretty(data)?;
    println!("{}", json);
    Ok(())
}

/// Print CSV output
///
/// Arrays print one row per element; a single object prints one row.
pub fn print_csv<T: Serialize>(data: &T) -> Result<(), io::Error> {
    let rows = match serde_json::to_value(data)? {
        serde_json::Value::Array(rows) => rows,
        other => vec![other],
    };

    if let Some(serde_json::Value::Object(obj)) = rows.first() {
        println!("{}", obj.keys().cloned().collect::<Vec<_>>().join(","));
    }

    for row in rows {
        if let serde_json::Value::Object(obj) = row {
            let values: Vec<String> = obj.values().map(csv_field).collect();
            println!("{}", values.join(","));
        }
    }

    Ok(())
}

fn csv_field(value: &serde_json::Value) -> String {
    let text = match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    };
    if text.contains([',', '"', '\n']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text
    }
}

/// Print verbose message (only if verbose mode is on)
pub fn verbose_println(level: u8, message: &str) {
    let opts = opts();

    if !opts.quiet && opts.verbose >= level {
        eprintln!("{} {}", "[VERBOSE]".dimmed(), message);
    }
}

/// Check if we should use color
pub fn use_color() -> bool {
    let opts = opts();
    !opts.no_color && opts.output == OutputFormat::Text
}

/// Print a `label: value` line, bold label when colors are on
pub fn field(label: &str, value: impl std::fmt::Display) {
    if use_color() {
        println!("  {:<22} {}", format!("{label}:").bold(), value);
    } else {
        println!("  {:<22} {}", format!("{label}:"), value);
    }
}

/// Print a section heading
pub fn heading(title: &str) {
    if use_color() {
        println!("{}", title.bold().underline());
    } else {
        println!("{}", title);
    }
}
