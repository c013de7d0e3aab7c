//! Build script for hubspace-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates hubspace.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Timing keys the runtime parser understands
const TIMING_KEYS: &[&str] = &[
    "response_timeout_ms",
    "min_spacing_ms",
    "keepalive_interval_ms",
    "boot_settle_ms",
    "expectation_timeout_ms",
    "link_timeout_ms",
];

/// Must match `MAX_BOOT_COMMANDS` in hubspace-core
const MAX_BOOT_COMMANDS: usize = 8;

/// Codes the appliance accepts during power-up
const BOOT_CODES: std::ops::RangeInclusive<i64> = 0x09..=0x0E;

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate hubspace.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=hubspace.toml");

    let config_path = Path::new("hubspace.toml");

    if !config_path.exists() {
        fail(
            "hubspace.toml not found",
            &["The firmware embeds hubspace.toml from the crate directory."],
        );
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read hubspace.toml", &[&e.to_string()]),
    };

    let config: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            let msg = e.to_string();
            let lines: Vec<&str> = msg.lines().collect();
            fail("Invalid TOML syntax in hubspace.toml", &lines)
        }
    };

    let errors = validate_engine(&config);
    if !errors.is_empty() {
        let lines: Vec<&str> = errors.iter().map(String::as_str).collect();
        fail("Invalid engine configuration", &lines);
    }

    println!("cargo:warning=hubspace.toml validated successfully");
}

/// Check the configuration against what the firmware will accept
///
/// Like the runtime parser, keys may sit at the top level (before any
/// header) or under `[engine]`.
fn validate_engine(config: &toml::Value) -> Vec<String> {
    let mut errors = Vec::new();

    let table = match config.as_table() {
        Some(t) => t,
        None => return errors,
    };

    let mut keys: Vec<(&String, &toml::Value)> = Vec::new();
    for (name, value) in table {
        match value {
            toml::Value::Table(engine) if name == "engine" => keys.extend(engine),
            toml::Value::Table(_) => errors.push(format!("unknown section [{}]", name)),
            _ if name == "engine" => errors.push("[engine] must be a table".to_string()),
            _ => keys.push((name, value)),
        }
    }

    for (key, value) in keys {
        match key.as_str() {
            k if TIMING_KEYS.contains(&k) => match value {
                toml::Value::Integer(0)
                    if k == "response_timeout_ms" || k == "keepalive_interval_ms" =>
                {
                    errors.push(format!("{} must not be 0", key))
                }
                toml::Value::Integer(ms) if (0..=i64::from(u32::MAX)).contains(ms) => {}
                _ => errors.push(format!("{} must be an integer 0-{}", key, u32::MAX)),
            },
            "restore_on_boot" => {
                if !value.is_bool() {
                    errors.push("restore_on_boot must be true or false".to_string());
                }
            }
            "boot_commands" => validate_boot_commands(value, &mut errors),
            _ => errors.push(format!("unknown key '{}'", key)),
        }
    }

    errors
}

fn validate_boot_commands(value: &toml::Value, errors: &mut Vec<String>) {
    let codes = match value.as_array() {
        Some(codes) => codes,
        None => {
            errors.push("boot_commands must be an array".to_string());
            return;
        }
    };

    if codes.len() > MAX_BOOT_COMMANDS {
        errors.push(format!(
            "boot_commands holds at most {} entries",
            MAX_BOOT_COMMANDS
        ));
    }

    for code in codes {
        match code.as_integer() {
            Some(c) if BOOT_CODES.contains(&c) => {}
            _ => errors.push(format!("boot command {} outside 0x09-0x0E", code)),
        }
    }
}

/// Abort the build with a boxed error message
fn fail(title: &str, lines: &[&str]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        {}\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        format_line(&format!("ERROR: {}", title)),
        lines
            .iter()
            .map(|l| format_line(l))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Pad or truncate a line to the box width
fn format_line(line: &str) -> String {
    let truncated = if line.chars().count() > 64 {
        format!("{}...", line.chars().take(61).collect::<String>())
    } else {
        line.to_string()
    };
    format!("║  {:<64} ║", truncated)
}
