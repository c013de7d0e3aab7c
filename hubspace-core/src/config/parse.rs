//! Minimal TOML parser for the engine configuration
//!
//! Handles only the subset the configuration needs. It does NOT
//! support all of TOML.
//!
//! Supported features:
//! - `[engine]` section header (keys may also appear before any header)
//! - Key = value pairs (integer, boolean)
//! - Decimal and `0x` hexadecimal integers
//! - Single-line integer arrays: `boot_commands = [0x09, 0x0A]`
//! - Comments (# ...)

use heapless::Vec;

use super::types::{ConfigError, EngineConfig, MAX_BOOT_COMMANDS};

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Engine,
}

/// Parse TOML text into an [`EngineConfig`]
///
/// Keys left out keep their default value. The result is validated.
pub fn parse_config(input: &str) -> Result<EngineConfig, ConfigError> {
    let mut config = EngineConfig::default();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = strip_comment(line).trim();

        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = parse_section_header(&line[1..line.len() - 1])?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ConfigError::InvalidValue)?;
        match section {
            Section::Root | Section::Engine => apply_value(&mut config, key, value)?,
        }
    }

    config.validate()?;
    Ok(config)
}

fn parse_section_header(header: &str) -> Result<Section, ConfigError> {
    match header.trim() {
        "engine" => Ok(Section::Engine),
        _ => Err(ConfigError::InvalidSection),
    }
}

/// Remove a trailing `# comment`
fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim()))
}

fn apply_value(config: &mut EngineConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "response_timeout_ms" => config.response_timeout_ms = parse_u32(value)?,
        "min_spacing_ms" => config.min_spacing_ms = parse_u32(value)?,
        "keepalive_interval_ms" => config.keepalive_interval_ms = parse_u32(value)?,
        "boot_settle_ms" => config.boot_settle_ms = parse_u32(value)?,
        "expectation_timeout_ms" => config.expectation_timeout_ms = parse_u32(value)?,
        "link_timeout_ms" => config.link_timeout_ms = parse_u32(value)?,
        "restore_on_boot" => config.restore_on_boot = parse_bool(value)?,
        "boot_commands" => config.boot_commands = parse_byte_array(value)?,
        _ => return Err(ConfigError::UnknownKey),
    }
    Ok(())
}

fn parse_u32(value: &str) -> Result<u32, ConfigError> {
    let value = value.trim();
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse::<u32>(),
    };
    parsed.map_err(|_| ConfigError::InvalidValue)
}

fn parse_bool(value: &str) -> Result<bool, ConfigError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::InvalidValue),
    }
}

fn parse_byte_array(value: &str) -> Result<Vec<u8, MAX_BOOT_COMMANDS>, ConfigError> {
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or(ConfigError::InvalidValue)?;

    let mut out = Vec::new();
    for item in inner.split(',') {
        let item = item.trim();
        // Trailing comma
        if item.is_empty() {
            continue;
        }
        let byte = u8::try_from(parse_u32(item)?).map_err(|_| ConfigError::InvalidValue)?;
        out.push(byte).map_err(|_| ConfigError::TooManyBootCommands)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
# Bridge engine configuration
[engine]
response_timeout_ms = 1500
min_spacing_ms = 60     # slower appliance
keepalive_interval_ms = 250
restore_on_boot = true
boot_commands = [0x09, 0x0A, 0x0E]
"#;

    #[test]
    fn test_parse_sample() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.response_timeout_ms, 1500);
        assert_eq!(config.min_spacing_ms, 60);
        assert_eq!(config.keepalive_interval_ms, 250);
        assert!(config.restore_on_boot);
        assert_eq!(config.boot_commands.as_slice(), &[0x09, 0x0A, 0x0E]);
        // Untouched keys keep defaults
        assert_eq!(config.boot_settle_ms, 100);
    }

    #[test]
    fn test_root_keys_combine_with_engine_section() {
        let config = parse_config(
            "keepalive_interval_ms = 300\nboot_commands = [0x0B]\n[engine]\nmin_spacing_ms = 70",
        )
        .unwrap();
        assert_eq!(config.keepalive_interval_ms, 300);
        assert_eq!(config.boot_commands.as_slice(), &[0x0B]);
        assert_eq!(config.min_spacing_ms, 70);

        // Zero checks apply wherever the key sits
        assert_eq!(
            parse_config("keepalive_interval_ms = 0\n[engine]"),
            Err(ConfigError::ZeroInterval)
        );
    }

    #[test]
    fn test_empty_input_is_default() {
        assert_eq!(parse_config("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_empty_boot_list() {
        let config = parse_config("boot_commands = []").unwrap();
        assert!(config.boot_commands.is_empty());
    }

    #[test]
    fn test_unknown_key() {
        assert_eq!(
            parse_config("[engine]\nbaud = 9600"),
            Err(ConfigError::UnknownKey)
        );
    }

    #[test]
    fn test_unknown_section() {
        assert_eq!(
            parse_config("[display]\nrows = 8"),
            Err(ConfigError::InvalidSection)
        );
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            parse_config("restore_on_boot = yes"),
            Err(ConfigError::InvalidValue)
        );
        assert_eq!(
            parse_config("min_spacing_ms = -5"),
            Err(ConfigError::InvalidValue)
        );
        assert_eq!(
            parse_config("boot_commands = [0x100]"),
            Err(ConfigError::InvalidValue)
        );
        assert_eq!(parse_config("no equals sign"), Err(ConfigError::InvalidValue));
    }

    #[test]
    fn test_boot_code_range_is_validated() {
        assert_eq!(
            parse_config("boot_commands = [0x09, 0x01]"),
            Err(ConfigError::BootCodeOutOfRange(0x01))
        );
    }

    #[test]
    fn test_too_many_boot_commands() {
        assert_eq!(
            parse_config("boot_commands = [9, 10, 11, 12, 13, 14, 9, 10, 11]"),
            Err(ConfigError::TooManyBootCommands)
        );
    }
}
