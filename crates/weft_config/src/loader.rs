//! Loading and validating `weft.toml`.

use crate::error::ConfigError;
use crate::resolve::resolve_clocks;
use crate::types::ProjectConfig;
use std::path::Path;

/// Name of the project file looked up in a project directory.
pub const CONFIG_FILE_NAME: &str = "weft.toml";

/// Loads `<project_dir>/weft.toml`.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    load_config_file(&project_dir.join(CONFIG_FILE_NAME))
}

/// Loads a project file from an explicit path.
pub fn load_config_file(path: &Path) -> Result<ProjectConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates project file text.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name".to_string()));
    }
    if config.project.input.is_empty() {
        return Err(ConfigError::MissingField("project.input".to_string()));
    }
    for (field, value) in [
        ("compile.max_inline_depth", config.compile.max_inline_depth),
        ("compile.max_unroll", config.compile.max_unroll),
        ("compile.max_states", config.compile.max_states),
    ] {
        if value == 0 {
            return Err(ConfigError::ValidationError(format!(
                "{field} must be at least 1"
            )));
        }
    }
    resolve_clocks(config)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let toml = r#"
[project]
name = "uart"
version = "1.2.0"
description = "uart transmitter"
top = "uart_tx"
input = "trace/uart.json"

[compile]
max_inline_depth = 32
max_unroll = 1024
max_states = 256
temporary_crossing = "deny"

[clocks.clk]
frequency = "100MHz"

[clocks.slow]
frequency = "32768Hz"
signal = "rtc_clk"

[output]
dir = "gen"
format = "json"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.project.name, "uart");
        assert_eq!(config.project.top.as_deref(), Some("uart_tx"));
        assert_eq!(config.compile.max_unroll, 1024);
        assert_eq!(config.clocks.len(), 2);
        assert_eq!(config.output.dir, "gen");
    }

    #[test]
    fn missing_name_errors() {
        let err = load_config_from_str("[project]\nname = \"\"\ninput = \"a.json\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(f) if f == "project.name"));
    }

    #[test]
    fn missing_input_errors() {
        let err = load_config_from_str("[project]\nname = \"x\"\ninput = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(f) if f == "project.input"));
    }

    #[test]
    fn zero_limit_errors() {
        let toml = "[project]\nname = \"x\"\ninput = \"a.json\"\n[compile]\nmax_unroll = 0\n";
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn bad_clock_frequency_errors() {
        let toml = "[project]\nname = \"x\"\ninput = \"a.json\"\n[clocks.clk]\nfrequency = \"fast\"\n";
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("not = [valid").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[project]\nname = \"d\"\ninput = \"d.json\"\n",
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.project.name, "d");
    }

    #[test]
    fn io_error_from_nonexistent_dir() {
        let err = load_config(Path::new("/nonexistent/weft/project")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
