//! Configuration types deserialized from `weft.toml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The whole project file.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Project metadata.
    pub project: ProjectMeta,
    /// Compile limits and policies.
    #[serde(default)]
    pub compile: CompileConfig,
    /// Named clocks with frequency metadata.
    #[serde(default)]
    pub clocks: BTreeMap<String, ClockDef>,
    /// Where and how results are written.
    #[serde(default)]
    pub output: OutputConfig,
}

/// `[project]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectMeta {
    /// Project name.
    pub name: String,
    /// Project version.
    #[serde(default = "default_version")]
    pub version: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Entity name of the compiled design. Defaults to the name in the input tree.
    #[serde(default)]
    pub top: Option<String>,
    /// Path of the tracer output (JSON) relative to the project directory.
    pub input: String,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// `[compile]` table: limits that keep compile-time evaluation finite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    /// Maximum depth of nested inlined calls before recursion is reported as
    /// unbounded.
    pub max_inline_depth: usize,
    /// Maximum number of iterations of a single unrolled loop.
    pub max_unroll: usize,
    /// Maximum number of states synthesized for one context.
    pub max_states: usize,
    /// What to do when a temporary is used across a state boundary.
    pub temporary_crossing: CrossingPolicy,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            max_inline_depth: 64,
            max_unroll: 65_536,
            max_states: 4_096,
            temporary_crossing: CrossingPolicy::Warn,
        }
    }
}

/// Handling of temporaries referenced outside the state that computed them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossingPolicy {
    /// Emit nothing.
    Allow,
    /// Emit a warning and keep compiling (default).
    #[default]
    Warn,
    /// Fail the context.
    Deny,
}

/// `[clocks.<name>]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct ClockDef {
    /// Frequency string such as `"50MHz"`.
    pub frequency: String,
    /// Name of the clock signal in the design. Defaults to the table key.
    #[serde(default)]
    pub signal: Option<String>,
}

/// `[output]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory relative to the project directory.
    pub dir: String,
    /// Format of the lowered design.
    pub format: EmitFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "out".to_string(),
            format: EmitFormat::Text,
        }
    }
}

/// Format of the emitted lowered design.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmitFormat {
    /// Indented neutral listing.
    #[default]
    Text,
    /// The lowered model serialized as JSON.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    const MINIMAL: &str = r#"
[project]
name = "blink"
input = "build/blink.json"
"#;

    #[test]
    fn compile_defaults() {
        let config = load_config_from_str(MINIMAL).unwrap();
        assert_eq!(config.compile, CompileConfig::default());
        assert_eq!(config.compile.temporary_crossing, CrossingPolicy::Warn);
        assert_eq!(config.project.version, "0.1.0");
        assert!(config.project.top.is_none());
    }

    #[test]
    fn crossing_policy_variants() {
        for (input, expected) in [
            ("allow", CrossingPolicy::Allow),
            ("warn", CrossingPolicy::Warn),
            ("deny", CrossingPolicy::Deny),
        ] {
            let toml = format!("{MINIMAL}\n[compile]\ntemporary_crossing = \"{input}\"\n");
            let config = load_config_from_str(&toml).unwrap();
            assert_eq!(config.compile.temporary_crossing, expected);
        }
    }

    #[test]
    fn partial_compile_table_keeps_other_defaults() {
        let toml = format!("{MINIMAL}\n[compile]\nmax_states = 16\n");
        let config = load_config_from_str(&toml).unwrap();
        assert_eq!(config.compile.max_states, 16);
        assert_eq!(config.compile.max_inline_depth, 64);
    }

    #[test]
    fn output_format_json() {
        let toml = format!("{MINIMAL}\n[output]\nformat = \"json\"\n");
        let config = load_config_from_str(&toml).unwrap();
        assert_eq!(config.output.format, EmitFormat::Json);
        assert_eq!(config.output.dir, "out");
    }
}
