//! Resolution of `[clocks]` entries into typed frequencies.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use weft_common::Frequency;

/// A clock entry with its frequency parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedClock {
    /// Table key.
    pub name: String,
    /// Name of the clock signal in the design.
    pub signal: String,
    /// Parsed frequency.
    pub frequency: Frequency,
}

/// Parses every `[clocks.<name>]` entry, in key order.
///
/// The signal name falls back to the table key when not given.
pub fn resolve_clocks(config: &ProjectConfig) -> Result<Vec<ResolvedClock>, ConfigError> {
    config
        .clocks
        .iter()
        .map(|(name, def)| {
            let frequency = def
                .frequency
                .parse::<Frequency>()
                .map_err(|e| ConfigError::ValidationError(format!("clocks.{name}: {e}")))?;
            Ok(ResolvedClock {
                name: name.clone(),
                signal: def.signal.clone().unwrap_or_else(|| name.clone()),
                frequency,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    #[test]
    fn resolves_in_key_order_with_signal_fallback() {
        let toml = r#"
[project]
name = "x"
input = "x.json"

[clocks.sys]
frequency = "50MHz"

[clocks.aux]
frequency = "1kHz"
signal = "aux_clk"
"#;
        let config = load_config_from_str(toml).unwrap();
        let clocks = resolve_clocks(&config).unwrap();
        assert_eq!(clocks.len(), 2);
        assert_eq!(clocks[0].name, "aux");
        assert_eq!(clocks[0].signal, "aux_clk");
        assert_eq!(clocks[0].frequency.hz(), 1_000.0);
        assert_eq!(clocks[1].signal, "sys");
        assert_eq!(clocks[1].frequency.mhz(), 50.0);
    }
}
