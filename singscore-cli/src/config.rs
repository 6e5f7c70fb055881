use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use singscore_core::SessionConfig;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub live: LiveConfig,
}

#[derive(Debug, Deserialize)]
pub struct LiveConfig {
    #[serde(default)]
    pub stop_at_end: bool,
    /// How often the live display drains frame reports.
    #[serde(default = "default_display_interval_ms")]
    pub display_interval_ms: u64,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            stop_at_end: false,
            display_interval_ms: default_display_interval_ms(),
        }
    }
}

fn default_display_interval_ms() -> u64 {
    50
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    config.session.validate()?;
    Ok(config)
}

/// Explicit path first, then ./singscore.toml, then the platform config dir.
pub fn find_config(explicit: Option<PathBuf>) -> Option<PathBuf> {
    if explicit.is_some() {
        return explicit;
    }
    let local = PathBuf::from("singscore.toml");
    if local.exists() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join("singscore").join("config.toml"))
        .filter(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use singscore_core::ScoringPolicy;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn missing_sections_use_defaults() {
        let file = write_config("");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.session, SessionConfig::default());
        assert!(!config.live.stop_at_end);
        assert_eq!(config.live.display_interval_ms, 50);
    }

    #[test]
    fn nested_sections_override_fields() {
        let file = write_config(
            r#"
[session]
preferred_sample_rate = 48000

[session.analysis]
hop_size = 256

[session.scoring]
policy = "semitone_tolerance"
tolerance_semitones = 1.5

[session.scoring.gate]
min_confidence = 0.6

[live]
stop_at_end = true
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.session.preferred_sample_rate, 48000);
        assert_eq!(config.session.report_queue, 1024);
        assert_eq!(config.session.analysis.hop_size, 256);
        assert_eq!(config.session.analysis.window_size, 2048);
        assert_eq!(config.session.scoring.policy, ScoringPolicy::SemitoneTolerance);
        assert_eq!(config.session.scoring.gate.min_confidence, 0.6);
        assert_eq!(config.session.scoring.gate.max_pitch_hz, 600.0);
        assert!(config.live.stop_at_end);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let file = write_config("[session.analysis]\nhop_size = 0\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn explicit_path_wins() {
        let path = PathBuf::from("/nonexistent/custom.toml");
        assert_eq!(find_config(Some(path.clone())), Some(path));
    }
}
