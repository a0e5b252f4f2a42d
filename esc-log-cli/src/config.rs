//! Configuration loading and parsing

use anyhow::{Context, Result};
use esc_log_decoder::DecoderConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from a TOML file)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Trace to decode, unless given on the command line
    pub input: Option<PathBuf>,
    /// Where decoded lines go (default: stdout)
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub decoder: DecoderConfig,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    config
        .decoder
        .validate()
        .with_context(|| format!("Invalid decoder settings in {:?}", path))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use esc_log_decoder::AddressRange;

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            input = "capture.csv"

            [decoder]
            poll_threshold = 4
            address_range = { lower = 0x0000, upper = 0x0220 }
            ignore_addresses = [0x0220, 0x0221]
            subject = "mcu"
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.input, Some(PathBuf::from("capture.csv")));
        assert_eq!(config.output, None);
        assert_eq!(config.decoder.poll_threshold, 4);
        assert_eq!(config.decoder.address_range, Some(AddressRange::new(0, 0x220)));
        assert_eq!(config.decoder.ignore_addresses.len(), 2);
        // Unset keys keep their defaults
        assert_eq!(config.decoder.frame_gap_ns, 10_000);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert!(config.input.is_none());
        assert_eq!(config.decoder, DecoderConfig::default());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = AppConfig {
            input: Some(PathBuf::from("trace.csv")),
            output: None,
            decoder: DecoderConfig::new().with_address_range(0x100, 0x200).ignore_address(0x110),
        };
        let text = toml::to_string(&config).unwrap();
        let back: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.decoder, config.decoder);
        assert_eq!(back.input, config.input);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"[decoder]\npoll_threshold = -2\n").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("poll threshold must be at least 1"));
    }

    #[test]
    fn test_missing_config_file() {
        let err = load_config(Path::new("/nonexistent/esc.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
