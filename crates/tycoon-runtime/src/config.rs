use std::{fs, io, path::Path};

use tracing::info;
use tycoon_core::{EconomyConfig, EconomyError};

/// Parse a YAML config; absent keys keep their defaults.
pub fn parse_config(text: &str) -> Result<EconomyConfig, EconomyError> {
    if text.trim().is_empty() {
        return Ok(EconomyConfig::default());
    }
    serde_yaml::from_str(text).map_err(|e| EconomyError::Configuration(format!("config: {e}")))
}

/// Load the config file, falling back to defaults when it does not exist.
pub fn load_config(path: impl AsRef<Path>) -> Result<EconomyConfig, EconomyError> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(text) => parse_config(&text),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no config file, using defaults");
            Ok(EconomyConfig::default())
        }
        Err(e) => Err(EconomyError::Configuration(format!(
            "{}: {e}",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let cfg = parse_config("price_interval_secs: 60\nrng_seed: 7\n").unwrap();
        assert_eq!(cfg.price_interval_secs, 60);
        assert_eq!(cfg.event_interval_secs, 900);
        assert_eq!(cfg.rng_seed, Some(7));
        assert_eq!(cfg.starting_money, Decimal::new(5500, 0));
    }

    #[test]
    fn missing_file_is_default_and_garbage_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            load_config(dir.path().join("absent.yaml")).unwrap(),
            EconomyConfig::default()
        );
        assert!(matches!(
            parse_config("price_interval_secs: [oops"),
            Err(EconomyError::Configuration(_))
        ));
    }
}
