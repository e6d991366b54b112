use std::path::PathBuf;

use serde::Deserialize;

use crate::dispatcher::DEFAULT_CAPACITY;
use crate::errors::ConfigError;
use crate::reply::OutputFormat;
use crate::runner::RunOptions;

const ENV_PREFIX: &str = "RIDEBOOK_";

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default = "default_halt_on_duplicate")]
    pub halt_on_duplicate: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        envy::prefixed(ENV_PREFIX)
            .from_env::<Config>()
            .map_err(|err| ConfigError::Invalid(err.to_string()))
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            capacity: self.capacity,
            format: self.format,
            halt_on_duplicate: self.halt_on_duplicate,
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from("output.txt")
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_halt_on_duplicate() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, envy::Error> {
        let vars = vars.iter().map(|(k, v)| (k.to_string(), v.to_string()));
        envy::prefixed(ENV_PREFIX).from_iter(vars)
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(
            config,
            Config {
                output_path: PathBuf::from("output.txt"),
                capacity: 2000,
                format: OutputFormat::Text,
                halt_on_duplicate: true,
            }
        );
        assert_eq!(config.run_options(), RunOptions::default());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("RIDEBOOK_OUTPUT_PATH", "/tmp/rides.jsonl"),
            ("RIDEBOOK_CAPACITY", "16"),
            ("RIDEBOOK_FORMAT", "json"),
            ("RIDEBOOK_HALT_ON_DUPLICATE", "false"),
            ("UNRELATED", "x"),
        ])
        .unwrap();

        assert_eq!(config.output_path, PathBuf::from("/tmp/rides.jsonl"));
        assert_eq!(config.capacity, 16);
        assert_eq!(config.format, OutputFormat::Json);
        assert!(!config.halt_on_duplicate);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(load(&[("RIDEBOOK_CAPACITY", "lots")]).is_err());
        assert!(load(&[("RIDEBOOK_FORMAT", "xml")]).is_err());
    }
}
