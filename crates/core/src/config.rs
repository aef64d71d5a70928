//! Tunable thresholds for the extraction strategies.
//!
//! Every tolerance the extractors use lives here so that callers can tweak
//! behaviour from a TOML file or the command line instead of touching code.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ExtractionMethod;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractorConfig {
    /// Tokens whose vertical centers differ by less than this many points are
    /// placed on the same line.
    pub line_tolerance: f32,
    /// Two x start positions closer than this many points belong to the same
    /// column anchor.
    pub column_tolerance: f32,
    /// Minimum number of lines a column anchor must recur on, and minimum
    /// length of an aligned run, for a borderless table.
    pub min_aligned_rows: usize,
    /// Minimum number of consecutive qualifying lines for a delimited table.
    pub min_delimited_rows: usize,
    /// Characters tried by the other-delimited strategy, in order.
    pub other_delimiters: Vec<char>,
    /// Strategies to run. They always run in the canonical order regardless
    /// of the order given here.
    pub strategies: Vec<ExtractionMethod>,
    /// Number of rows included in a table preview.
    pub preview_rows: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            line_tolerance: 2.0,
            column_tolerance: 3.0,
            min_aligned_rows: 3,
            min_delimited_rows: 2,
            other_delimiters: vec!['|', ';', ','],
            strategies: ExtractionMethod::ALL.to_vec(),
            preview_rows: 5,
        }
    }
}

impl ExtractorConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config: ExtractorConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_tolerance("line_tolerance", self.line_tolerance)?;
        check_tolerance("column_tolerance", self.column_tolerance)?;

        if self.min_aligned_rows < 2 {
            return Err(ConfigError::Invalid {
                field: "min_aligned_rows",
                reason: format!("must be at least 2, got {}", self.min_aligned_rows),
            });
        }
        if self.min_delimited_rows < 2 {
            return Err(ConfigError::Invalid {
                field: "min_delimited_rows",
                reason: format!("must be at least 2, got {}", self.min_delimited_rows),
            });
        }
        if let Some(c) = self
            .other_delimiters
            .iter()
            .find(|c| c.is_alphanumeric() || c.is_whitespace())
        {
            return Err(ConfigError::Invalid {
                field: "other_delimiters",
                reason: format!("{c:?} cannot be used as a delimiter"),
            });
        }
        Ok(())
    }

    /// Enabled strategies in canonical order, without duplicates.
    pub fn ordered_strategies(&self) -> Vec<ExtractionMethod> {
        let mut strategies = self.strategies.clone();
        strategies.sort();
        strategies.dedup();
        strategies
    }
}

fn check_tolerance(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("must be a non-negative number, got {value}"),
        });
    }
    Ok(())
}
