use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Could not parse config JSON '{path}': {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Parameters of a codon optimization run.
///
/// Every check can be switched off on its own. `max_gc` is a percentage
/// (0-100) and a window is rejected once its GC content reaches it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationConfig {
    pub check_repeats: bool,
    pub min_repeat_len: usize,
    pub max_repeat_len: usize,
    pub check_inverted_repeats: bool,
    pub min_inv_rep_len: usize,
    pub max_inv_rep_len: usize,
    pub check_stretch: bool,
    pub max_stretch: usize,
    pub check_gc: bool,
    pub max_gc: f64,
    pub gc_window: usize,
    pub forbidden_motifs: Vec<String>,
    pub max_repeat_attempts: usize,
    pub max_sequence_attempts: usize,
    pub max_handicap: usize,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            check_repeats: true,
            min_repeat_len: 20,
            max_repeat_len: 20,
            check_inverted_repeats: true,
            min_inv_rep_len: 12,
            max_inv_rep_len: 12,
            check_stretch: true,
            max_stretch: 8,
            check_gc: true,
            max_gc: 65.0,
            gc_window: 200,
            forbidden_motifs: vec![],
            max_repeat_attempts: 100,
            max_sequence_attempts: 1000,
            max_handicap: 1,
        }
    }
}

impl OptimizationConfig {
    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_path(&self, path: &str) -> Result<(), ConfigError> {
        let text = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Json {
            path: path.to_string(),
            source,
        })?;
        std::fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })
    }

    #[inline(always)]
    pub fn repeat_lengths(&self) -> RangeInclusive<usize> {
        self.min_repeat_len..=self.max_repeat_len
    }

    #[inline(always)]
    pub fn inverted_repeat_lengths(&self) -> RangeInclusive<usize> {
        self.min_inv_rep_len..=self.max_inv_rep_len
    }

    /// Forbidden motifs as upper-case DNA (`U` is read as `T`).
    pub fn normalized_motifs(&self) -> Vec<Vec<u8>> {
        self.forbidden_motifs
            .iter()
            .map(|motif| {
                motif
                    .trim()
                    .bytes()
                    .map(|c| match c.to_ascii_uppercase() {
                        b'U' => b'T',
                        c => c,
                    })
                    .collect()
            })
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::validate_range("repeat", self.min_repeat_len, self.max_repeat_len)?;
        Self::validate_range(
            "inverted repeat",
            self.min_inv_rep_len,
            self.max_inv_rep_len,
        )?;
        if self.max_stretch == 0 {
            return Err(ConfigError::Invalid(
                "max_stretch must be at least 1".to_string(),
            ));
        }
        if self.gc_window == 0 {
            return Err(ConfigError::Invalid(
                "gc_window must be at least 1".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.max_gc) {
            return Err(ConfigError::Invalid(format!(
                "max_gc must be a percentage between 0 and 100, got {}",
                self.max_gc
            )));
        }
        if self.max_repeat_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_repeat_attempts must be at least 1".to_string(),
            ));
        }
        if self.max_sequence_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_sequence_attempts must be at least 1".to_string(),
            ));
        }
        if let Some(pos) = self
            .forbidden_motifs
            .iter()
            .position(|m| m.trim().is_empty())
        {
            return Err(ConfigError::Invalid(format!(
                "forbidden motif #{} is empty",
                pos + 1
            )));
        }
        Ok(())
    }

    fn validate_range(name: &str, min: usize, max: usize) -> Result<(), ConfigError> {
        if min == 0 {
            return Err(ConfigError::Invalid(format!(
                "minimum {name} length must be at least 1"
            )));
        }
        if min > max {
            return Err(ConfigError::Invalid(format!(
                "minimum {name} length {min} exceeds maximum {max}"
            )));
        }
        Ok(())
    }
}
