//! # Storage Configuration
//!
//! Construction-time knobs: initial arena capacity and fragmentation
//! threshold for the general pool and for every group store.
//!
//! ```toml
//! group_initial_records = 64
//! group_fragmentation_threshold = 0.2
//!
//! [pool]
//! initial_capacity = 4096
//! fragmentation_threshold = 0.1
//! ```

use serde::Deserialize;

use crate::error::{StrataError, StrataResult};

/// Sizing for one byte arena.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Initial buffer capacity in bytes. Doubles on overflow.
    pub initial_capacity: usize,
    /// Compaction runs once `hole bytes / capacity` exceeds this fraction.
    pub fragmentation_threshold: f32,
}

impl ArenaConfig {
    /// Default initial capacity in bytes.
    pub const DEFAULT_INITIAL_CAPACITY: usize = 1024;

    /// Default fragmentation threshold (10% of capacity).
    pub const DEFAULT_FRAGMENTATION_THRESHOLD: f32 = 0.1;

    /// Creates an arena config from a byte capacity and threshold.
    #[must_use]
    pub const fn new(initial_capacity: usize, fragmentation_threshold: f32) -> Self {
        Self {
            initial_capacity,
            fragmentation_threshold,
        }
    }

    /// Creates an arena config sized for `count` records of `record_size` bytes.
    #[must_use]
    pub fn for_records(count: usize, record_size: usize, fragmentation_threshold: f32) -> Self {
        Self::new((count * record_size).max(1), fragmentation_threshold)
    }

    /// Checks that capacity is non-zero and the threshold is a usable fraction.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::InvalidConfig`] describing the first bad value.
    pub fn validate(&self) -> StrataResult<()> {
        if self.initial_capacity == 0 {
            return Err(StrataError::InvalidConfig(
                "initial_capacity must be greater than zero".into(),
            ));
        }
        validate_threshold("fragmentation_threshold", self.fragmentation_threshold)
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_INITIAL_CAPACITY,
            Self::DEFAULT_FRAGMENTATION_THRESHOLD,
        )
    }
}

/// Configuration for a [`Registry`](crate::Registry).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Arena backing the general component pool.
    pub pool: ArenaConfig,
    /// Initial capacity of each group store, in packed records.
    pub group_initial_records: usize,
    /// Fragmentation threshold of each group store.
    pub group_fragmentation_threshold: f32,
}

impl RegistryConfig {
    /// Default initial group store capacity in records.
    pub const DEFAULT_GROUP_INITIAL_RECORDS: usize = 10;

    /// Parses and validates a TOML document.
    ///
    /// Missing keys fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::InvalidConfig`] if the document does not parse
    /// or a value fails validation.
    pub fn from_toml_str(source: &str) -> StrataResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|err| StrataError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::InvalidConfig`] describing the first bad value.
    pub fn validate(&self) -> StrataResult<()> {
        self.pool.validate()?;
        if self.group_initial_records == 0 {
            return Err(StrataError::InvalidConfig(
                "group_initial_records must be greater than zero".into(),
            ));
        }
        validate_threshold(
            "group_fragmentation_threshold",
            self.group_fragmentation_threshold,
        )
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            pool: ArenaConfig::default(),
            group_initial_records: Self::DEFAULT_GROUP_INITIAL_RECORDS,
            group_fragmentation_threshold: ArenaConfig::DEFAULT_FRAGMENTATION_THRESHOLD,
        }
    }
}

fn validate_threshold(field: &str, value: f32) -> StrataResult<()> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(StrataError::InvalidConfig(format!(
            "{field} must be in (0, 1], got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RegistryConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pool.initial_capacity, 1024);
        assert!((config.pool.fragmentation_threshold - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = RegistryConfig::from_toml_str(
            r#"
            group_initial_records = 64

            [pool]
            initial_capacity = 4096
            "#,
        )
        .unwrap();

        assert_eq!(config.group_initial_records, 64);
        assert_eq!(config.pool.initial_capacity, 4096);
        assert!((config.pool.fragmentation_threshold - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn test_rejects_bad_threshold() {
        let err = RegistryConfig::from_toml_str(
            r#"
            [pool]
            fragmentation_threshold = 1.5
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, StrataError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_zero_capacity() {
        assert!(ArenaConfig::new(0, 0.1).validate().is_err());
    }

    #[test]
    fn test_rejects_malformed_toml() {
        assert!(RegistryConfig::from_toml_str("pool = [").is_err());
    }

    #[test]
    fn test_record_sizing() {
        let config = ArenaConfig::for_records(10, 24, 0.1);
        assert_eq!(config.initial_capacity, 240);
    }
}
