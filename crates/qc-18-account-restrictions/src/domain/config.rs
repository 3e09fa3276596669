//! # Restriction Engine Configuration
//!
//! Protocol limits and mirror-sync tuning.
//!
//! All values have defaults matching the public network configuration.
//! `from_env` applies `QC_RESTRICTION_*` overrides on top of the defaults.

use super::flags::RestrictionValueKind;
use shared_types::{networks, NetworkIdentifier};
use std::time::Duration;
use thiserror::Error;

/// Default cap on values per restriction set.
pub const DEFAULT_MAX_VALUES: usize = 512;

/// Default cap on add+remove entries carried by one transaction.
pub const DEFAULT_MAX_MODIFICATIONS: usize = 512;

/// Kind-specific maximum set sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestrictionLimits {
    pub max_address_values: usize,
    pub max_mosaic_values: usize,
    pub max_operation_values: usize,
}

impl RestrictionLimits {
    /// Same cap for every kind.
    pub const fn uniform(max_values: usize) -> Self {
        Self {
            max_address_values: max_values,
            max_mosaic_values: max_values,
            max_operation_values: max_values,
        }
    }

    pub const fn max_values(&self, kind: RestrictionValueKind) -> usize {
        match kind {
            RestrictionValueKind::Address => self.max_address_values,
            RestrictionValueKind::Mosaic => self.max_mosaic_values,
            RestrictionValueKind::Operation => self.max_operation_values,
        }
    }
}

impl Default for RestrictionLimits {
    fn default() -> Self {
        Self::uniform(DEFAULT_MAX_VALUES)
    }
}

/// Configuration for the account restriction engine.
#[derive(Debug, Clone)]
pub struct RestrictionConfig {
    /// Network whose addresses may appear in address restrictions.
    pub network_identifier: NetworkIdentifier,

    /// Maximum values per restriction set, per kind.
    pub limits: RestrictionLimits,

    /// Maximum add+remove entries in a single transaction.
    pub max_modifications_per_transaction: usize,

    /// Committed deltas that may wait for mirror sync. Past this, `enqueue`
    /// drops the delta and schedules a full resync.
    pub mirror_queue_capacity: usize,

    /// Attempts per batch after the first failure before a full resync is scheduled.
    pub mirror_max_retries: u32,

    /// Base backoff between retries; doubles per attempt.
    pub mirror_retry_backoff: Duration,
}

impl Default for RestrictionConfig {
    fn default() -> Self {
        Self {
            network_identifier: networks::TESTNET,
            limits: RestrictionLimits::default(),
            max_modifications_per_transaction: DEFAULT_MAX_MODIFICATIONS,
            mirror_queue_capacity: 1024,
            mirror_max_retries: 3,
            mirror_retry_backoff: Duration::from_millis(50),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },
}

impl RestrictionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_network_identifier(mut self, network_identifier: NetworkIdentifier) -> Self {
        self.network_identifier = network_identifier;
        self
    }

    pub fn with_limits(mut self, limits: RestrictionLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_max_modifications(mut self, max: usize) -> Self {
        self.max_modifications_per_transaction = max;
        self
    }

    pub fn with_mirror_queue_capacity(mut self, capacity: usize) -> Self {
        self.mirror_queue_capacity = capacity;
        self
    }

    pub fn with_mirror_retries(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.mirror_max_retries = max_retries;
        self.mirror_retry_backoff = backoff;
        self
    }

    /// Load configuration from `QC_RESTRICTION_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("QC_RESTRICTION_NETWORK") {
            let trimmed = raw.trim().trim_start_matches("0x");
            config.network_identifier = u8::from_str_radix(trimmed, 16).map_err(|_| {
                ConfigError::InvalidValue {
                    key: "QC_RESTRICTION_NETWORK",
                    value: raw.clone(),
                }
            })?;
        }
        if let Some(max) = parse_positive(&lookup, "QC_RESTRICTION_MAX_ADDRESS_VALUES")? {
            config.limits.max_address_values = max;
        }
        if let Some(max) = parse_positive(&lookup, "QC_RESTRICTION_MAX_MOSAIC_VALUES")? {
            config.limits.max_mosaic_values = max;
        }
        if let Some(max) = parse_positive(&lookup, "QC_RESTRICTION_MAX_OPERATION_VALUES")? {
            config.limits.max_operation_values = max;
        }
        if let Some(max) = parse_positive(&lookup, "QC_RESTRICTION_MAX_MODIFICATIONS")? {
            config.max_modifications_per_transaction = max;
        }
        if let Some(capacity) = parse_positive(&lookup, "QC_RESTRICTION_MIRROR_QUEUE")? {
            config.mirror_queue_capacity = capacity;
        }
        if let Some(raw) = lookup("QC_RESTRICTION_MIRROR_RETRIES") {
            config.mirror_max_retries =
                raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: "QC_RESTRICTION_MIRROR_RETRIES",
                    value: raw.clone(),
                })?;
        }
        if let Some(ms) = parse_positive(&lookup, "QC_RESTRICTION_MIRROR_BACKOFF_MS")? {
            config.mirror_retry_backoff = Duration::from_millis(ms as u64);
        }

        Ok(config)
    }
}

fn parse_positive<F>(lookup: &F, key: &'static str) -> Result<Option<usize>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let value: usize = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.clone(),
    })?;
    if value == 0 {
        return Err(ConfigError::Zero { key });
    }
    Ok(Some(value))
}
