use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

/// Per-tenant housekeeping knobs. These change between requests, so callers
/// re-read them through a [`SettingsSource`] on every operation instead of
/// caching a copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HousekeepingSettings {
    /// Days between stay-over cleans during a multi-night stay.
    pub stay_over_interval: u32,
    /// Number of accumulated check-out cleans that escalates the next one
    /// to a deep clean.
    pub deep_cleaning_interval: u32,
    /// Tenant timezone as a fixed offset from UTC, in minutes.
    pub utc_offset_minutes: i32,
}

impl HousekeepingSettings {
    /// Rejects unusable settings instead of guessing a default; a zero
    /// interval would mask a misconfigured tenant.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.stay_over_interval == 0 {
            return Err(SettingsError::NonPositiveInterval {
                name: "stay_over_interval",
            });
        }
        if self.deep_cleaning_interval == 0 {
            return Err(SettingsError::NonPositiveInterval {
                name: "deep_cleaning_interval",
            });
        }
        self.timezone().map(|_| ())
    }

    pub fn timezone(&self) -> Result<FixedOffset, SettingsError> {
        if self.utc_offset_minutes.abs() > 14 * 60 {
            return Err(SettingsError::InvalidUtcOffset(self.utc_offset_minutes));
        }
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .ok_or(SettingsError::InvalidUtcOffset(self.utc_offset_minutes))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("{name} must be at least 1")]
    NonPositiveInterval { name: &'static str },
    #[error("utc offset of {0} minutes is outside the representable range")]
    InvalidUtcOffset(i32),
    #[error("tenant settings unavailable: {0}")]
    Unavailable(String),
}

/// Source of the current tenant settings. Implementations must return the
/// live value on each call.
pub trait SettingsSource: Send + Sync {
    fn housekeeping_settings(&self) -> Result<HousekeepingSettings, SettingsError>;
}
