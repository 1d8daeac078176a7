use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

pub const DEFAULT_MAX_LOGS: usize = 200;
pub const MIN_MAX_LOGS: usize = 10;
pub const MAX_MAX_LOGS: usize = 1_000;
pub const DEFAULT_MIN_LIFETIME_SECS: i64 = 30;
pub const DEFAULT_MAX_LIFETIME_SECS: i64 = 300;
pub const MAX_LIFETIME_CEILING_SECS: i64 = 86_400;
pub const DEFAULT_REFRESH_INTERVAL: RefreshInterval = RefreshInterval {
    amount: 15,
    unit: IntervalUnit::Minute,
};
pub const MAX_INTERVAL_AMOUNT: u32 = 10_000;
pub const BATCH_MIN_SIGNALS: u32 = 1;
pub const BATCH_MAX_SIGNALS: u32 = 10;
pub const SWEEP_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_PIPS_SETTINGS: PipsSettings = PipsSettings {
    profit: PipsRange {
        min: 5.0,
        max: 20.0,
    },
    loss: PipsRange {
        min: 5.0,
        max: 15.0,
    },
};

pub type LogId = u64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Instrument {
    #[serde(rename = "EUR/USD")]
    EurUsd,
    #[serde(rename = "GBP/USD")]
    GbpUsd,
    #[serde(rename = "USD/JPY")]
    UsdJpy,
    #[serde(rename = "USD/CHF")]
    UsdChf,
    #[serde(rename = "AUD/USD")]
    AudUsd,
    #[serde(rename = "USD/CAD")]
    UsdCad,
    #[serde(rename = "NZD/USD")]
    NzdUsd,
    #[serde(rename = "EUR/GBP")]
    EurGbp,
}

impl Instrument {
    pub const ALL: [Instrument; 8] = [
        Self::EurUsd,
        Self::GbpUsd,
        Self::UsdJpy,
        Self::UsdChf,
        Self::AudUsd,
        Self::UsdCad,
        Self::NzdUsd,
        Self::EurGbp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EurUsd => "EUR/USD",
            Self::GbpUsd => "GBP/USD",
            Self::UsdJpy => "USD/JPY",
            Self::UsdChf => "USD/CHF",
            Self::AudUsd => "AUD/USD",
            Self::UsdCad => "USD/CAD",
            Self::NzdUsd => "NZD/USD",
            Self::EurGbp => "EUR/GBP",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Buy,
    Sell,
}

impl Signal {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Pending,
    Success,
    Error,
}

impl LogStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Error => "error",
        }
    }

}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PipsRange {
    pub min: f64,
    pub max: f64,
}

impl PipsRange {
    pub fn is_valid(self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.min > 0.0
            && self.max > 0.0
            && self.min <= self.max
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PipsSettings {
    pub profit: PipsRange,
    pub loss: PipsRange,
}

impl PipsSettings {
    pub fn is_valid(self) -> bool {
        self.profit.is_valid() && self.loss.is_valid()
    }
}

impl Default for PipsSettings {
    fn default() -> Self {
        DEFAULT_PIPS_SETTINGS
    }
}

/// Payload returned by the fetch collaborator for one prediction attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PredictionOutcome {
    pub signal: Signal,
    pub confidence: f64,
    pub target_pips: f64,
    pub stop_pips: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: LogId,
    pub created_at_ms: i64,
    pub instrument: Instrument,
    pub parameters: PipsSettings,
    pub status: LogStatus,
    pub outcome: Option<PredictionOutcome>,
    pub failure_reason: Option<String>,
    pub expires_at_ms: Option<i64>,
}

impl LogEntry {
    pub fn pending(
        id: LogId,
        created_at_ms: i64,
        instrument: Instrument,
        parameters: PipsSettings,
    ) -> Self {
        Self {
            id,
            created_at_ms,
            instrument,
            parameters,
            status: LogStatus::Pending,
            outcome: None,
            failure_reason: None,
            expires_at_ms: None,
        }
    }

    /// Derived signal; undefined for anything that is not a resolved success.
    pub fn signal(&self) -> Option<Signal> {
        match self.status {
            LogStatus::Success => self.outcome.map(|outcome| outcome.signal),
            _ => None,
        }
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        matches!(self.expires_at_ms, Some(expires_at) if expires_at <= now_ms)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    Minute,
    Hour,
    Day,
}

impl IntervalUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RefreshInterval {
    pub amount: u32,
    pub unit: IntervalUnit,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StartPredictionArgs {
    pub refresh_interval: Option<RefreshInterval>,
    pub max_logs: Option<usize>,
    pub min_lifetime_secs: Option<i64>,
    pub max_lifetime_secs: Option<i64>,
}

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub refresh_interval: RefreshInterval,
    pub max_logs: usize,
    pub min_lifetime_secs: i64,
    pub max_lifetime_secs: i64,
}

impl StartPredictionArgs {
    pub fn normalize(self) -> Result<EngineConfig, AppError> {
        let refresh_interval = self.refresh_interval.unwrap_or(DEFAULT_REFRESH_INTERVAL);
        if refresh_interval.amount > MAX_INTERVAL_AMOUNT {
            return Err(AppError::InvalidArgument(format!(
                "refreshInterval amount must be at most {MAX_INTERVAL_AMOUNT}"
            )));
        }

        let max_logs = self.max_logs.unwrap_or(DEFAULT_MAX_LOGS);
        if !(MIN_MAX_LOGS..=MAX_MAX_LOGS).contains(&max_logs) {
            return Err(AppError::InvalidArgument(format!(
                "maxLogs must be between {MIN_MAX_LOGS} and {MAX_MAX_LOGS}"
            )));
        }

        let min_lifetime_secs = self.min_lifetime_secs.unwrap_or(DEFAULT_MIN_LIFETIME_SECS);
        if !(1..=MAX_LIFETIME_CEILING_SECS).contains(&min_lifetime_secs) {
            return Err(AppError::InvalidArgument(format!(
                "minLifetimeSecs must be between 1 and {MAX_LIFETIME_CEILING_SECS}"
            )));
        }

        let max_lifetime_secs = self.max_lifetime_secs.unwrap_or(DEFAULT_MAX_LIFETIME_SECS);
        if !(1..=MAX_LIFETIME_CEILING_SECS).contains(&max_lifetime_secs) {
            return Err(AppError::InvalidArgument(format!(
                "maxLifetimeSecs must be between 1 and {MAX_LIFETIME_CEILING_SECS}"
            )));
        }

        // max < min is tolerated here; the expiry computation clamps at use.
        Ok(EngineConfig {
            refresh_interval,
            max_logs,
            min_lifetime_secs,
            max_lifetime_secs,
        })
    }
}

pub fn now_unix_ms() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration.as_millis().min(i64::MAX as u128) as i64,
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_start_args_defaults() {
        let config = StartPredictionArgs::default()
            .normalize()
            .expect("defaults should be valid");

        assert_eq!(config.refresh_interval, DEFAULT_REFRESH_INTERVAL);
        assert_eq!(config.max_logs, DEFAULT_MAX_LOGS);
        assert_eq!(config.min_lifetime_secs, DEFAULT_MIN_LIFETIME_SECS);
        assert_eq!(config.max_lifetime_secs, DEFAULT_MAX_LIFETIME_SECS);
    }

    #[test]
    fn validates_max_logs_range() {
        let result = StartPredictionArgs {
            max_logs: Some(5),
            ..Default::default()
        }
        .normalize();

        assert!(result.is_err());
    }

    #[test]
    fn validates_lifetime_ranges() {
        let too_small = StartPredictionArgs {
            min_lifetime_secs: Some(0),
            ..Default::default()
        }
        .normalize();
        assert!(too_small.is_err());

        let too_large = StartPredictionArgs {
            max_lifetime_secs: Some(MAX_LIFETIME_CEILING_SECS + 1),
            ..Default::default()
        }
        .normalize();
        assert!(too_large.is_err());
    }

    #[test]
    fn accepts_inverted_lifetimes_for_clamping_at_use() {
        let config = StartPredictionArgs {
            min_lifetime_secs: Some(120),
            max_lifetime_secs: Some(60),
            ..Default::default()
        }
        .normalize()
        .expect("inverted lifetimes are clamped at use, not rejected");

        assert_eq!(config.min_lifetime_secs, 120);
        assert_eq!(config.max_lifetime_secs, 60);
    }

    #[test]
    fn pips_range_validity_requires_positive_ordered_bounds() {
        assert!(PipsRange {
            min: 1.0,
            max: 1.0
        }
        .is_valid());
        assert!(!PipsRange {
            min: 0.0,
            max: 20.0
        }
        .is_valid());
        assert!(!PipsRange {
            min: 5.0,
            max: 2.0
        }
        .is_valid());
        assert!(!PipsRange {
            min: f64::NAN,
            max: 2.0
        }
        .is_valid());
    }

    #[test]
    fn signal_is_undefined_unless_successful() {
        let mut entry = LogEntry::pending(1, 0, Instrument::EurUsd, PipsSettings::default());
        assert_eq!(entry.signal(), None);

        entry.status = LogStatus::Success;
        entry.outcome = Some(PredictionOutcome {
            signal: Signal::Buy,
            confidence: 0.8,
            target_pips: 12.0,
            stop_pips: 6.0,
        });
        assert_eq!(entry.signal(), Some(Signal::Buy));

        entry.status = LogStatus::Error;
        assert_eq!(entry.signal(), None);
    }

    #[test]
    fn expiry_check_uses_inclusive_deadline() {
        let mut entry = LogEntry::pending(1, 0, Instrument::EurUsd, PipsSettings::default());
        assert!(!entry.is_expired(1_000));

        entry.expires_at_ms = Some(1_000);
        assert!(entry.is_expired(1_000));
        assert!(!entry.is_expired(999));
    }
}
