use crate::prediction::types::{Instrument, LogEntry, LogStatus, Signal};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const DEFAULT_DISPLAY_CAP: usize = 10;
pub const MIN_DISPLAY_CAP: usize = 1;
pub const MAX_DISPLAY_CAP: usize = 100;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeFilter {
    pub start_ms: Option<i64>,
    pub end_ms: Option<i64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum StatusFilter {
    #[default]
    All,
    Only(LogStatus),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum SignalFilter {
    #[default]
    All,
    Only(Signal),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Status,
    CreatedAt,
    Instrument,
    MaxProfitPips,
    MaxLossPips,
    Signal,
    ExpiresAt,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SortConfig {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            key: SortKey::CreatedAt,
            direction: SortDirection::Descending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PartitionQuery {
    pub status: StatusFilter,
    pub signal: SignalFilter,
    pub sort: SortConfig,
    pub display_cap: usize,
}

impl Default for PartitionQuery {
    fn default() -> Self {
        Self {
            status: StatusFilter::All,
            signal: SignalFilter::All,
            sort: SortConfig::default(),
            display_cap: DEFAULT_DISPLAY_CAP,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LogViewParams {
    pub instruments: Vec<Instrument>,
    pub date_range: DateRangeFilter,
    pub active: PartitionQuery,
    pub expired: PartitionQuery,
}

#[derive(Debug, Clone, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogPartition {
    pub entries: Vec<LogEntry>,
    /// Pre-truncation count for "N of M" reporting.
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogViews {
    pub active: LogPartition,
    pub expired: LogPartition,
}

/// Derives the active/expired views from a store snapshot. Pure: identical
/// inputs always yield identical ordered output.
pub fn build_log_views(snapshot: &[LogEntry], now_ms: i64, params: &LogViewParams) -> LogViews {
    let mut active_entries = Vec::new();
    let mut expired_entries = Vec::new();

    for entry in snapshot {
        if !params.instruments.contains(&entry.instrument) {
            continue;
        }
        if params
            .date_range
            .start_ms
            .is_some_and(|start| entry.created_at_ms < start)
        {
            continue;
        }
        if params
            .date_range
            .end_ms
            .is_some_and(|end| entry.created_at_ms > end)
        {
            continue;
        }

        if entry.is_expired(now_ms) {
            expired_entries.push(entry.clone());
        } else {
            active_entries.push(entry.clone());
        }
    }

    LogViews {
        active: build_partition(active_entries, &params.active),
        expired: build_partition(expired_entries, &params.expired),
    }
}

fn build_partition(mut entries: Vec<LogEntry>, query: &PartitionQuery) -> LogPartition {
    entries.retain(|entry| matches_status(entry, query.status) && matches_signal(entry, query.signal));

    let total = entries.len();
    entries.sort_by(|a, b| compare_entries(a, b, query.sort));
    // The cap is per-partition UI state, so an out-of-range value is clamped
    // rather than rejected.
    entries.truncate(query.display_cap.clamp(MIN_DISPLAY_CAP, MAX_DISPLAY_CAP));

    LogPartition { entries, total }
}

fn matches_status(entry: &LogEntry, filter: StatusFilter) -> bool {
    match filter {
        StatusFilter::All => true,
        StatusFilter::Only(status) => entry.status == status,
    }
}

fn matches_signal(entry: &LogEntry, filter: SignalFilter) -> bool {
    match filter {
        SignalFilter::All => true,
        // Undefined signal (non-success entries) never matches a concrete filter.
        SignalFilter::Only(signal) => entry.signal() == Some(signal),
    }
}

enum SortValue<'a> {
    Number(f64),
    Text(&'a str),
}

fn sort_value(entry: &LogEntry, key: SortKey) -> Option<SortValue<'_>> {
    match key {
        SortKey::Status => Some(SortValue::Text(entry.status.as_str())),
        SortKey::CreatedAt => Some(SortValue::Number(entry.created_at_ms as f64)),
        SortKey::Instrument => Some(SortValue::Text(entry.instrument.as_str())),
        SortKey::MaxProfitPips => Some(SortValue::Number(entry.parameters.profit.max)),
        SortKey::MaxLossPips => Some(SortValue::Number(entry.parameters.loss.max)),
        SortKey::Signal => entry.signal().map(|signal| SortValue::Text(signal.as_str())),
        SortKey::ExpiresAt => entry.expires_at_ms.map(|at| SortValue::Number(at as f64)),
    }
}

fn compare_entries(a: &LogEntry, b: &LogEntry, config: SortConfig) -> Ordering {
    match (sort_value(a, config.key), sort_value(b, config.key)) {
        // Undefined values sort to the end regardless of direction.
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(lhs), Some(rhs)) => {
            let ordering = match (lhs, rhs) {
                (SortValue::Number(x), SortValue::Number(y)) => x.total_cmp(&y),
                (SortValue::Text(x), SortValue::Text(y)) => x.cmp(y),
                _ => Ordering::Equal,
            };
            match config.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        }
    }
}
