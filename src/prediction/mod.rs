//! Prediction log lifecycle engine: interval resolution, scheduling,
//! capacity-bounded storage, eviction sweeping, and view assembly.

pub mod interval;
pub mod notify;
pub mod predictor;
pub mod scheduler;
pub mod selection;
pub mod store;
pub mod types;
pub mod view;

pub const PREDICTION_PAUSED_TITLE: &str = "Prediction Paused";
pub const PREDICTIONS_UPDATED_TITLE: &str = "Predictions Updated";
pub const PREDICTIONS_PARTIAL_TITLE: &str = "Predictions Partially Updated";
pub const PREDICTIONS_FAILED_TITLE: &str = "Predictions Failed";

pub use notify::{Notification, NotificationSink};
pub use predictor::{MockPredictor, Predictor};
pub use scheduler::{run_prediction_engine, EngineShared};
pub use selection::{SelectionHandle, SelectionSnapshot};
pub use store::LogStore;
pub use types::{
    EngineConfig, Instrument, IntervalUnit, LogEntry, LogId, LogStatus, PipsRange, PipsSettings,
    PredictionOutcome, RefreshInterval, Severity, Signal, StartPredictionArgs,
};
pub use view::{build_log_views, LogViewParams, LogViews};
