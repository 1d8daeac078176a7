use crate::error::AppError;
use crate::prediction::scheduler::{run_prediction_engine, EngineShared};
use crate::prediction::store::LogStore;
use crate::prediction::types::{
    now_unix_ms, EngineConfig, RefreshInterval, StartPredictionArgs,
};
use crate::prediction::view::{build_log_views, LogViewParams, LogViews};
use crate::state::{DeskState, SessionHandle};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub refresh_interval: RefreshInterval,
    pub max_logs: usize,
    pub min_lifetime_secs: i64,
    pub max_lifetime_secs: i64,
}

impl SessionInfo {
    fn from_config(config: &EngineConfig) -> Self {
        Self {
            refresh_interval: config.refresh_interval,
            max_logs: config.max_logs,
            min_lifetime_secs: config.min_lifetime_secs,
            max_lifetime_secs: config.max_lifetime_secs,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionStopResult {
    pub stopped: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub running: bool,
    pub log_count: usize,
    pub max_logs: Option<usize>,
    pub uptime_secs: u64,
}

/// Starts a prediction engine session, replacing (and fully stopping) any
/// session already running. The log store is fresh per session; the
/// selection carries over.
pub async fn start_session(
    state: &DeskState,
    args: Option<StartPredictionArgs>,
) -> Result<SessionInfo, AppError> {
    let config = args.unwrap_or_default().normalize()?;

    let existing_handle = {
        let mut session_slot = state.session.lock().await;
        session_slot.take()
    };
    if let Some(handle) = existing_handle {
        handle.cancellation_token.cancel();
        let _ = handle.join_handle.await;
    }

    let cancellation_token = CancellationToken::new();
    let task_token = cancellation_token.clone();
    let shared = EngineShared::new(
        config,
        Arc::new(LogStore::new(config.max_logs)),
        state.selection.clone(),
        Arc::clone(&state.predictor),
        Arc::clone(&state.sink),
    );

    let engine_shared = shared.clone();
    let join_handle = tokio::spawn(async move {
        run_prediction_engine(engine_shared, task_token).await;
    });

    {
        let mut session_slot = state.session.lock().await;
        *session_slot = Some(SessionHandle {
            cancellation_token,
            join_handle,
            shared,
        });
    }

    info!(
        amount = config.refresh_interval.amount,
        unit = config.refresh_interval.unit.as_str(),
        max_logs = config.max_logs,
        "prediction session started"
    );
    Ok(SessionInfo::from_config(&config))
}

pub async fn stop_session(state: &DeskState) -> Result<SessionStopResult, AppError> {
    let existing_handle = {
        let mut session_slot = state.session.lock().await;
        session_slot.take()
    };

    let stopped = if let Some(handle) = existing_handle {
        handle.cancellation_token.cancel();
        let _ = handle.join_handle.await;
        info!("prediction session stopped");
        true
    } else {
        false
    };

    Ok(SessionStopResult { stopped })
}

pub async fn session_status(state: &DeskState) -> Result<SessionStatus, AppError> {
    let session_slot = state.session.lock().await;
    let (running, log_count, max_logs) = match session_slot.as_ref() {
        Some(handle) => (true, handle.shared.store.len(), Some(handle.shared.config.max_logs)),
        None => (false, 0, None),
    };

    Ok(SessionStatus {
        running,
        log_count,
        max_logs,
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

/// Builds the active/expired views from the running session's store. A
/// stopped desk has nothing to show, so the views come back empty.
pub async fn session_views(
    state: &DeskState,
    params: LogViewParams,
) -> Result<LogViews, AppError> {
    let snapshot = {
        let session_slot = state.session.lock().await;
        session_slot
            .as_ref()
            .map(|handle| handle.shared.store.snapshot())
    };

    Ok(match snapshot {
        Some(entries) => build_log_views(&entries, now_unix_ms(), &params),
        None => LogViews::default(),
    })
}
