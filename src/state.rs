use crate::prediction::notify::NotificationSink;
use crate::prediction::predictor::Predictor;
use crate::prediction::scheduler::EngineShared;
use crate::prediction::selection::SelectionHandle;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

pub struct SessionHandle {
    pub cancellation_token: CancellationToken,
    pub join_handle: tokio::task::JoinHandle<()>,
    pub shared: EngineShared,
}

pub struct DeskState {
    pub started_at: Instant,
    pub predictor: Arc<dyn Predictor>,
    pub sink: Arc<dyn NotificationSink>,
    /// Selection outlives any single session; the UI keeps writing it
    /// whether or not an engine is running.
    pub selection: SelectionHandle,
    pub session: Mutex<Option<SessionHandle>>,
}

impl DeskState {
    pub fn new(predictor: Arc<dyn Predictor>, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            started_at: Instant::now(),
            predictor,
            sink,
            selection: SelectionHandle::default(),
            session: Mutex::new(None),
        }
    }
}
