use crate::error::AppError;
use crate::prediction::types::{Instrument, PipsSettings, PredictionOutcome, Signal};
use futures_util::future::BoxFuture;
use rand::Rng;
use std::time::Duration;

/// The fetch collaborator: one asynchronous call per synthesized entry,
/// callable concurrently, with no latency bound.
pub trait Predictor: Send + Sync {
    fn predict(
        &self,
        instrument: Instrument,
        parameters: PipsSettings,
    ) -> BoxFuture<'static, Result<PredictionOutcome, AppError>>;
}

/// Stand-in for a real prediction source: random signal, confidence, and pip
/// targets inside the requested ranges, with simulated latency and a
/// configurable failure rate.
pub struct MockPredictor {
    pub failure_rate: f64,
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
}

impl Default for MockPredictor {
    fn default() -> Self {
        Self {
            failure_rate: 0.15,
            min_latency_ms: 20,
            max_latency_ms: 250,
        }
    }
}

impl Predictor for MockPredictor {
    fn predict(
        &self,
        instrument: Instrument,
        parameters: PipsSettings,
    ) -> BoxFuture<'static, Result<PredictionOutcome, AppError>> {
        // Draw everything up front; thread_rng must not be held across await.
        let mut rng = rand::thread_rng();
        let latency_ms = rng.gen_range(self.min_latency_ms..=self.max_latency_ms.max(self.min_latency_ms));

        let result = if !parameters.is_valid() {
            Err(AppError::Prediction(format!(
                "rejected request for {}: pip ranges out of bounds",
                instrument.as_str()
            )))
        } else if rng.gen_bool(self.failure_rate.clamp(0.0, 1.0)) {
            Err(AppError::Prediction(format!(
                "mock source returned no signal for {}",
                instrument.as_str()
            )))
        } else {
            Ok(PredictionOutcome {
                signal: if rng.gen_bool(0.5) {
                    Signal::Buy
                } else {
                    Signal::Sell
                },
                confidence: rng.gen_range(0.5..=1.0),
                target_pips: rng.gen_range(parameters.profit.min..=parameters.profit.max),
                stop_pips: rng.gen_range(parameters.loss.min..=parameters.loss.max),
            })
        };

        Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(latency_ms)).await;
            result
        })
    }
}
