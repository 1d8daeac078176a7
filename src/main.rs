use prediction_desk::error::AppError;
use prediction_desk::prediction::notify::TracingSink;
use prediction_desk::prediction::predictor::MockPredictor;
use prediction_desk::prediction::types::{Instrument, IntervalUnit, RefreshInterval, StartPredictionArgs};
use prediction_desk::session::{start_session, stop_session};
use prediction_desk::state::DeskState;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Headless demo desk: a mock prediction source on a one-minute cadence with
/// notifications routed into the log stream. Stop with ctrl-c.
#[tokio::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let state = DeskState::new(Arc::new(MockPredictor::default()), Arc::new(TracingSink));
    state.selection.set_instruments(vec![
        Instrument::EurUsd,
        Instrument::GbpUsd,
        Instrument::UsdJpy,
    ]);

    let session = start_session(
        &state,
        Some(StartPredictionArgs {
            refresh_interval: Some(RefreshInterval {
                amount: 1,
                unit: IntervalUnit::Minute,
            }),
            ..Default::default()
        }),
    )
    .await?;
    info!(
        amount = session.refresh_interval.amount,
        unit = session.refresh_interval.unit.as_str(),
        "prediction desk running; press ctrl-c to stop"
    );

    if let Err(signal_error) = tokio::signal::ctrl_c().await {
        error!(%signal_error, "failed to listen for shutdown signal");
    }

    stop_session(&state).await?;
    Ok(())
}
