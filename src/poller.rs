use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::config::Configuration;
use crate::models::ReadingOutcome;
use crate::pipeline::ReadingPipeline;
use crate::publish::{ReadingPublisher, UNIT};
use crate::source::FrameSource;

/// Everything that happened in one capture → read → publish round
#[derive(Debug)]
pub enum CycleOutcome {
    /// No frame this cycle
    CameraUnavailable(anyhow::Error),
    /// The pipeline thread died before producing an outcome
    Aborted(String),
    /// The pipeline ran but there was nothing to publish
    Unpublished(ReadingOutcome),
    Published { value: f64, raw_text: String },
    PublishFailed {
        value: f64,
        raw_text: String,
        error: anyhow::Error,
    },
}

impl CycleOutcome {
    pub fn published_value(&self) -> Option<f64> {
        match self {
            CycleOutcome::Published { value, .. } => Some(*value),
            _ => None,
        }
    }
}

/// Fetch a frame, run the pipeline on a blocking thread and publish any value
pub async fn poll_once<S, P>(source: &S, pipeline: &Arc<ReadingPipeline>, publisher: &P) -> CycleOutcome
where
    S: FrameSource,
    P: ReadingPublisher,
{
    let image = match source.fetch().await {
        Ok(image) => image,
        Err(e) => return CycleOutcome::CameraUnavailable(e),
    };

    let pipeline = Arc::clone(pipeline);
    let outcome = match tokio::task::spawn_blocking(move || pipeline.run(&image)).await {
        Ok(outcome) => outcome,
        Err(e) => return CycleOutcome::Aborted(e.to_string()),
    };

    let result = match outcome {
        ReadingOutcome::Done(result) => result,
        failed => return CycleOutcome::Unpublished(failed),
    };
    let Some(value) = result.numeric_value else {
        return CycleOutcome::Unpublished(ReadingOutcome::Done(result));
    };

    match publisher.publish(value).await {
        Ok(()) => CycleOutcome::Published {
            value,
            raw_text: result.raw_text,
        },
        Err(error) => CycleOutcome::PublishFailed {
            value,
            raw_text: result.raw_text,
            error,
        },
    }
}

/// Emit the single summary line for a cycle
pub fn log_cycle(outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::CameraUnavailable(e) => warn!("No image received: {:#}", e),
        CycleOutcome::Aborted(message) => error!("Pipeline aborted: {}", message),
        CycleOutcome::Published { value, raw_text } => {
            info!("Reading {} {} (raw {:?}) sent", value, UNIT, raw_text)
        }
        CycleOutcome::PublishFailed { value, raw_text, error } => {
            error!("Reading {} {} (raw {:?}) not sent: {:#}", value, UNIT, raw_text, error)
        }
        CycleOutcome::Unpublished(ReadingOutcome::Done(result)) => {
            warn!("No valid number recognized in {:?}", result.raw_text)
        }
        CycleOutcome::Unpublished(ReadingOutcome::Failed { raw_text, error }) => {
            if error.is_warning() {
                warn!("Reading failed: {} (raw {:?})", error, raw_text)
            } else {
                error!("Reading failed: {} (raw {:?})", error, raw_text)
            }
        }
    }
}

/// Poll until `shutdown` resolves.
///
/// Cycles never overlap: the next tick is only awaited once the previous
/// cycle, including its publish, has finished. Late ticks are delayed rather
/// than fired in a burst.
pub async fn run<S, P, F>(
    config: &Configuration,
    source: &S,
    pipeline: Arc<ReadingPipeline>,
    publisher: &P,
    shutdown: F,
) -> Result<()>
where
    S: FrameSource,
    P: ReadingPublisher,
    F: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("Shutting down");
                break;
            }
            _ = ticker.tick() => {
                let outcome = poll_once(source, &pipeline, publisher).await;
                log_cycle(&outcome);
            }
        }
    }

    Ok(())
}
