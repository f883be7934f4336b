// Poll controller - Drives one calibrated generation per poll interval
use crate::application::errors::PollError;
use crate::application::generation_store::GenerationStore;
use crate::application::trend_source::{TrendQuery, TrendSource};
use crate::domain::calibration::{compute_correction, CorrectionMap, CorrectionSummary};
use crate::domain::generation::GenerationId;
use crate::domain::merge::merge;
use crate::domain::sample::Window;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Where the controller is in the generation chain.
#[derive(Debug, Clone, PartialEq)]
pub enum PollPhase {
    /// Nothing persisted yet; the next window is stored unscaled.
    FirstGeneration { next: GenerationId },
    /// `previous` is the calibration baseline for the next window.
    SubsequentGeneration { previous: GenerationId },
}

impl PollPhase {
    fn target(&self) -> GenerationId {
        match self {
            PollPhase::FirstGeneration { next } => next.clone(),
            PollPhase::SubsequentGeneration { previous } => previous.next(),
        }
    }
}

/// Outcome of one successful cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub generation: GenerationId,
    pub samples: usize,
    pub correction: Option<CorrectionSummary>,
    pub completed_at: DateTime<Utc>,
}

pub struct PollController {
    source: Arc<dyn TrendSource>,
    store: Arc<dyn GenerationStore>,
    query: TrendQuery,
    interval: Duration,
    phase: PollPhase,
}

impl PollController {
    /// Start a fresh chain at generation 0.
    pub fn new(
        source: Arc<dyn TrendSource>,
        store: Arc<dyn GenerationStore>,
        query: TrendQuery,
        base_name: &str,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            store,
            query,
            interval,
            phase: PollPhase::FirstGeneration {
                next: GenerationId::first(base_name),
            },
        }
    }

    /// Continue the chain after the latest stored generation, or start a
    /// fresh one when the store holds nothing for `base_name`.
    pub async fn resume(
        source: Arc<dyn TrendSource>,
        store: Arc<dyn GenerationStore>,
        query: TrendQuery,
        base_name: &str,
        interval: Duration,
    ) -> Result<Self, PollError> {
        let latest = store.latest(base_name).await?;
        let mut controller = Self::new(source, store, query, base_name, interval);

        if let Some(previous) = latest {
            tracing::info!(generation = %previous, "Resuming calibration chain");
            controller.phase = PollPhase::SubsequentGeneration { previous };
        }

        Ok(controller)
    }

    pub fn phase(&self) -> &PollPhase {
        &self.phase
    }

    /// Run a single fetch, calibrate, merge and persist cycle.
    ///
    /// The phase only advances once the new generation is fully written, so a
    /// failed cycle leaves the controller pointing at the same baseline.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, PollError> {
        let target = self.phase.target();

        tracing::debug!(keyword = %self.query.keyword, generation = %target, "Fetching trend window");
        let raw = Window::from_raw(self.source.fetch_window(&self.query).await?);

        let correction = match &self.phase {
            PollPhase::FirstGeneration { .. } => CorrectionMap::default(),
            PollPhase::SubsequentGeneration { previous } => {
                let baseline = self.store.load(previous).await?;
                if baseline.is_empty() {
                    tracing::warn!(
                        generation = %previous,
                        "Previous generation is empty, storing window unscaled"
                    );
                }
                compute_correction(&baseline.value_map(), &raw)
            }
        };

        let summary = correction.summary();
        match &summary {
            Some(s) => tracing::info!(
                generation = %target,
                overlap = s.overlap,
                min = s.min,
                mean = s.mean,
                max = s.max,
                "Scaling window"
            ),
            None => tracing::info!(generation = %target, "No overlap, window stored unscaled"),
        }

        let calibrated = merge(&raw, &correction);
        self.store.save(&target, &calibrated).await?;
        tracing::info!(generation = %target, samples = calibrated.len(), "Saved generation");

        self.phase = PollPhase::SubsequentGeneration {
            previous: target.clone(),
        };

        Ok(CycleReport {
            generation: target,
            samples: calibrated.len(),
            correction: summary,
            completed_at: Utc::now(),
        })
    }

    /// Poll until `shutdown` resolves or a cycle fails.
    ///
    /// Shutdown is only observed while sleeping between cycles, never in the
    /// middle of one.
    pub async fn run<F>(mut self, shutdown: F) -> Result<(), PollError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let report = self.run_cycle().await?;
            tracing::debug!(
                generation = %report.generation,
                completed_at = %report.completed_at,
                next_in_secs = self.interval.as_secs(),
                "Cycle complete"
            );

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = &mut shutdown => {
                    tracing::info!(last_generation = %report.generation, "Shutdown requested, stopping poll loop");
                    return Ok(());
                }
            }
        }
    }
}
