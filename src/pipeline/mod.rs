//! The four stage classification pipeline.
//!
//! One loader, `W` hidden workers, `O` output workers and one reporter run as tasks
//! for the whole run. Stages hand records downstream through the shared
//! `PipelineContext` and hand credits back upstream, credits being the only thing
//! any stage ever waits on.

mod context;
mod display;
mod hidden;
mod loader;
mod output;
mod shard;
mod stats;

use std::sync::Arc;

use log::info;
use tokio::{sync::mpsc, task::JoinSet};

pub use context::{CreditLedger, PipelineContext, Progress, ProgressSnapshot};
pub use shard::{partition, shard_range};
pub use stats::{ResultEvent, RunSummary};

use crate::{
    config::Topology,
    error::{PipelineErr, Result},
    params::ParameterStore,
    report::Reporter,
    source::RecordSource,
};

/// A configured pipeline ready to classify `N` records.
pub struct Pipeline {
    ctx: Arc<PipelineContext>,
}

impl Pipeline {
    /// Creates a new `Pipeline`.
    ///
    /// # Arguments
    /// * `store` - The network parameters.
    /// * `topology` - Pool sizes and lookahead.
    /// * `records` - N, fixed for the whole run.
    /// * `output_bias` - Whether output units add their bias.
    pub fn new(
        store: Arc<ParameterStore>,
        topology: Topology,
        records: usize,
        output_bias: bool,
    ) -> Self {
        let ctx = PipelineContext::new(store, topology, records, output_bias);

        Self { ctx: Arc::new(ctx) }
    }

    /// The state shared by the stages, for inspecting credits and progress.
    pub fn context(&self) -> Arc<PipelineContext> {
        Arc::clone(&self.ctx)
    }

    /// Spawns every stage and waits for all of them to finish.
    ///
    /// Must be called from a multi-threaded tokio runtime, compute and blocking reads
    /// run in place on the runtime's workers.
    ///
    /// # Arguments
    /// * `source` - The records to classify, at least `N` of them.
    /// * `reporter` - Receives one event per record, in order.
    ///
    /// # Returns
    /// The run summary, or the first error any stage hit. The remaining stages are
    /// aborted on error.
    pub async fn run<S, R>(self, source: S, reporter: R) -> Result<RunSummary>
    where
        S: RecordSource + 'static,
        R: Reporter + 'static,
    {
        let ctx = self.ctx;
        let topology = ctx.topology();
        info!(
            "classifying {} records with {} hidden and {} output workers",
            ctx.records(),
            topology.hidden_workers(),
            topology.output_workers()
        );

        let (tx, rx) = mpsc::channel(topology.lookahead());
        let mut tasks: JoinSet<Result<Option<RunSummary>>> = JoinSet::new();

        let loader_ctx = Arc::clone(&ctx);
        tasks.spawn(async move { loader::run(loader_ctx, source, tx).await.map(|_| None) });

        for worker in 0..topology.hidden_workers() {
            let ctx = Arc::clone(&ctx);
            tasks.spawn(async move { hidden::run(ctx, worker).await.map(|_| None) });
        }

        for worker in 0..topology.output_workers() {
            let ctx = Arc::clone(&ctx);
            tasks.spawn(async move { output::run(ctx, worker).await.map(|_| None) });
        }

        let display_ctx = Arc::clone(&ctx);
        tasks.spawn(async move { display::run(display_ctx, rx, reporter).await.map(Some) });

        // A stage only halts once its peer across a channel is gone, so keep
        // joining until the peer's own error surfaces.
        let mut summary = None;
        let mut halted = None;
        while let Some(res) = tasks.join_next().await {
            match res? {
                Ok(Some(done)) => summary = Some(done),
                Ok(None) => {}
                Err(e @ PipelineErr::Halted(_)) => {
                    halted.get_or_insert(e);
                }
                Err(e) => return Err(e),
            }
        }

        match (summary, halted) {
            (_, Some(e)) => Err(e),
            (Some(summary), None) => Ok(summary),
            (None, None) => Err(PipelineErr::Halted("reporter")),
        }
    }
}
