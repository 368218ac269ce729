use std::sync::Arc;

use log::debug;
use tokio::task;

use super::context::PipelineContext;
use crate::{
    error::{PipelineErr, Result},
    forward,
};

/// Runs output worker `worker` for every record.
///
/// Every output worker computes the whole output layer into its own row, the rows
/// are redundant copies that the reporter cross-checks.
///
/// # Arguments
/// * `ctx` - The pipeline's shared state.
/// * `worker` - This worker's id, also the index of its output row.
pub(crate) async fn run(ctx: Arc<PipelineContext>, worker: usize) -> Result<()> {
    let credits = ctx.credits();
    let mut hidden = vec![0.; ctx.store().hidden().len()];

    for cycle in 0..ctx.records() {
        credits.output_ready[worker].wait().await?;
        credits.display_pacing.acquire(1).await?;

        task::block_in_place(|| {
            gather(&ctx, cycle, &mut hidden)?;
            compute(&ctx, worker, cycle, &hidden);
            Ok::<_, PipelineErr>(())
        })?;
        ctx.progress().output();

        for pacing in credits.hidden_pacing.iter() {
            pacing.release(1);
        }
        credits.display_ready.signal();
    }

    debug!("output worker {worker}: done");
    Ok(())
}

/// Copies every hidden shard, in unit order, into `out`.
fn gather(ctx: &PipelineContext, cycle: usize, out: &mut [f64]) -> Result<()> {
    for shard in ctx.shards.iter() {
        let activations = shard.activations.read();

        if activations.record != Some(cycle) {
            return Err(PipelineErr::OutOfStep {
                stage: "output worker",
                expected: cycle,
                found: activations.record,
            });
        }

        out[shard.range.clone()].copy_from_slice(&activations.values);
    }

    Ok(())
}

fn compute(ctx: &PipelineContext, worker: usize, cycle: usize, hidden: &[f64]) {
    let with_bias = ctx.output_bias();
    let mut row = ctx.rows[worker].write();

    row.values
        .iter_mut()
        .zip(ctx.store().output())
        .for_each(|(value, unit)| *value = forward::output_activation(unit, hidden, with_bias));
    row.record = Some(cycle);
}
