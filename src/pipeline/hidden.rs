use std::sync::Arc;

use log::debug;
use tokio::task;

use super::context::{HiddenShard, PipelineContext};
use crate::{
    error::{PipelineErr, Result},
    forward,
};

/// Runs hidden worker `worker` for every record, computing the activations of its shard.
///
/// # Arguments
/// * `ctx` - The pipeline's shared state.
/// * `worker` - This worker's id, also the index of its shard.
pub(crate) async fn run(ctx: Arc<PipelineContext>, worker: usize) -> Result<()> {
    let credits = ctx.credits();
    let outputs = ctx.topology().output_permits();

    for cycle in 0..ctx.records() {
        credits.hidden_ready[worker].acquire(1).await?;
        credits.hidden_pacing[worker].acquire(outputs).await?;

        task::block_in_place(|| compute(&ctx, &ctx.shards[worker], cycle))?;
        ctx.progress().hidden();

        for barrier in credits.output_ready.iter() {
            barrier.signal();
        }
        credits.load_admission.release(1);
    }

    debug!("hidden worker {worker}: done");
    Ok(())
}

/// Computes every unit of `shard` for the record published as `cycle`.
fn compute(ctx: &PipelineContext, shard: &HiddenShard, cycle: usize) -> Result<()> {
    let slot = ctx.slot.read();
    let published = match slot.as_ref() {
        Some(published) if published.index == cycle => published,
        other => {
            return Err(PipelineErr::OutOfStep {
                stage: "hidden worker",
                expected: cycle,
                found: other.map(|published| published.index),
            });
        }
    };

    let units = &ctx.store().hidden()[shard.range.clone()];
    let mut activations = shard.activations.write();

    activations
        .values
        .iter_mut()
        .zip(units)
        .for_each(|(value, unit)| *value = forward::hidden_activation(unit, &published.record.pixels));
    activations.record = Some(cycle);

    Ok(())
}
