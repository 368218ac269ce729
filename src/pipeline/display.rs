use std::{sync::Arc, time::Instant};

use log::{debug, info};
use tokio::{sync::mpsc, task};

use super::{
    context::PipelineContext,
    loader::Label,
    stats::{RunSummary, RunningStats},
};
use crate::{
    error::{PipelineErr, Result},
    forward,
    report::Reporter,
};

/// Reports every record in order, then the run summary.
///
/// # Arguments
/// * `ctx` - The pipeline's shared state.
/// * `labels` - The loader's load-completion signal, carrying each record's label.
/// * `reporter` - Where the result events go.
pub(crate) async fn run<R: Reporter>(
    ctx: Arc<PipelineContext>,
    mut labels: mpsc::Receiver<Label>,
    mut reporter: R,
) -> Result<RunSummary> {
    let started = Instant::now();
    let credits = ctx.credits();
    let outputs = ctx.topology().output_permits();
    let mut stats = RunningStats::default();

    for cycle in 0..ctx.records() {
        let label = labels.recv().await.ok_or(PipelineErr::Halted("reporter"))?;
        if label.record != cycle {
            return Err(PipelineErr::OutOfStep {
                stage: "reporter",
                expected: cycle,
                found: Some(label.record),
            });
        }

        credits.display_ready.wait().await?;

        let predicted = consensus(&ctx, cycle)?;
        let event = stats.tally(predicted, usize::from(label.value));
        task::block_in_place(|| reporter.record(&event)).map_err(PipelineErr::Report)?;
        ctx.progress().reported();

        credits.display_pacing.release(outputs);
        credits.report_admission.release(1);
    }

    let summary = stats.summary(started.elapsed());
    task::block_in_place(|| reporter.finish(&summary)).map_err(PipelineErr::Report)?;

    debug!("reporter: done");
    info!(
        "classified {} records: {} correct, {} incorrect",
        summary.records, summary.correct, summary.incorrect
    );
    Ok(summary)
}

/// Checks that every output row holds the same vector for `cycle` and predicts from it.
fn consensus(ctx: &PipelineContext, cycle: usize) -> Result<usize> {
    let mut rows = ctx.rows.iter().map(|row| row.read());
    let Some(first) = rows.next() else {
        return Err(PipelineErr::Halted("reporter"));
    };

    if first.record != Some(cycle) {
        return Err(PipelineErr::OutOfStep {
            stage: "reporter",
            expected: cycle,
            found: first.record,
        });
    }

    for (worker, row) in rows.enumerate().map(|(idx, row)| (idx + 1, row)) {
        if row.record != Some(cycle) {
            return Err(PipelineErr::OutOfStep {
                stage: "reporter",
                expected: cycle,
                found: row.record,
            });
        }

        let diverged = row
            .values
            .iter()
            .zip(first.values.iter())
            .any(|(a, b)| a.to_bits() != b.to_bits());

        if diverged {
            return Err(PipelineErr::Diverged {
                record: cycle,
                worker,
            });
        }
    }

    Ok(forward::predict(&first.values))
}
