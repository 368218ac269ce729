use std::sync::Arc;

use log::debug;
use tokio::{sync::mpsc, task};

use super::context::{PipelineContext, Published};
use crate::{
    error::{PipelineErr, Result, Stream},
    source::RecordSource,
};

/// The load-completion signal handed to the reporter: which record was published and
/// its ground truth.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Label {
    pub record: usize,
    pub value: u8,
}

/// Publishes `N` records, one at a time, into the shared slot.
///
/// # Arguments
/// * `ctx` - The pipeline's shared state.
/// * `source` - Where records come from, read in order.
/// * `labels` - The reporter's end of the load-completion signal.
///
/// # Returns
/// `Exhausted` if `source` ends early, or whatever read error it produced.
pub(crate) async fn run<S: RecordSource>(
    ctx: Arc<PipelineContext>,
    mut source: S,
    labels: mpsc::Sender<Label>,
) -> Result<()> {
    let credits = ctx.credits();
    let workers = ctx.topology().hidden_permits();
    let records = ctx.records();
    let inputs = ctx.store().inputs();

    for index in 0..records {
        credits.report_admission.acquire(1).await?;
        credits.load_admission.acquire(workers).await?;

        let record = task::block_in_place(|| source.next())?.ok_or(PipelineErr::Exhausted {
            expected: records,
            got: index,
        })?;

        if record.pixels.len() != inputs {
            return Err(PipelineErr::ShortRead {
                stream: Stream::Images,
                record: index,
                got: record.pixels.len(),
                expected: inputs,
            });
        }

        let label = Label {
            record: index,
            value: record.label,
        };

        *ctx.slot.write() = Some(Published { index, record });
        ctx.progress().loaded();

        for gate in credits.hidden_ready.iter() {
            gate.release(1);
        }

        labels
            .send(label)
            .await
            .map_err(|_| PipelineErr::Halted("loader"))?;
    }

    debug!("loader: published {records} records");
    Ok(())
}
