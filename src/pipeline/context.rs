use std::{
    ops::Range,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use parking_lot::RwLock;

use super::shard;
use crate::{
    config::Topology,
    params::ParameterStore,
    source::Record,
    sync::{CreditBarrier, Credits},
};

/// The record currently sitting in the shared slot.
#[derive(Debug)]
pub(crate) struct Published {
    pub index: usize,
    pub record: Record,
}

/// A buffer of activations tagged with the record they were computed for.
#[derive(Debug)]
pub(crate) struct Activations {
    pub record: Option<usize>,
    pub values: Box<[f64]>,
}

impl Activations {
    fn new(len: usize) -> Self {
        Self {
            record: None,
            values: vec![0.; len].into_boxed_slice(),
        }
    }
}

/// The contiguous run of hidden units owned by one hidden worker, and their activations.
#[derive(Debug)]
pub(crate) struct HiddenShard {
    pub range: Range<usize>,
    pub activations: RwLock<Activations>,
}

/// Every credit counter of the pipeline, one per stage boundary.
///
/// | counter | initial | acquired by | released by |
/// |---|---|---|---|
/// | `report_admission` | lookahead | loader, 1 per record | reporter, 1 |
/// | `load_admission` | W | loader, W per record | each hidden worker, 1 |
/// | `hidden_ready[k]` | 0 | hidden worker k, 1 | loader, 1 |
/// | `hidden_pacing[k]` | O | hidden worker k, O | each output worker, 1 |
/// | `output_ready[j]` | 0 | output worker j, W | each hidden worker, 1 |
/// | `display_pacing` | O | each output worker, 1 | reporter, O |
/// | `display_ready` | 0 | reporter, O | each output worker, 1 |
#[derive(Debug)]
pub struct CreditLedger {
    pub report_admission: Credits,
    pub load_admission: Credits,
    pub hidden_ready: Box<[Credits]>,
    pub hidden_pacing: Box<[Credits]>,
    pub output_ready: Box<[CreditBarrier]>,
    pub display_pacing: Credits,
    pub display_ready: CreditBarrier,
}

impl CreditLedger {
    fn new(topology: &Topology) -> Self {
        let hidden = topology.hidden_workers();
        let output = topology.output_workers();

        Self {
            report_admission: Credits::new("report-admission", topology.lookahead()),
            load_admission: Credits::new("load-admission", hidden),
            hidden_ready: (0..hidden)
                .map(|_| Credits::new("hidden-ready", 0))
                .collect(),
            hidden_pacing: (0..hidden)
                .map(|_| Credits::new("hidden-pacing", output))
                .collect(),
            output_ready: (0..output)
                .map(|_| CreditBarrier::new("output-ready", topology.hidden_permits()))
                .collect(),
            display_pacing: Credits::new("display-pacing", output),
            display_ready: CreditBarrier::new("display-ready", topology.output_permits()),
        }
    }

    /// Every counter in the ledger, barriers included.
    pub fn counters(&self) -> impl Iterator<Item = &Credits> {
        [&self.report_admission, &self.load_admission]
            .into_iter()
            .chain(self.hidden_ready.iter())
            .chain(self.hidden_pacing.iter())
            .chain(self.output_ready.iter().map(CreditBarrier::credits))
            .chain([&self.display_pacing, self.display_ready.credits()])
    }
}

/// How many stage steps have completed so far.
#[derive(Debug, Default)]
pub struct Progress {
    loaded: AtomicUsize,
    hidden: AtomicUsize,
    output: AtomicUsize,
    reported: AtomicUsize,
}

/// A point in time copy of `Progress`.
///
/// `hidden` and `output` count worker steps, so they reach `W * N` and `O * N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub loaded: usize,
    pub hidden: usize,
    pub output: usize,
    pub reported: usize,
}

impl Progress {
    pub(crate) fn loaded(&self) {
        self.loaded.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn hidden(&self) {
        self.hidden.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn output(&self) {
        self.output.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn reported(&self) {
        self.reported.fetch_add(1, Ordering::AcqRel);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            loaded: self.loaded.load(Ordering::Acquire),
            hidden: self.hidden.load(Ordering::Acquire),
            output: self.output.load(Ordering::Acquire),
            reported: self.reported.load(Ordering::Acquire),
        }
    }
}

/// The state shared by every stage of one run.
///
/// Buffers sit behind locks, but the credit protocol already guarantees only the
/// stage owning a buffer touches it, so the locks are never contended.
#[derive(Debug)]
pub struct PipelineContext {
    store: Arc<ParameterStore>,
    topology: Topology,
    records: usize,
    output_bias: bool,
    pub(crate) slot: RwLock<Option<Published>>,
    pub(crate) shards: Box<[HiddenShard]>,
    pub(crate) rows: Box<[RwLock<Activations>]>,
    credits: CreditLedger,
    progress: Progress,
}

impl PipelineContext {
    /// Creates a new `PipelineContext` sized for `store` and `topology`.
    ///
    /// # Arguments
    /// * `store` - The network parameters.
    /// * `topology` - Pool sizes and lookahead.
    /// * `records` - N, the amount of records the run will process.
    /// * `output_bias` - Whether output units add their bias.
    pub fn new(
        store: Arc<ParameterStore>,
        topology: Topology,
        records: usize,
        output_bias: bool,
    ) -> Self {
        let shards = shard::partition(store.hidden().len(), topology.hidden_workers())
            .into_iter()
            .map(|range| HiddenShard {
                activations: RwLock::new(Activations::new(range.len())),
                range,
            })
            .collect();

        let rows = (0..topology.output_workers())
            .map(|_| RwLock::new(Activations::new(store.output().len())))
            .collect();

        Self {
            credits: CreditLedger::new(&topology),
            store,
            topology,
            records,
            output_bias,
            slot: RwLock::new(None),
            shards,
            rows,
            progress: Progress::default(),
        }
    }

    pub fn store(&self) -> &ParameterStore {
        &self.store
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn records(&self) -> usize {
        self.records
    }

    pub fn output_bias(&self) -> bool {
        self.output_bias
    }

    pub fn credits(&self) -> &CreditLedger {
        &self.credits
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    /// The unit ranges of every hidden shard, in worker order.
    pub fn shard_ranges(&self) -> Vec<Range<usize>> {
        self.shards.iter().map(|shard| shard.range.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Unit;

    fn store(hidden: usize, output: usize) -> Arc<ParameterStore> {
        let hidden_units = vec![Unit::new(vec![0.; 4], 0.); hidden];
        let output_units = vec![Unit::new(vec![0.; hidden], 0.); output];
        Arc::new(ParameterStore::new(hidden_units, output_units).unwrap())
    }

    #[test]
    fn test_buffers_follow_topology() {
        let topology = Topology::new(3, 2, 1).unwrap();
        let ctx = PipelineContext::new(store(10, 4), topology, 5, false);

        assert_eq!(ctx.shard_ranges(), vec![0..4, 4..7, 7..10]);
        assert_eq!(ctx.shards[1].activations.read().values.len(), 3);
        assert_eq!(ctx.rows.len(), 2);
        assert!(ctx.rows.iter().all(|row| row.read().values.len() == 4));
        assert!(ctx.slot.read().is_none());
    }

    #[test]
    fn test_initial_credits() {
        let topology = Topology::new(8, 10, 2).unwrap();
        let ctx = PipelineContext::new(store(256, 10), topology, 0, false);
        let credits = ctx.credits();

        assert_eq!(credits.report_admission.available(), 2);
        assert_eq!(credits.load_admission.available(), 8);
        assert!(credits.hidden_ready.iter().all(|c| c.available() == 0));
        assert!(credits.hidden_pacing.iter().all(|c| c.available() == 10));
        assert!(credits.output_ready.iter().all(|b| b.parties() == 8));
        assert_eq!(credits.display_pacing.available(), 10);
        assert_eq!(credits.display_ready.parties(), 10);
        assert_eq!(credits.counters().count(), 2 + 8 + 8 + 10 + 2);
    }
}
