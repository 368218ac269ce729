use std::{fs, num::NonZeroUsize, path::Path, path::PathBuf};

use serde::Deserialize;

use crate::{
    error::{PipelineErr, Result},
    params::ParamPaths,
};

/// Upper bound on either worker pool.
pub const MAX_WORKERS: usize = 1024;

/// Everything a run needs to know before it starts, read from a JSON file.
///
/// Every field is optional in the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub images: PathBuf,
    pub labels: PathBuf,
    pub params: ParamPaths,
    pub hidden_workers: usize,
    pub output_workers: usize,
    /// Amount of records to classify, the image file header's count when missing.
    pub records: Option<usize>,
    pub lookahead: usize,
    pub output_bias: bool,
    /// Print running accuracy every this many records.
    pub progress_every: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            images: PathBuf::from("data/t10k-images-idx3-ubyte"),
            labels: PathBuf::from("data/t10k-labels-idx1-ubyte"),
            params: ParamPaths::default(),
            hidden_workers: 8,
            output_workers: 10,
            records: None,
            lookahead: 1,
            output_bias: false,
            progress_every: 1,
        }
    }
}

impl PipelineConfig {
    /// Reads a configuration from a JSON file.
    ///
    /// # Arguments
    /// * `path` - The JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            PipelineErr::InvalidConfig(format!("could not read {}: {e}", path.display()))
        })?;

        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| PipelineErr::InvalidConfig(e.to_string()))
    }

    /// Checks the pool sizes and produces the pipeline's shape.
    ///
    /// # Returns
    /// `InvalidConfig` for empty or oversized pools and a zero lookahead.
    pub fn topology(&self) -> Result<Topology> {
        Topology::new(self.hidden_workers, self.output_workers, self.lookahead)
    }
}

/// The fixed shape of the pipeline: pool sizes and how far the loader may run ahead
/// of the reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topology {
    hidden_workers: NonZeroUsize,
    output_workers: NonZeroUsize,
    lookahead: NonZeroUsize,
}

impl Topology {
    /// Creates a new `Topology`.
    ///
    /// # Arguments
    /// * `hidden_workers` - W, the amount of hidden layer workers.
    /// * `output_workers` - O, the amount of output layer workers.
    /// * `lookahead` - Records the loader may publish before the previous ones are reported.
    pub fn new(hidden_workers: usize, output_workers: usize, lookahead: usize) -> Result<Self> {
        let pool = |size: usize, what: &str| {
            if size > MAX_WORKERS {
                return Err(PipelineErr::InvalidConfig(format!(
                    "{what} must be at most {MAX_WORKERS}, got {size}"
                )));
            }

            NonZeroUsize::new(size)
                .ok_or_else(|| PipelineErr::InvalidConfig(format!("{what} must be at least 1")))
        };

        Ok(Self {
            hidden_workers: pool(hidden_workers, "hidden_workers")?,
            output_workers: pool(output_workers, "output_workers")?,
            lookahead: pool(lookahead, "lookahead")?,
        })
    }

    pub fn hidden_workers(&self) -> usize {
        self.hidden_workers.get()
    }

    pub fn output_workers(&self) -> usize {
        self.output_workers.get()
    }

    pub fn lookahead(&self) -> usize {
        self.lookahead.get()
    }

    // Pool sizes are capped at `MAX_WORKERS`, these always fit a semaphore request.
    pub(crate) fn hidden_permits(&self) -> u32 {
        self.hidden_workers() as u32
    }

    pub(crate) fn output_permits(&self) -> u32 {
        self.output_workers() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_layout() {
        let config = PipelineConfig::default();
        let topology = config.topology().unwrap();

        assert_eq!(topology.hidden_workers(), 8);
        assert_eq!(topology.output_workers(), 10);
        assert_eq!(topology.lookahead(), 1);
        assert!(!config.output_bias);
        assert_eq!(config.records, None);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = PipelineConfig::from_json(
            r#"{ "hidden_workers": 4, "records": 100, "params": { "hidden_biases": "hb.txt" } }"#,
        )
        .unwrap();

        assert_eq!(config.hidden_workers, 4);
        assert_eq!(config.output_workers, 10);
        assert_eq!(config.records, Some(100));
        assert_eq!(config.params.hidden_biases, PathBuf::from("hb.txt"));
        assert_eq!(
            config.params.output_biases,
            PathBuf::from("net_params/out_biases.txt")
        );
    }

    #[test]
    fn test_empty_pools_are_rejected() {
        assert!(matches!(
            Topology::new(0, 1, 1),
            Err(PipelineErr::InvalidConfig(_))
        ));
        assert!(matches!(
            Topology::new(1, 0, 1),
            Err(PipelineErr::InvalidConfig(_))
        ));
        assert!(matches!(
            Topology::new(1, 1, 0),
            Err(PipelineErr::InvalidConfig(_))
        ));
        assert!(matches!(
            Topology::new(MAX_WORKERS + 1, 1, 1),
            Err(PipelineErr::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        let err = PipelineConfig::from_json("{ hidden_workers: ").unwrap_err();
        assert!(matches!(err, PipelineErr::InvalidConfig(_)));
    }
}
