//! Classifies a stream of image records with a pretrained 2-layer network, spreading
//! each layer over a fixed pool of workers synchronized by counting credits.

pub mod config;
pub mod error;
pub mod forward;
pub mod params;
pub mod pipeline;
pub mod report;
pub mod source;
pub mod sync;

pub use config::{PipelineConfig, Topology};
pub use error::{PipelineErr, Result};
pub use params::ParameterStore;
pub use pipeline::{Pipeline, ResultEvent, RunSummary};
pub use report::{ConsoleReporter, Reporter};
pub use source::{IdxReader, Record, RecordSource};
