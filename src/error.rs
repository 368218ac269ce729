use std::{
    error::Error,
    fmt::{self, Display},
    io,
    path::PathBuf,
};

use tokio::task::JoinError;

use crate::params::ParamErr;

/// The pipeline's result type.
pub type Result<T> = std::result::Result<T, PipelineErr>;

/// The two framed streams a record is assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Images,
    Labels,
}

impl Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stream::Images => f.write_str("image"),
            Stream::Labels => f.write_str("label"),
        }
    }
}

/// Every failure that can stop a run.
///
/// None of these are recoverable: the first one to surface aborts the whole pipeline.
#[derive(Debug)]
pub enum PipelineErr {
    SourceUnavailable {
        path: PathBuf,
        source: io::Error,
    },
    ShortHeader {
        stream: Stream,
    },
    ShortRead {
        stream: Stream,
        record: usize,
        got: usize,
        expected: usize,
    },
    ReadFailed {
        stream: Stream,
        source: io::Error,
    },
    Exhausted {
        expected: usize,
        got: usize,
    },
    Params(ParamErr),
    InvalidConfig(String),
    Halted(&'static str),
    OutOfStep {
        stage: &'static str,
        expected: usize,
        found: Option<usize>,
    },
    Diverged {
        record: usize,
        worker: usize,
    },
    Report(io::Error),
    Stage(JoinError),
}

impl Display for PipelineErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceUnavailable { path, source } => {
                write!(f, "could not open {}: {source}", path.display())
            }
            Self::ShortHeader { stream } => write!(f, "truncated {stream} file header"),
            Self::ShortRead {
                stream,
                record,
                got,
                expected,
            } => write!(
                f,
                "short {stream} read at record {record}: got {got} bytes, expected {expected}"
            ),
            Self::ReadFailed { stream, source } => write!(f, "error reading {stream} file: {source}"),
            Self::Exhausted { expected, got } => {
                write!(f, "record source ended after {got} of {expected} records")
            }
            Self::Params(e) => write!(f, "parameter error: {e}"),
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::Halted(stage) => write!(f, "{stage} halted: its upstream went away"),
            Self::OutOfStep {
                stage,
                expected,
                found: Some(found),
            } => write!(f, "{stage} expected record {expected}, found record {found}"),
            Self::OutOfStep {
                stage,
                expected,
                found: None,
            } => write!(f, "{stage} expected record {expected}, found nothing published"),
            Self::Diverged { record, worker } => {
                write!(f, "output worker {worker} diverged on record {record}")
            }
            Self::Report(e) => write!(f, "reporter failed: {e}"),
            Self::Stage(e) => write!(f, "pipeline stage failed: {e}"),
        }
    }
}

impl Error for PipelineErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SourceUnavailable { source, .. } => Some(source),
            Self::ReadFailed { source, .. } => Some(source),
            Self::Params(e) => Some(e),
            Self::Report(e) => Some(e),
            Self::Stage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParamErr> for PipelineErr {
    fn from(value: ParamErr) -> Self {
        Self::Params(value)
    }
}

impl From<JoinError> for PipelineErr {
    fn from(value: JoinError) -> Self {
        Self::Stage(value)
    }
}
