use std::{
    error::Error,
    fmt::{self, Display},
    io,
    path::PathBuf,
};

/// The specific result type for loading network parameters.
pub type Result<T> = std::result::Result<T, ParamErr>;

/// Error returned while building a `ParameterStore`, either from the text files
/// or from a size mismatch between layers.
#[derive(Debug)]
pub enum ParamErr {
    Unavailable {
        path: PathBuf,
        source: io::Error,
    },
    Parse {
        path: PathBuf,
        line: usize,
        token: String,
    },
    Shape {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    Empty {
        what: &'static str,
    },
}

impl Display for ParamErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { path, source } => {
                write!(f, "could not read {}: {source}", path.display())
            }
            Self::Parse { path, line, token } => {
                write!(f, "{}:{line}: `{token}` is not a number", path.display())
            }
            Self::Shape {
                what,
                expected,
                got,
            } => write!(f, "{what}: expected {expected}, got {got}"),
            Self::Empty { what } => write!(f, "{what} holds no units"),
        }
    }
}

impl Error for ParamErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unavailable { source, .. } => Some(source),
            _ => None,
        }
    }
}
