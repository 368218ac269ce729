mod error;
mod store;
mod text;

pub use error::{ParamErr, Result};
pub use store::{ParameterStore, Unit};
pub use text::{parse_rows, read_layer, ParamPaths};
