mod idx;
mod record;

pub use idx::{IdxReader, ImageHeader, LabelHeader};
pub use record::{Record, RecordSource};
