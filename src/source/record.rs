use std::collections::VecDeque;

use crate::error::Result;

/// One input of the pipeline: a pixel vector and its ground truth label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub pixels: Box<[u8]>,
    pub label: u8,
}

impl Record {
    pub fn new(pixels: Vec<u8>, label: u8) -> Self {
        Self {
            pixels: pixels.into_boxed_slice(),
            label,
        }
    }
}

/// A stream of records consumed in source order by the loader stage.
pub trait RecordSource: Send {
    /// Reads the next record.
    ///
    /// # Returns
    /// `None` once the stream ends cleanly at a record boundary, or an error on a
    /// short or failed read.
    fn next(&mut self) -> Result<Option<Record>>;

    /// How many records the source claims to hold, if it knows.
    fn len_hint(&self) -> Option<usize> {
        None
    }
}

/// In-memory source, records are handed out front to back.
impl RecordSource for VecDeque<Record> {
    fn next(&mut self) -> Result<Option<Record>> {
        Ok(self.pop_front())
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.len())
    }
}
