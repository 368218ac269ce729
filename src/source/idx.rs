use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::Path,
};

use log::{debug, warn};

use super::{Record, RecordSource};
use crate::error::{PipelineErr, Result, Stream};

const IMAGE_HEADER_SIZE: usize = 16;
const LABEL_HEADER_SIZE: usize = 8;

/// Header of an idx image file, every field is a big-endian `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub magic: u32,
    pub count: u32,
    pub rows: u32,
    pub cols: u32,
}

/// Header of an idx label file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelHeader {
    pub magic: u32,
    pub count: u32,
}

/// Reads records from a pair of idx streams (images and labels) in lockstep.
///
/// The headers are decoded for their byte length only, the record length comes from
/// the network's input width instead of the image dimensions.
pub struct IdxReader<I: Read, L: Read> {
    images: I,
    labels: L,
    image_header: ImageHeader,
    label_header: LabelHeader,
    pixels: usize,
    read: usize,
}

impl IdxReader<BufReader<File>, BufReader<File>> {
    /// Opens both idx files and consumes their headers.
    ///
    /// # Arguments
    /// * `images` - Path to the image file.
    /// * `labels` - Path to the label file.
    /// * `pixels` - Amount of pixel bytes per record.
    ///
    /// # Returns
    /// `SourceUnavailable` if either file can't be opened.
    pub fn open(images: &Path, labels: &Path, pixels: usize) -> Result<Self> {
        Self::new(open(images)?, open(labels)?, pixels)
    }
}

impl<I: Read, L: Read> IdxReader<I, L> {
    /// Creates a new `IdxReader` over already opened streams, consuming both headers.
    ///
    /// # Arguments
    /// * `images` - The image stream, positioned at its header.
    /// * `labels` - The label stream, positioned at its header.
    /// * `pixels` - Amount of pixel bytes per record.
    pub fn new(mut images: I, mut labels: L, pixels: usize) -> Result<Self> {
        let mut buf = [0; IMAGE_HEADER_SIZE];
        read_header(&mut images, &mut buf, Stream::Images)?;
        let image_header = ImageHeader {
            magic: be_u32(&buf, 0),
            count: be_u32(&buf, 1),
            rows: be_u32(&buf, 2),
            cols: be_u32(&buf, 3),
        };

        let mut buf = [0; LABEL_HEADER_SIZE];
        read_header(&mut labels, &mut buf, Stream::Labels)?;
        let label_header = LabelHeader {
            magic: be_u32(&buf, 0),
            count: be_u32(&buf, 1),
        };

        debug!("image header {image_header:?}, label header {label_header:?}");

        let dims = image_header.rows as usize * image_header.cols as usize;
        if dims != pixels {
            warn!("image header announces {dims} pixels per image, reading {pixels}");
        }

        if image_header.count != label_header.count {
            warn!(
                "image file announces {} records but label file announces {}",
                image_header.count, label_header.count
            );
        }

        Ok(Self {
            images,
            labels,
            image_header,
            label_header,
            pixels,
            read: 0,
        })
    }

    pub fn image_header(&self) -> ImageHeader {
        self.image_header
    }

    pub fn label_header(&self) -> LabelHeader {
        self.label_header
    }
}

impl<I, L> RecordSource for IdxReader<I, L>
where
    I: Read + Send,
    L: Read + Send,
{
    fn next(&mut self) -> Result<Option<Record>> {
        let record = self.read;
        let mut pixels = vec![0; self.pixels];

        match fill(&mut self.images, &mut pixels, Stream::Images)? {
            0 if self.pixels > 0 => return Ok(None),
            got if got < self.pixels => {
                return Err(PipelineErr::ShortRead {
                    stream: Stream::Images,
                    record,
                    got,
                    expected: self.pixels,
                });
            }
            _ => {}
        }

        let mut label = [0; 1];
        if fill(&mut self.labels, &mut label, Stream::Labels)? == 0 {
            return Err(PipelineErr::ShortRead {
                stream: Stream::Labels,
                record,
                got: 0,
                expected: 1,
            });
        }

        self.read += 1;
        Ok(Some(Record::new(pixels, label[0])))
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.image_header.count as usize)
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| PipelineErr::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })
}

fn read_header<R: Read>(reader: &mut R, buf: &mut [u8], stream: Stream) -> Result<()> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            Err(PipelineErr::ShortHeader { stream })
        }
        Err(source) => Err(PipelineErr::ReadFailed { stream, source }),
    }
}

/// Reads into `buf` until it's full or the stream ends.
///
/// # Returns
/// The amount of bytes read, less than `buf.len()` only at the end of the stream.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8], stream: Stream) -> Result<usize> {
    let mut filled = 0;

    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(source) => return Err(PipelineErr::ReadFailed { stream, source }),
        }
    }

    Ok(filled)
}

fn be_u32(buf: &[u8], field: usize) -> u32 {
    let start = field * 4;
    u32::from_be_bytes([buf[start], buf[start + 1], buf[start + 2], buf[start + 3]])
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn image_file(count: u32, rows: u32, cols: u32, body: &[u8]) -> Cursor<Vec<u8>> {
        let mut bytes = Vec::new();
        for field in [0x0803, count, rows, cols] {
            bytes.extend_from_slice(&field.to_be_bytes());
        }
        bytes.extend_from_slice(body);
        Cursor::new(bytes)
    }

    fn label_file(count: u32, body: &[u8]) -> Cursor<Vec<u8>> {
        let mut bytes = Vec::new();
        for field in [0x0801, count] {
            bytes.extend_from_slice(&field.to_be_bytes());
        }
        bytes.extend_from_slice(body);
        Cursor::new(bytes)
    }

    #[test]
    fn test_headers_are_big_endian() {
        let reader = IdxReader::new(image_file(2, 2, 2, &[]), label_file(2, &[]), 4).unwrap();

        assert_eq!(
            reader.image_header(),
            ImageHeader {
                magic: 0x0803,
                count: 2,
                rows: 2,
                cols: 2,
            }
        );
        assert_eq!(reader.label_header().magic, 0x0801);
        assert_eq!(reader.len_hint(), Some(2));
    }

    #[test]
    fn test_records_come_in_source_order() {
        let images = image_file(2, 1, 3, &[1, 2, 3, 4, 5, 6]);
        let labels = label_file(2, &[7, 9]);
        let mut reader = IdxReader::new(images, labels, 3).unwrap();

        assert_eq!(reader.next().unwrap(), Some(Record::new(vec![1, 2, 3], 7)));
        assert_eq!(reader.next().unwrap(), Some(Record::new(vec![4, 5, 6], 9)));
        assert_eq!(reader.next().unwrap(), None);
    }

    #[test]
    fn test_partial_image_is_a_short_read() {
        let images = image_file(2, 1, 3, &[1, 2, 3, 4]);
        let labels = label_file(2, &[7, 9]);
        let mut reader = IdxReader::new(images, labels, 3).unwrap();

        assert!(reader.next().unwrap().is_some());
        let err = reader.next().unwrap_err();
        assert!(matches!(
            err,
            PipelineErr::ShortRead {
                stream: Stream::Images,
                record: 1,
                got: 1,
                expected: 3,
            }
        ));
    }

    #[test]
    fn test_missing_label_is_a_short_read() {
        let images = image_file(2, 1, 1, &[1, 2]);
        let labels = label_file(2, &[7]);
        let mut reader = IdxReader::new(images, labels, 1).unwrap();

        assert!(reader.next().unwrap().is_some());
        let err = reader.next().unwrap_err();
        assert!(matches!(
            err,
            PipelineErr::ShortRead {
                stream: Stream::Labels,
                record: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_truncated_header() {
        let images = Cursor::new(vec![0, 0, 8, 3, 0, 0]);
        let err = IdxReader::new(images, label_file(0, &[]), 1).err().unwrap();
        assert!(matches!(
            err,
            PipelineErr::ShortHeader {
                stream: Stream::Images
            }
        ));
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let missing = Path::new("definitely/not/here-idx3-ubyte");
        let err = IdxReader::open(missing, missing, 784).err().unwrap();
        assert!(matches!(err, PipelineErr::SourceUnavailable { .. }));
    }
}
