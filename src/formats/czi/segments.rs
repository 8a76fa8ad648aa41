use std::fmt;

use super::cursor::ByteCursor;

/// Length of the file header preceding the first segment
pub const FILE_HEADER_LEN: usize = 16;

/// Marker the file header must start with
pub const FILE_MAGIC: &[u8; 10] = b"ZISRAWFILE";

/// Length of every segment header
pub const SEGMENT_HEADER_LEN: usize = 32;

/// Length of the NUL-padded segment identifier
pub const SEGMENT_ID_LEN: usize = 16;

/// Identifier prefix of the metadata segment
pub const METADATA_SEGMENT_ID: &str = "ZISRAWMETADATA";

/// Segment classes distinguished by identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// XML metadata document
    Metadata,
    /// Image data block
    SubBlock,
    /// Embedded attachment (thumbnail, event list, ...)
    Attachment,
    /// Subblock or attachment directory
    Directory,
    /// Released space
    Deleted,
    /// Anything else
    Other,
}

/// Decoded 32-byte segment header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentHeader {
    /// Identifier with NUL padding removed
    pub id: String,
    /// Bytes reserved for the segment body
    pub allocated_size: u64,
    /// Bytes of the body actually in use
    pub used_size: u64,
}

impl SegmentHeader {
    /// Segment class from the identifier
    pub fn kind(&self) -> SegmentKind {
        match self.id.as_str() {
            id if id.starts_with(METADATA_SEGMENT_ID) => SegmentKind::Metadata,
            "ZISRAWSUBBLOCK" => SegmentKind::SubBlock,
            "ZISRAWATTACH" => SegmentKind::Attachment,
            "ZISRAWDIRECTORY" | "ZISRAWATTDIR" => SegmentKind::Directory,
            "DELETED" => SegmentKind::Deleted,
            _ => SegmentKind::Other,
        }
    }
}

/// A segment located inside the container buffer
#[derive(Debug, Clone)]
pub struct Segment<'a> {
    /// Offset of the segment header
    pub offset: usize,
    /// Decoded header
    pub header: SegmentHeader,
    body: &'a [u8],
}

impl<'a> Segment<'a> {
    /// Bytes in use: `used_size` when it is set and fits, the whole
    /// allocation otherwise
    pub fn payload(&self) -> &'a [u8] {
        match usize::try_from(self.header.used_size) {
            Ok(used) if used > 0 && used <= self.body.len() => &self.body[..used],
            _ => self.body,
        }
    }
}

/// Why a scan ended before the end of the buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanStop {
    /// Fewer than 32 bytes left for a segment header
    TruncatedHeader {
        /// Offset of the partial header
        offset: usize,
    },
    /// Declared size cannot be represented as an offset
    SizeOverflow {
        /// Offset of the segment header
        offset: usize,
        /// Declared allocated size
        allocated: u64,
    },
    /// Declared body runs past the end of the buffer
    DataOutOfBounds {
        /// Offset of the segment header
        offset: usize,
        /// End offset the header declares
        end: usize,
        /// Buffer length
        len: usize,
    },
}

impl fmt::Display for ScanStop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanStop::TruncatedHeader { offset } => {
                write!(f, "truncated segment header at offset {}", offset)
            }
            ScanStop::SizeOverflow { offset, allocated } => write!(
                f,
                "segment at offset {} declares an unrepresentable size of {} bytes",
                offset, allocated
            ),
            ScanStop::DataOutOfBounds { offset, end, len } => write!(
                f,
                "segment at offset {} extends to {} past the end of the file ({} bytes)",
                offset, end, len
            ),
        }
    }
}

/// Sequential segment walker starting after the file header
///
/// Yields segments until the buffer is exhausted or a header is
/// inconsistent with the buffer; in the latter case [`SegmentScanner::stop`]
/// says why.
#[derive(Debug)]
pub struct SegmentScanner<'a> {
    data: &'a [u8],
    offset: usize,
    stop: Option<ScanStop>,
    finished: bool,
}

impl<'a> SegmentScanner<'a> {
    /// Scanner over a whole container buffer
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: FILE_HEADER_LEN,
            stop: None,
            finished: data.len() <= FILE_HEADER_LEN,
        }
    }

    /// Reason the scan ended early, if it did
    pub fn stop(&self) -> Option<&ScanStop> {
        self.stop.as_ref()
    }

    fn halt(&mut self, reason: ScanStop) -> Option<Segment<'a>> {
        self.stop = Some(reason);
        self.finished = true;
        None
    }

    fn read_header(cursor: &mut ByteCursor<'a>) -> Option<SegmentHeader> {
        let raw_id = cursor.take(SEGMENT_ID_LEN)?;
        let id_len = raw_id.iter().position(|&b| b == 0).unwrap_or(SEGMENT_ID_LEN);
        let id = String::from_utf8_lossy(&raw_id[..id_len]).trim().to_string();
        let allocated_size = cursor.read_u64_le()?;
        let used_size = cursor.read_u64_le()?;
        Some(SegmentHeader {
            id,
            allocated_size,
            used_size,
        })
    }
}

impl<'a> Iterator for SegmentScanner<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Segment<'a>> {
        if self.finished {
            return None;
        }
        let offset = self.offset;
        if offset >= self.data.len() {
            self.finished = true;
            return None;
        }

        let mut cursor = match ByteCursor::at(self.data, offset) {
            Some(cursor) => cursor,
            None => return self.halt(ScanStop::TruncatedHeader { offset }),
        };
        let header = match Self::read_header(&mut cursor) {
            Some(header) => header,
            None => return self.halt(ScanStop::TruncatedHeader { offset }),
        };

        let allocated = header.allocated_size;
        let body_len = match usize::try_from(allocated) {
            Ok(len) => len,
            Err(_) => return self.halt(ScanStop::SizeOverflow { offset, allocated }),
        };
        let body_start = cursor.position();
        let end = match body_start.checked_add(body_len) {
            Some(end) => end,
            None => return self.halt(ScanStop::SizeOverflow { offset, allocated }),
        };
        let body = match cursor.take(body_len) {
            Some(body) => body,
            None => {
                return self.halt(ScanStop::DataOutOfBounds {
                    offset,
                    end,
                    len: self.data.len(),
                })
            }
        };

        self.offset = end;
        Some(Segment {
            offset,
            header,
            body,
        })
    }
}
