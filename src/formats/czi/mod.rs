//! # Segmented Microscopy Container
//!
//! Zeiss CZI files are a 16-byte file header followed by a sequence of
//! self-describing segments:
//!
//! ```text
//! offset 0   "ZISRAWFILE" + 6 header bytes
//! offset 16  segment: id[16] (NUL padded) | allocated u64 LE | used u64 LE | body[allocated]
//!            segment: ...
//! ```
//!
//! One segment, identified by the `ZISRAWMETADATA` prefix, carries an XML
//! `ImageDocument` describing the instrument and the acquisition. Its body is
//! normally a 256-byte preamble whose first u32 gives the XML size, followed
//! by the XML; bodies holding only the XML document are accepted too.
//!
//! The whole container is held in memory while scanning. A segment header
//! that is inconsistent with the buffer ends the scan with a note; only a bad
//! file marker or malformed metadata XML fails the extraction.

mod cursor;
mod error;
mod segments;
mod xml;

#[cfg(test)]
mod tests;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{debug, warn};

pub use cursor::ByteCursor;
pub use error::CziError;
pub use segments::{
    ScanStop, Segment, SegmentHeader, SegmentKind, SegmentScanner, FILE_HEADER_LEN, FILE_MAGIC,
    METADATA_SEGMENT_ID, SEGMENT_HEADER_LEN,
};
pub use xml::parse_metadata_xml;

use crate::extract::{file_name_of, ExtractError, Extractor};
use crate::metadata::{declared_extension, MetadataBuilder, NormalizedMetadata};

/// Offset of the XML inside a metadata segment body with a preamble
const METADATA_XML_OFFSET: usize = 256;

const CZI_FORMATS: &[&str] = &["czi"];

/// Extractor for Zeiss CZI containers
#[derive(Debug, Clone, Default)]
pub struct CziExtractor {
    max_container_bytes: Option<u64>,
}

impl CziExtractor {
    /// Name recorded in the output
    pub const NAME: &'static str = "czi";

    /// Create an extractor, optionally refusing containers above a size
    pub fn new(max_container_bytes: Option<u64>) -> Self {
        Self {
            max_container_bytes,
        }
    }

    fn check_size(&self, file_name: &str, size: u64) -> Result<(), ExtractError> {
        match self.max_container_bytes {
            Some(limit) if size > limit => Err(ExtractError::ResourceLimit {
                file: file_name.to_string(),
                size,
                limit,
            }),
            _ => Ok(()),
        }
    }

    /// Decode an in-memory container
    pub fn decode_container(
        &self,
        bytes: &[u8],
        file_name: &str,
    ) -> Result<NormalizedMetadata, ExtractError> {
        if bytes.len() < FILE_HEADER_LEN {
            return Err(ExtractError::format(
                file_name,
                format!(
                    "file is {} bytes, shorter than the {}-byte header",
                    bytes.len(),
                    FILE_HEADER_LEN
                ),
            ));
        }
        if &bytes[..FILE_MAGIC.len()] != FILE_MAGIC {
            return Err(ExtractError::format(file_name, "missing ZISRAWFILE marker"));
        }

        let mut builder = MetadataBuilder::new(Self::NAME, "microscopy")
            .field("file_name", file_name)
            .field("format", "CZI")
            .field("manufacturer", "Carl Zeiss")
            .field("file_size_bytes", bytes.len() as u64);

        let mut scanner = SegmentScanner::new(bytes);
        let mut segment_count: u64 = 0;
        let mut subblock_count: u64 = 0;
        let mut attachment_count: u64 = 0;
        let mut metadata_payload = None;

        for segment in scanner.by_ref() {
            segment_count += 1;
            match segment.header.kind() {
                SegmentKind::Metadata if metadata_payload.is_none() => {
                    debug!("Metadata segment at offset {}", segment.offset);
                    metadata_payload = Some(segment.payload());
                }
                SegmentKind::SubBlock => subblock_count += 1,
                SegmentKind::Attachment => attachment_count += 1,
                _ => {}
            }
        }

        builder.insert("segment_count", segment_count);
        builder.insert("subblock_count", subblock_count);
        builder.insert("attachment_count", attachment_count);

        if let Some(stop) = scanner.stop() {
            warn!("Segment scan of {} stopped early: {}", file_name, stop);
            builder.push_note(format!("segment scan stopped: {}", stop));
        }

        let payload = match metadata_payload {
            Some(payload) => payload,
            None => {
                builder.push_note("no metadata segment found; instrument fields unavailable");
                return Ok(builder.build());
            }
        };

        let xml = metadata_xml(payload).map_err(|e| ExtractError::format(file_name, e.to_string()))?;
        let microscopy =
            parse_metadata_xml(xml).map_err(|e| ExtractError::format(file_name, e.to_string()))?;

        if microscopy.is_empty() {
            builder.push_note("metadata segment contained no recognised fields");
            return Ok(builder.build());
        }
        Ok(builder.microscopy(microscopy).build())
    }
}

/// XML text of a metadata segment body
///
/// The preamble layout is tried first: a u32 size at offset 0 and the XML at
/// offset 256. A body that does not fit it is taken as bare XML only when it
/// opens with a declaration or an element name.
fn metadata_xml(payload: &[u8]) -> Result<&str, CziError> {
    let declared = ByteCursor::new(payload).read_u32_le().unwrap_or(0) as u64;
    let behind_preamble = ByteCursor::at(payload, METADATA_XML_OFFSET)
        .and_then(|mut c| c.take(declared as usize))
        .filter(|xml| xml.first() == Some(&b'<'));

    let xml = match behind_preamble {
        Some(xml) => xml,
        None if is_bare_xml(payload) => payload,
        None => {
            return Err(CziError::XmlSizeOutOfBounds {
                declared,
                available: payload.len().saturating_sub(METADATA_XML_OFFSET),
            })
        }
    };
    Ok(std::str::from_utf8(xml)?.trim_end_matches('\0'))
}

fn is_bare_xml(payload: &[u8]) -> bool {
    let start = payload
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(payload.len());
    match &payload[start..] {
        [b'<', b'?', b'x', b'm', b'l', ..] => true,
        [b'<', c, ..] => c.is_ascii_alphabetic() || matches!(*c, b'_' | b':'),
        _ => false,
    }
}

impl Extractor for CziExtractor {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn supported_formats(&self) -> &'static [&'static str] {
        CZI_FORMATS
    }

    fn can_handle(&self, file_name: &str) -> bool {
        declared_extension(file_name) == "czi"
    }

    fn extract(&self, path: &Path) -> Result<NormalizedMetadata, ExtractError> {
        let file_name = file_name_of(path);
        let size = std::fs::metadata(path)
            .map_err(|e| ExtractError::io(&file_name, e))?
            .len();
        self.check_size(&file_name, size)?;

        let mut bytes = Vec::with_capacity(size as usize);
        File::open(path)
            .and_then(|mut f| f.read_to_end(&mut bytes))
            .map_err(|e| ExtractError::io(&file_name, e))?;
        self.decode_container(&bytes, &file_name)
    }

    fn extract_from_reader(
        &self,
        reader: &mut dyn Read,
        file_name: &str,
    ) -> Result<NormalizedMetadata, ExtractError> {
        let mut bytes = Vec::new();
        match self.max_container_bytes {
            Some(limit) => {
                reader
                    .take(limit.saturating_add(1))
                    .read_to_end(&mut bytes)
                    .map_err(|e| ExtractError::io(file_name, e))?;
                self.check_size(file_name, bytes.len() as u64)?;
            }
            None => {
                reader
                    .read_to_end(&mut bytes)
                    .map_err(|e| ExtractError::io(file_name, e))?;
            }
        }
        self.decode_container(&bytes, file_name)
    }
}
