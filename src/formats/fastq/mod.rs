//! # Sequencing Reads (FASTQ)
//!
//! Records are four lines: `@header`, sequence, `+[header]`, quality. The
//! decoder streams records, plain or gzip-compressed (multi-member archives
//! included), and stops after [`SAMPLE_SIZE`] records. Statistics therefore
//! describe a prefix of large files; the output says so through
//! `sample_limit` and `sampled`.
//!
//! Paired-end mates are recognised from the file name alone, and the first
//! read header is mined for the instrument, run, flowcell and lane when it
//! follows the Illumina layout.

mod error;
mod header;
mod pairing;
mod stats;


use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use log::debug;

pub use error::FastqError;
pub use header::{parse_illumina_header, IlluminaHeader};
pub use pairing::detect_read_pair;
pub use stats::{sample_records, ReadStats, Sample};

use crate::controlled_vocabulary::format_terms;
use crate::extract::{file_name_of, ExtractError, Extractor};
use crate::metadata::{declared_extension, MetadataBuilder, NormalizedMetadata, SequencingMetadata};

/// Maximum number of records examined per file
pub const SAMPLE_SIZE: usize = 10_000;

/// Phred+33 quality encoding
pub const QUALITY_OFFSET: u8 = 33;

const FASTQ_FORMATS: &[&str] = &["fastq", "fq", "fastq.gz", "fq.gz"];

/// Extractor for FASTQ read files
#[derive(Debug, Clone, Default)]
pub struct FastqExtractor;

impl FastqExtractor {
    /// Name recorded in the output
    pub const NAME: &'static str = "fastq";

    /// Create a FASTQ extractor
    pub fn new() -> Self {
        Self
    }

    fn is_compressed(file_name: &str) -> bool {
        declared_extension(file_name).ends_with(".gz")
    }

    /// Sample records from a decompressed stream and assemble the output
    fn summarize<R: BufRead>(
        reader: R,
        file_name: &str,
        compressed: bool,
    ) -> Result<NormalizedMetadata, ExtractError> {
        let sample = sample_records(reader, SAMPLE_SIZE).map_err(|e| match e {
            FastqError::IoError(source) => ExtractError::io(file_name, source),
            other => ExtractError::format(file_name, other.to_string()),
        })?;
        let stats = &sample.stats;
        debug!(
            "Sampled {} reads from {} (more: {})",
            stats.read_count, file_name, sample.has_more
        );

        let read_pair = detect_read_pair(file_name);
        let run = sample.first_header.as_deref().and_then(parse_illumina_header);

        let sequencing = SequencingMetadata {
            read_count: stats.read_count,
            total_bases: stats.total_bases,
            mean_read_length: stats.mean_length(),
            min_read_length: stats.min_length,
            max_read_length: stats.max_length,
            gc_content_percent: stats.gc_percent(),
            mean_quality: stats.mean_quality(),
            min_quality: stats.min_quality.unwrap_or(0),
            max_quality: stats.max_quality.unwrap_or(0),
            sample_limit: SAMPLE_SIZE,
            sampled: sample.has_more,
            paired_end: read_pair.is_some(),
            read_pair,
            compressed,
            instrument_id: run.as_ref().map(|r| r.instrument_id.clone()),
            run_number: run.as_ref().and_then(|r| r.run_number),
            flowcell_id: run.as_ref().and_then(|r| r.flowcell_id.clone()),
            lane: run.as_ref().and_then(|r| r.lane),
        };

        let mut builder = MetadataBuilder::new(Self::NAME, "sequencing")
            .field("file_name", file_name)
            .field("format", "FASTQ")
            .field("format_term", format_terms::fastq().accession)
            .sequencing(sequencing);

        if sample.has_more {
            builder.push_note(format!("statistics cover the first {} reads only", SAMPLE_SIZE));
        }

        Ok(builder.build())
    }
}

impl Extractor for FastqExtractor {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn supported_formats(&self) -> &'static [&'static str] {
        FASTQ_FORMATS
    }

    fn can_handle(&self, file_name: &str) -> bool {
        FASTQ_FORMATS.contains(&declared_extension(file_name).as_str())
    }

    fn extract(&self, path: &Path) -> Result<NormalizedMetadata, ExtractError> {
        let file_name = file_name_of(path);
        let file = File::open(path).map_err(|e| ExtractError::io(&file_name, e))?;
        self.extract_from_reader(&mut BufReader::new(file), &file_name)
    }

    fn extract_from_reader(
        &self,
        reader: &mut dyn Read,
        file_name: &str,
    ) -> Result<NormalizedMetadata, ExtractError> {
        if Self::is_compressed(file_name) {
            let decoder = MultiGzDecoder::new(reader);
            Self::summarize(BufReader::new(decoder), file_name, true)
        } else {
            Self::summarize(BufReader::new(reader), file_name, false)
        }
    }
}
