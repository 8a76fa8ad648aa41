use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::FieldMap;

/// Read statistics and run identity from a sequencing reads file
///
/// Statistics cover at most `sample_limit` reads; `sampled` is set when the
/// file held more reads than were examined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequencingMetadata {
    /// Number of reads examined
    pub read_count: u64,
    /// Total bases across examined reads
    pub total_bases: u64,
    /// Mean read length
    pub mean_read_length: f64,
    /// Shortest read length
    pub min_read_length: u64,
    /// Longest read length
    pub max_read_length: u64,
    /// G+C share of all bases, in percent
    pub gc_content_percent: f64,
    /// Mean per-base quality score
    pub mean_quality: f64,
    /// Lowest per-base quality score
    pub min_quality: u8,
    /// Highest per-base quality score
    pub max_quality: u8,
    /// Upper bound on reads examined
    pub sample_limit: usize,
    /// True when reads remained beyond the sample limit
    pub sampled: bool,
    /// True when the file name identifies one mate of a pair
    pub paired_end: bool,
    /// Mate label ("R1" or "R2")
    pub read_pair: Option<String>,
    /// Whether the input was gzip compressed
    pub compressed: bool,
    /// Instrument identifier from the first read header
    pub instrument_id: Option<String>,
    /// Run number from the first read header
    pub run_number: Option<u64>,
    /// Flowcell identifier from the first read header
    pub flowcell_id: Option<String>,
    /// Flowcell lane from the first read header
    pub lane: Option<u32>,
}

impl SequencingMetadata {
    /// Flatten into the field names used by schemas and tag projection
    pub fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        let mut put = |key: &str, value: Value| {
            fields.insert(key.to_string(), value);
        };

        put("read_count", Value::from(self.read_count));
        put("total_bases", Value::from(self.total_bases));
        put("mean_read_length", Value::from(self.mean_read_length));
        put("min_read_length", Value::from(self.min_read_length));
        put("max_read_length", Value::from(self.max_read_length));
        put("gc_content_percent", Value::from(self.gc_content_percent));
        put("mean_quality", Value::from(self.mean_quality));
        put("min_quality", Value::from(self.min_quality));
        put("max_quality", Value::from(self.max_quality));
        put("sample_limit", Value::from(self.sample_limit));
        put("sampled", Value::from(self.sampled));
        put("paired_end", Value::from(self.paired_end));
        put("compressed", Value::from(self.compressed));

        if let Some(pair) = &self.read_pair {
            put("read_pair", Value::from(pair.clone()));
        }
        if let Some(instrument) = &self.instrument_id {
            put("instrument_id", Value::from(instrument.clone()));
        }
        if let Some(run) = self.run_number {
            put("run_number", Value::from(run));
        }
        if let Some(flowcell) = &self.flowcell_id {
            put("flowcell_id", Value::from(flowcell.clone()));
        }
        if let Some(lane) = self.lane {
            put("lane", Value::from(lane));
        }

        fields
    }
}
