use std::io::BufRead;

use super::{FastqError, QUALITY_OFFSET};

/// Running read statistics over a sample of records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadStats {
    /// Records examined
    pub read_count: u64,
    /// Bases across examined records
    pub total_bases: u64,
    /// Shortest sequence
    pub min_length: u64,
    /// Longest sequence
    pub max_length: u64,
    /// G and C bases, either case
    pub gc_bases: u64,
    /// Sum of decoded quality scores
    pub quality_sum: u64,
    /// Quality characters decoded
    pub quality_count: u64,
    /// Lowest decoded quality
    pub min_quality: Option<u8>,
    /// Highest decoded quality
    pub max_quality: Option<u8>,
}

impl ReadStats {
    /// Fold one record into the statistics
    pub fn add_record(&mut self, sequence: &[u8], quality: &[u8]) {
        let len = sequence.len() as u64;
        if self.read_count == 0 {
            self.min_length = len;
            self.max_length = len;
        } else {
            self.min_length = self.min_length.min(len);
            self.max_length = self.max_length.max(len);
        }
        self.read_count += 1;
        self.total_bases += len;
        self.gc_bases += sequence
            .iter()
            .filter(|b| matches!(b, b'G' | b'g' | b'C' | b'c'))
            .count() as u64;

        for &q in quality {
            let score = q.saturating_sub(QUALITY_OFFSET);
            self.quality_sum += u64::from(score);
            self.quality_count += 1;
            self.min_quality = Some(self.min_quality.map_or(score, |m| m.min(score)));
            self.max_quality = Some(self.max_quality.map_or(score, |m| m.max(score)));
        }
    }

    /// Mean sequence length
    pub fn mean_length(&self) -> f64 {
        if self.read_count == 0 {
            0.0
        } else {
            self.total_bases as f64 / self.read_count as f64
        }
    }

    /// G+C share of all bases, in percent
    pub fn gc_percent(&self) -> f64 {
        if self.total_bases == 0 {
            0.0
        } else {
            self.gc_bases as f64 / self.total_bases as f64 * 100.0
        }
    }

    /// Mean decoded quality score
    pub fn mean_quality(&self) -> f64 {
        if self.quality_count == 0 {
            0.0
        } else {
            self.quality_sum as f64 / self.quality_count as f64
        }
    }
}

/// Outcome of reading up to the sample bound
#[derive(Debug, Clone, Default)]
pub struct Sample {
    /// Statistics over the examined records
    pub stats: ReadStats,
    /// True when further records followed the last one examined
    pub has_more: bool,
    /// Header line of the first record, without line terminator
    pub first_header: Option<String>,
}

/// Line source tracking 1-based line numbers
struct Lines<R> {
    reader: R,
    buf: Vec<u8>,
    line: u64,
}

impl<R: BufRead> Lines<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line: 0,
        }
    }

    /// Next line without its terminator; `None` at end of input
    fn next_line(&mut self) -> Result<Option<&[u8]>, FastqError> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        self.line += 1;
        let mut end = self.buf.len();
        while end > 0 && matches!(self.buf[end - 1], b'\n' | b'\r') {
            end -= 1;
        }
        Ok(Some(&self.buf[..end]))
    }

    /// Next line that is not blank; used only where a record header is due
    fn next_non_blank(&mut self) -> Result<Option<Vec<u8>>, FastqError> {
        loop {
            match self.next_line()? {
                None => return Ok(None),
                Some(line) if line.iter().all(u8::is_ascii_whitespace) => continue,
                Some(line) => return Ok(Some(line.to_vec())),
            }
        }
    }
}

/// Read at most `limit` four-line records and accumulate statistics
///
/// Blank lines are tolerated between records only. Reading stops at the
/// bound; the one line after it is peeked to set [`Sample::has_more`].
pub fn sample_records<R: BufRead>(reader: R, limit: usize) -> Result<Sample, FastqError> {
    let mut lines = Lines::new(reader);
    let mut sample = Sample::default();
    let mut sequence = Vec::new();

    while (sample.stats.read_count as usize) < limit {
        let header = match lines.next_non_blank()? {
            Some(header) => header,
            None => break,
        };
        let header_line = lines.line;
        if header.first() != Some(&b'@') {
            return Err(FastqError::MissingHeaderMarker { line: header_line });
        }
        if sample.first_header.is_none() {
            sample.first_header = Some(String::from_utf8_lossy(&header).into_owned());
        }

        sequence.clear();
        match lines.next_line()? {
            Some(line) => sequence.extend_from_slice(line),
            None => return Err(FastqError::TruncatedRecord { line: header_line }),
        }

        let has_separator = match lines.next_line()? {
            Some(line) => line.first() == Some(&b'+'),
            None => return Err(FastqError::TruncatedRecord { line: header_line }),
        };
        if !has_separator {
            return Err(FastqError::MissingSeparator { line: lines.line });
        }

        let quality = match lines.next_line()? {
            Some(line) => line,
            None => return Err(FastqError::TruncatedRecord { line: header_line }),
        };
        sample.stats.add_record(&sequence, quality);
    }

    if sample.stats.read_count == 0 {
        return Err(FastqError::NoRecords);
    }

    sample.has_more = lines.next_non_blank()?.is_some();
    Ok(sample)
}
