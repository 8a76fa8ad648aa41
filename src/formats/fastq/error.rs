/// Errors raised while decoding read records
#[derive(Debug, thiserror::Error)]
pub enum FastqError {
    /// Header line does not start with '@'
    #[error("line {line}: expected '@' at the start of a record header")]
    MissingHeaderMarker {
        /// 1-based line number
        line: u64,
    },

    /// Third line of a record does not start with '+'
    #[error("line {line}: expected '+' separator line")]
    MissingSeparator {
        /// 1-based line number
        line: u64,
    },

    /// Input ended in the middle of a record
    #[error("record starting at line {line} is truncated")]
    TruncatedRecord {
        /// 1-based line number of the record header
        line: u64,
    },

    /// Input held no records at all
    #[error("no reads found")]
    NoRecords,

    /// I/O error (including gzip decoding)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
