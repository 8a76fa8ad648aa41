use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use serde_json::Value;

use super::{file_name_of, ExtractError, Extractor};
use crate::controlled_vocabulary::format_terms;
use crate::metadata::{declared_extension, MetadataBuilder, NormalizedMetadata};

const TEXT_FORMATS: &[&str] = &["txt", "csv", "tsv", "tab", "log", "md"];

/// Header cells kept in the `columns` field
const MAX_COLUMNS: usize = 100;

/// Plain and delimited text files: line counts, plus the header row for
/// CSV/TSV
#[derive(Debug, Clone, Default)]
pub struct TextExtractor;

impl TextExtractor {
    /// Name recorded in the output
    pub const NAME: &'static str = "text";

    /// Create a text extractor
    pub fn new() -> Self {
        Self
    }

    fn delimiter_for(extension: &str) -> Option<u8> {
        match extension {
            "csv" => Some(b','),
            "tsv" | "tab" => Some(b'\t'),
            _ => None,
        }
    }

    fn header_cells(
        line: &[u8],
        delimiter: u8,
        file_name: &str,
    ) -> Result<Vec<String>, ExtractError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .has_headers(true)
            .from_reader(line);

        let headers = reader
            .byte_headers()
            .map_err(|e| ExtractError::format(file_name, e.to_string()))?;
        Ok(headers
            .iter()
            .map(|cell| String::from_utf8_lossy(cell).trim().to_string())
            .collect())
    }

    fn scan<R: BufRead>(mut reader: R, file_name: &str) -> Result<NormalizedMetadata, ExtractError> {
        let extension = declared_extension(file_name);
        let delimiter = Self::delimiter_for(&extension);

        let mut line = Vec::new();
        let mut line_count: u64 = 0;
        let mut byte_count: u64 = 0;
        let mut valid_utf8 = true;
        let mut header: Option<Vec<String>> = None;

        loop {
            line.clear();
            let n = reader
                .read_until(b'\n', &mut line)
                .map_err(|e| ExtractError::io(file_name, e))?;
            if n == 0 {
                break;
            }
            line_count += 1;
            byte_count += n as u64;
            valid_utf8 &= std::str::from_utf8(&line).is_ok();

            match delimiter {
                Some(delim)
                    if header.is_none() && !line.iter().all(u8::is_ascii_whitespace) =>
                {
                    header = Some(Self::header_cells(&line, delim, file_name)?);
                }
                _ => {}
            }
        }

        let (format, term) = match delimiter {
            Some(b',') => ("CSV", format_terms::csv()),
            Some(_) => ("TSV", format_terms::tsv()),
            None => ("TEXT", format_terms::textual()),
        };

        let mut builder = MetadataBuilder::new(Self::NAME, "generic")
            .field("file_name", file_name)
            .field("format", format)
            .field("format_term", term.accession)
            .field("file_size_bytes", byte_count)
            .field("line_count", line_count)
            .field("encoding", if valid_utf8 { "utf-8" } else { "unknown" });

        if let Some(columns) = header {
            builder.insert("column_count", columns.len() as u64);
            let kept: Vec<Value> = columns
                .into_iter()
                .take(MAX_COLUMNS)
                .map(Value::from)
                .collect();
            builder.insert("columns", Value::Array(kept));
        }

        if line_count == 0 {
            builder.push_note("file is empty");
        }

        Ok(builder.build())
    }
}

impl Extractor for TextExtractor {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn supported_formats(&self) -> &'static [&'static str] {
        TEXT_FORMATS
    }

    fn can_handle(&self, file_name: &str) -> bool {
        TEXT_FORMATS.contains(&declared_extension(file_name).as_str())
    }

    fn extract(&self, path: &Path) -> Result<NormalizedMetadata, ExtractError> {
        let file_name = file_name_of(path);
        let file = File::open(path).map_err(|e| ExtractError::io(&file_name, e))?;
        Self::scan(BufReader::new(file), &file_name)
    }

    fn extract_from_reader(
        &self,
        reader: &mut dyn Read,
        file_name: &str,
    ) -> Result<NormalizedMetadata, ExtractError> {
        Self::scan(BufReader::new(reader), file_name)
    }
}
