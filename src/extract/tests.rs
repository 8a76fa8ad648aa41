use super::*;
use crate::config::ExtractionConfig;
use serde_json::json;
use std::io::Cursor;

fn config() -> ExtractionConfig {
    ExtractionConfig {
        compute_checksum: false,
        max_container_bytes: None,
    }
}

struct NamedOnly(&'static str, &'static str);

impl Extractor for NamedOnly {
    fn name(&self) -> &'static str {
        self.0
    }

    fn supported_formats(&self) -> &'static [&'static str] {
        &["dat"]
    }

    fn can_handle(&self, file_name: &str) -> bool {
        file_name.ends_with(self.1)
    }

    fn extract(&self, path: &Path) -> Result<NormalizedMetadata, ExtractError> {
        let file = file_name_of(path);
        Ok(crate::metadata::MetadataBuilder::new(self.0, "generic")
            .field("file_name", file)
            .build())
    }

    fn extract_from_reader(
        &self,
        _reader: &mut dyn Read,
        file_name: &str,
    ) -> Result<NormalizedMetadata, ExtractError> {
        Ok(crate::metadata::MetadataBuilder::new(self.0, "generic")
            .field("file_name", file_name)
            .build())
    }
}

#[test]
fn test_fallback_is_last() {
    let mut registry = ExtractorRegistry::new(&config());
    registry.register(Box::new(NamedOnly("first", ".dat")));
    registry.register(Box::new(NamedOnly("second", ".dat")));

    assert_eq!(registry.names(), vec!["first", "second", "generic"]);
    assert_eq!(registry.find("x.dat").unwrap().name(), "first");
    assert_eq!(registry.find("x.unknown").unwrap().name(), "generic");
}

#[test]
fn test_not_found_without_fallback() {
    let registry = ExtractorRegistry::without_fallback(&config());
    let err = registry.find("mystery.bin").err().unwrap();

    assert!(matches!(err, ExtractError::NotFound { .. }));
    assert_eq!(err.file(), "mystery.bin");
}

#[test]
fn test_default_dispatch() {
    let registry = ExtractorRegistry::with_defaults(&config());

    assert_eq!(registry.find("notes.csv").unwrap().name(), "text");
    assert_eq!(registry.find("blob.bin").unwrap().name(), "generic");
    #[cfg(feature = "fastq")]
    assert_eq!(registry.find("reads_R1.fq.gz").unwrap().name(), "fastq");
    #[cfg(feature = "czi")]
    assert_eq!(registry.find("cells.CZI").unwrap().name(), "czi");

    let formats = registry.supported_formats();
    assert!(formats.contains(&"csv"));
    assert!(!formats.contains(&"*"));
}

#[test]
fn test_generic_from_reader() {
    let registry = ExtractorRegistry::new(&ExtractionConfig::default());
    let mut reader = Cursor::new(b"hello world".to_vec());
    let extraction = registry.extract_from_reader(&mut reader, "blob.bin").unwrap();

    assert_eq!(extraction.file.size_bytes(), 11);
    assert!(extraction.file.checksum_sha256().is_some());

    let metadata = extraction.metadata;
    assert_eq!(metadata.extractor_name(), "generic");
    assert_eq!(metadata.get("format"), Some(&json!("BIN")));
    assert_eq!(metadata.get("file_size_bytes"), Some(&json!(11)));
    assert_eq!(
        metadata.get_str("checksum_sha256"),
        Some("b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9")
    );
}

#[test]
fn test_generic_without_extension() {
    let extractor = GenericExtractor::new(false);
    let metadata = extractor
        .extract_from_reader(&mut Cursor::new(Vec::new()), "README")
        .unwrap();

    assert_eq!(metadata.get_str("format"), Some("unknown"));
    assert!(metadata.get("extension").is_none());
    assert!(metadata.get("checksum_sha256").is_none());
}

#[test]
fn test_generic_from_path_reports_modified() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.h5");
    std::fs::write(&path, [0u8; 64]).unwrap();

    let registry = ExtractorRegistry::new(&config());
    let extraction = registry.extract(&path).unwrap();

    assert_eq!(extraction.file.extension(), "h5");
    assert_eq!(extraction.metadata.get_str("format"), Some("H5"));
    assert!(extraction.metadata.get_str("modified").is_some());
}

#[test]
fn test_text_csv_header() {
    let data = b"sample,condition,replicate\nA,ctrl,1\nB,treated,2\n";
    let metadata = TextExtractor::new()
        .extract_from_reader(&mut Cursor::new(data.to_vec()), "design.csv")
        .unwrap();

    assert_eq!(metadata.extractor_name(), "text");
    assert_eq!(metadata.get_str("format"), Some("CSV"));
    assert_eq!(metadata.get("line_count"), Some(&json!(3)));
    assert_eq!(metadata.get("column_count"), Some(&json!(3)));
    assert_eq!(
        metadata.get("columns"),
        Some(&json!(["sample", "condition", "replicate"]))
    );
    assert_eq!(metadata.get_str("encoding"), Some("utf-8"));
}

#[test]
fn test_text_tsv_skips_blank_leading_lines() {
    let data = b"\n\"gene\"\t\"count\"\nACTB\t10\n";
    let metadata = TextExtractor::new()
        .extract_from_reader(&mut Cursor::new(data.to_vec()), "counts.tsv")
        .unwrap();

    assert_eq!(metadata.get_str("format"), Some("TSV"));
    assert_eq!(metadata.get("columns"), Some(&json!(["gene", "count"])));
}

#[test]
fn test_text_empty_file_noted() {
    let metadata = TextExtractor::new()
        .extract_from_reader(&mut Cursor::new(Vec::new()), "empty.txt")
        .unwrap();

    assert_eq!(metadata.get("line_count"), Some(&json!(0)));
    assert!(metadata.get("columns").is_none());
    assert_eq!(metadata.notes().len(), 1);
}

#[test]
fn test_batch_continues_past_failures() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("ok.txt");
    std::fs::write(&good, "one\ntwo\n").unwrap();
    let missing = dir.path().join("missing.txt");

    let registry = ExtractorRegistry::with_defaults(&config());
    let items = registry.extract_batch(&[missing.clone(), good.clone()]);

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].path, missing);
    assert!(matches!(items[0].result, Err(ExtractError::Io { .. })));
    let ok = items[1].result.as_ref().unwrap();
    assert_eq!(ok.metadata.get("line_count"), Some(&json!(2)));
}

#[test]
fn test_text_quoted_header_keeps_delimiter() {
    let data = b"\"name, full\",age\nx,1\n";
    let metadata = TextExtractor::new()
        .extract_from_reader(&mut Cursor::new(data.to_vec()), "people.csv")
        .unwrap();

    assert_eq!(metadata.get("column_count"), Some(&json!(2)));
    assert_eq!(metadata.get("columns"), Some(&json!(["name, full", "age"])));
}

#[test]
fn test_generic_reports_registry_descriptor() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.raw");
    std::fs::write(&path, b"instrument bytes").unwrap();

    let registry = ExtractorRegistry::new(&ExtractionConfig::default());
    let extraction = registry.extract(&path).unwrap();
    assert_eq!(
        extraction.metadata.get_str("checksum_sha256"),
        extraction.file.checksum_sha256()
    );

    // Attributes come from the descriptor handed in, not from the file
    let described = FileDescriptor::from_bytes("scan.raw", b"other", true);
    let metadata = GenericExtractor::new(false)
        .extract_described(&path, &described)
        .unwrap();
    assert_eq!(metadata.get("file_size_bytes"), Some(&json!(5)));
    assert_eq!(
        metadata.get_str("checksum_sha256"),
        described.checksum_sha256()
    );
    assert!(metadata.get_str("modified").is_some());
}

struct CountingReader<R> {
    inner: R,
    consumed: std::rc::Rc<std::cell::Cell<u64>>,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.consumed.set(self.consumed.get() + n as u64);
        Ok(n)
    }
}

#[cfg(feature = "fastq")]
#[test]
fn test_stream_reads_only_fastq_sample() {
    use crate::formats::fastq::SAMPLE_SIZE;

    let data: Vec<u8> = (0..SAMPLE_SIZE * 4)
        .flat_map(|i| format!("@read{i}\nACGTACGTAC\n+\nIIIIIIIIII\n").into_bytes())
        .collect();
    let consumed = std::rc::Rc::new(std::cell::Cell::new(0));
    let mut reader = CountingReader {
        inner: Cursor::new(data.clone()),
        consumed: consumed.clone(),
    };

    let registry = ExtractorRegistry::with_defaults(&ExtractionConfig::default());
    let extraction = registry
        .extract_from_reader(&mut reader, "big.fastq")
        .unwrap();

    assert_eq!(extraction.metadata.extractor_name(), "fastq");
    assert!(consumed.get() < data.len() as u64 / 2);
    assert_eq!(extraction.file.size_bytes(), consumed.get());
    assert_eq!(extraction.file.checksum_sha256(), None);
}

#[test]
fn test_stream_read_to_end_has_checksum() {
    let consumed = std::rc::Rc::new(std::cell::Cell::new(0));
    let mut reader = CountingReader {
        inner: Cursor::new(b"a\nb\nc\n".to_vec()),
        consumed: consumed.clone(),
    };

    let registry = ExtractorRegistry::with_defaults(&ExtractionConfig::default());
    let extraction = registry.extract_from_reader(&mut reader, "notes.txt").unwrap();

    assert_eq!(consumed.get(), 6);
    assert_eq!(extraction.file.size_bytes(), 6);
    assert_eq!(extraction.file.checksum_sha256().map(str::len), Some(64));
    assert_eq!(extraction.metadata.get("line_count"), Some(&json!(3)));
}
