use super::*;
use chrono::{TimeZone, Utc};
use serde_json::json;

#[test]
fn test_declared_extension() {
    assert_eq!(declared_extension("image.CZI"), "czi");
    assert_eq!(declared_extension("sample_R1_001.fastq.gz"), "fastq.gz");
    assert_eq!(declared_extension("reads.gz"), "gz");
    assert_eq!(declared_extension("README"), "");
    assert_eq!(declared_extension("table.tsv"), "tsv");
}

#[test]
fn test_descriptor_from_bytes() {
    let descriptor = FileDescriptor::from_bytes("hello.txt", b"hello world", true);

    assert_eq!(descriptor.file_name(), "hello.txt");
    assert_eq!(descriptor.extension(), "txt");
    assert_eq!(descriptor.size_bytes(), 11);
    assert_eq!(
        descriptor.checksum_sha256(),
        Some("b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9")
    );
    assert!(descriptor.path().is_none());
}

#[test]
fn test_descriptor_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.fastq.gz");
    std::fs::write(&path, b"hello world").unwrap();

    let descriptor = FileDescriptor::from_path(&path, false).unwrap();
    assert_eq!(descriptor.extension(), "fastq.gz");
    assert_eq!(descriptor.size_bytes(), 11);
    assert!(descriptor.checksum_sha256().is_none());
}

#[test]
fn test_builder_and_accessors() {
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let metadata = MetadataBuilder::new("generic", "generic")
        .field("file_name", "a.bin")
        .field("file_size_bytes", 42u64)
        .note("nothing special")
        .build_at(at);

    assert_eq!(metadata.extractor_name(), "generic");
    assert_eq!(metadata.schema_name(), "generic");
    assert_eq!(metadata.extracted_at(), at);
    assert_eq!(metadata.get_str("file_name"), Some("a.bin"));
    assert_eq!(metadata.get("file_size_bytes"), Some(&json!(42)));
    assert_eq!(metadata.notes(), ["nothing special".to_string()]);

    let map = metadata.to_field_map();
    assert_eq!(map.get("extractor_name"), Some(&json!("generic")));
    assert!(map.contains_key("extracted_at"));
}

#[test]
fn test_microscopy_flattening() {
    let microscopy = MicroscopyMetadata {
        microscope_model: Some("Axio Observer.Z1".to_string()),
        objective: Some(ObjectiveInfo {
            magnification: Some(63.0),
            immersion: Some("Oil".to_string()),
            ..Default::default()
        }),
        channels: vec![ChannelInfo {
            name: Some("DAPI".to_string()),
            ..Default::default()
        }],
        scaling: PhysicalScaling {
            x_um: Some(0.1),
            ..Default::default()
        },
        ..Default::default()
    };

    let metadata = MetadataBuilder::new("czi", "microscopy")
        .microscopy(microscopy)
        .build();

    assert_eq!(metadata.get_str("instrument_model"), Some("Axio Observer.Z1"));
    assert_eq!(metadata.get("objective_magnification"), Some(&json!(63.0)));
    assert_eq!(metadata.get("channel_count"), Some(&json!(1)));
    assert_eq!(metadata.get("channels"), Some(&json!([{"name": "DAPI"}])));
    assert!(metadata.get("image_size_x").is_none());
    assert!(metadata.microscopy().is_some());
}

#[test]
fn test_empty_microscopy() {
    assert!(MicroscopyMetadata::new().is_empty());
    assert!(MicroscopyMetadata::new().to_fields().is_empty());
}

#[test]
fn test_metadata_json_roundtrip() {
    let sequencing = SequencingMetadata {
        read_count: 3,
        total_bases: 98,
        paired_end: true,
        read_pair: Some("R1".to_string()),
        ..Default::default()
    };
    let metadata = MetadataBuilder::new("fastq", "sequencing")
        .sequencing(sequencing)
        .build();

    let json = metadata.to_json().unwrap();
    let restored = NormalizedMetadata::from_json(&json).unwrap();

    assert_eq!(restored, metadata);
    assert_eq!(restored.sequencing().map(|s| s.total_bases), Some(98));
}
