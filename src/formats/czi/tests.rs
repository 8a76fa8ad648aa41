use super::*;
use serde_json::json;

const SAMPLE_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<ImageDocument>
  <Metadata>
    <Information>
      <Application>
        <Name>ZEN 3.4 (blue edition)</Name>
        <Version>3.4.91.00000</Version>
      </Application>
      <Document>
        <UserName>fallback-user</UserName>
        <CreationDate>2021-01-01T00:00:00</CreationDate>
      </Document>
      <User Id="User:0">
        <DisplayName>Jane Doe</DisplayName>
      </User>
      <Image>
        <SizeX>2048</SizeX>
        <SizeY>1536</SizeY>
        <SizeZ>12</SizeZ>
        <SizeC>2</SizeC>
        <SizeT>1</SizeT>
        <ComponentBitCount>14</ComponentBitCount>
        <PixelType>Gray16</PixelType>
        <AcquisitionDateAndTime>2021-06-15T09:30:00.1234567Z</AcquisitionDateAndTime>
        <Dimensions>
          <Channels>
            <Channel Id="Channel:0" Name="DAPI">
              <ExcitationWavelength>353</ExcitationWavelength>
              <EmissionWavelength>465</EmissionWavelength>
              <Fluor>DAPI</Fluor>
            </Channel>
            <Channel Id="Channel:1" Name="EGFP">
              <ExcitationWavelength>488</ExcitationWavelength>
              <EmissionWavelength>509</EmissionWavelength>
              <Fluor>EGFP</Fluor>
            </Channel>
          </Channels>
        </Dimensions>
      </Image>
      <Instrument>
        <Microscopes>
          <Microscope Id="Microscope:1" Name="Axio Observer.Z1 / 7">
            <System>Axio Observer</System>
          </Microscope>
        </Microscopes>
        <Objectives>
          <Objective Id="Objective:1" Name="Plan-Apochromat 63x/1.40 Oil DIC M27">
            <Immersion>Oil</Immersion>
            <LensNA>1.4</LensNA>
            <NominalMagnification>63</NominalMagnification>
          </Objective>
          <Objective Id="Objective:2" Name="EC Plan-Neofluar 10x/0.30">
            <Immersion>Air</Immersion>
            <LensNA>0.3</LensNA>
            <NominalMagnification>10</NominalMagnification>
          </Objective>
        </Objectives>
      </Instrument>
    </Information>
    <Scaling>
      <Items>
        <Distance Id="X"><Value>1.0E-07</Value></Distance>
        <Distance Id="Y"><Value>1.0E-07</Value></Distance>
        <Distance Id="Z"><Value>2.5E-07</Value></Distance>
      </Items>
    </Scaling>
  </Metadata>
</ImageDocument>"#;

fn file_header() -> Vec<u8> {
    let mut data = b"ZISRAWFILE".to_vec();
    data.resize(FILE_HEADER_LEN, 0);
    data
}

fn push_segment(data: &mut Vec<u8>, id: &str, body: &[u8]) {
    let mut raw_id = [0u8; 16];
    raw_id[..id.len()].copy_from_slice(id.as_bytes());
    data.extend_from_slice(&raw_id);
    data.extend_from_slice(&(body.len() as u64).to_le_bytes());
    data.extend_from_slice(&(body.len() as u64).to_le_bytes());
    data.extend_from_slice(body);
}

fn container_with_xml(xml: &str) -> Vec<u8> {
    let mut data = file_header();
    push_segment(&mut data, "ZISRAWDIRECTORY", &[0u8; 8]);
    push_segment(&mut data, "ZISRAWSUBBLOCK", &[1u8; 64]);
    push_segment(&mut data, "ZISRAWMETADATA", xml.as_bytes());
    push_segment(&mut data, "ZISRAWATTACH", &[2u8; 16]);
    data
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_cursor_bounds() {
    let data = [1u8, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0];
    let mut cursor = ByteCursor::new(&data);

    assert_eq!(cursor.read_u32_le(), Some(1));
    assert_eq!(cursor.read_u64_le(), Some(2));
    assert_eq!(cursor.read_u32_le(), None);
    assert_eq!(cursor.position(), 12);

    let mut cursor = ByteCursor::new(&data);
    assert_eq!(cursor.take(usize::MAX), None);
    assert_eq!(cursor.position(), 0);
    assert!(ByteCursor::at(&data, 13).is_none());
}

#[test]
fn test_short_buffer_is_format_error() {
    let extractor = CziExtractor::default();
    for len in [0usize, 1, 10, 15] {
        let data = vec![b'Z'; len];
        let err = extractor.decode_container(&data, "short.czi").unwrap_err();
        assert!(err.is_format_error(), "len {len}");
    }
}

#[test]
fn test_bad_marker_is_format_error() {
    let mut data = b"NOTACZIFILE!".to_vec();
    data.resize(64, 0);
    let err = CziExtractor::default()
        .decode_container(&data, "fake.czi")
        .unwrap_err();
    assert!(err.is_format_error());
    assert_eq!(err.file(), "fake.czi");
}

#[test]
fn test_header_only_has_no_instrument_fields() {
    let metadata = CziExtractor::default()
        .decode_container(&file_header(), "empty.czi")
        .unwrap();

    assert_eq!(metadata.get_str("format"), Some("CZI"));
    assert_eq!(metadata.get_str("manufacturer"), Some("Carl Zeiss"));
    assert_eq!(metadata.get("segment_count"), Some(&json!(0)));
    assert!(metadata.get("instrument_model").is_none());
    assert!(metadata.microscopy().is_none());
    assert_eq!(metadata.notes().len(), 1);
    assert!(metadata.notes()[0].contains("no metadata segment"));
}

#[test]
fn test_full_metadata_mapping() {
    let data = container_with_xml(SAMPLE_XML);
    let metadata = CziExtractor::default()
        .decode_container(&data, "cells.czi")
        .unwrap();

    assert_eq!(metadata.extractor_name(), "czi");
    assert_eq!(metadata.schema_name(), "microscopy");
    assert_eq!(metadata.get("segment_count"), Some(&json!(4)));
    assert_eq!(metadata.get("subblock_count"), Some(&json!(1)));
    assert_eq!(metadata.get("attachment_count"), Some(&json!(1)));
    assert!(metadata.notes().is_empty());

    let m = metadata.microscopy().unwrap();
    assert_eq!(m.microscope_model.as_deref(), Some("Axio Observer.Z1 / 7"));

    let objective = m.objective.as_ref().unwrap();
    assert_eq!(
        objective.name.as_deref(),
        Some("Plan-Apochromat 63x/1.40 Oil DIC M27")
    );
    assert_eq!(objective.magnification, Some(63.0));
    assert_eq!(objective.numerical_aperture, Some(1.4));
    assert_eq!(objective.immersion.as_deref(), Some("Oil"));

    assert_eq!(m.dimensions.size_x, Some(2048));
    assert_eq!(m.dimensions.size_y, Some(1536));
    assert_eq!(m.dimensions.size_z, Some(12));
    assert_eq!(m.dimensions.size_c, Some(2));
    assert_eq!(m.dimensions.size_t, Some(1));
    assert_eq!(m.dimensions.bit_depth, Some(14));
    assert_eq!(m.dimensions.pixel_type.as_deref(), Some("Gray16"));

    assert_eq!(m.channels.len(), 2);
    assert_eq!(m.channels[0].id.as_deref(), Some("Channel:0"));
    assert_eq!(m.channels[0].name.as_deref(), Some("DAPI"));
    assert_eq!(m.channels[1].excitation_wavelength_nm, Some(488.0));
    assert_eq!(m.channels[1].emission_wavelength_nm, Some(509.0));
    assert_eq!(m.channels[1].dye.as_deref(), Some("EGFP"));

    assert!(approx(m.scaling.x_um.unwrap(), 0.1));
    assert!(approx(m.scaling.y_um.unwrap(), 0.1));
    assert!(approx(m.scaling.z_um.unwrap(), 0.25));

    assert_eq!(m.operator.as_deref(), Some("Jane Doe"));
    let date = m.acquisition_date.as_deref().unwrap();
    assert!(date.starts_with("2021-06-15T09:30:00.123456"), "{date}");

    let app = m.application.as_ref().unwrap();
    assert_eq!(app.name.as_deref(), Some("ZEN 3.4 (blue edition)"));
    assert_eq!(app.version.as_deref(), Some("3.4.91.00000"));

    assert_eq!(metadata.get("channel_count"), Some(&json!(2)));
    assert_eq!(metadata.get("objective_na"), Some(&json!(1.4)));
    assert_eq!(metadata.get_str("operator"), Some("Jane Doe"));
}

#[test]
fn test_repeated_extraction_is_deterministic() {
    let data = container_with_xml(SAMPLE_XML);
    let extractor = CziExtractor::default();

    let first = extractor.decode_container(&data, "cells.czi").unwrap();
    let second = extractor.decode_container(&data, "cells.czi").unwrap();

    assert_eq!(first.fields(), second.fields());
    assert_eq!(first.microscopy(), second.microscopy());
    assert_eq!(first.notes(), second.notes());
}

#[test]
fn test_operator_falls_back_to_document_user() {
    let xml = "<ImageDocument><Metadata><Information><Document>\
               <UserName>lab-account</UserName></Document></Information></Metadata></ImageDocument>";
    let m = parse_metadata_xml(xml).unwrap();
    assert_eq!(m.operator.as_deref(), Some("lab-account"));
}

#[test]
fn test_raw_timestamp_kept() {
    let xml = "<ImageDocument><Metadata><Information><Image>\
               <AcquisitionDateAndTime>15.06.2021 09:30</AcquisitionDateAndTime>\
               </Image></Information></Metadata></ImageDocument>";
    let m = parse_metadata_xml(xml).unwrap();
    assert_eq!(m.acquisition_date.as_deref(), Some("15.06.2021 09:30"));
}

#[test]
fn test_channels_outside_dimensions_ignored() {
    let xml = "<ImageDocument><Metadata><DisplaySetting><Channels>\
               <Channel Id=\"Channel:0\" Name=\"DAPI\"/></Channels></DisplaySetting>\
               </Metadata></ImageDocument>";
    let m = parse_metadata_xml(xml).unwrap();
    assert!(m.channels.is_empty());
}

#[test]
fn test_empty_channel_element() {
    let xml = "<ImageDocument><Metadata><Information><Image><Dimensions><Channels>\
               <Channel Id=\"Channel:0\" Name=\"Brightfield\"/></Channels></Dimensions>\
               </Image></Information></Metadata></ImageDocument>";
    let m = parse_metadata_xml(xml).unwrap();
    assert_eq!(m.channels.len(), 1);
    assert_eq!(m.channels[0].name.as_deref(), Some("Brightfield"));
}

#[test]
fn test_unparseable_values_skipped() {
    let xml = "<ImageDocument><Metadata><Information><Image>\
               <SizeX>wide</SizeX><SizeY>10</SizeY></Image></Information></Metadata></ImageDocument>";
    let m = parse_metadata_xml(xml).unwrap();
    assert_eq!(m.dimensions.size_x, None);
    assert_eq!(m.dimensions.size_y, Some(10));
}

#[test]
fn test_malformed_xml_is_format_error() {
    let extractor = CziExtractor::default();

    let mismatched = container_with_xml("<ImageDocument><Metadata></Image></ImageDocument>");
    let err = extractor.decode_container(&mismatched, "bad.czi").unwrap_err();
    assert!(err.is_format_error());

    let unclosed = container_with_xml("<ImageDocument><Metadata>");
    let err = extractor.decode_container(&unclosed, "bad.czi").unwrap_err();
    assert!(err.is_format_error());
    assert!(err.to_string().contains("ImageDocument") || err.to_string().contains("Metadata"));

    let mut invalid_utf8 = file_header();
    push_segment(&mut invalid_utf8, "ZISRAWMETADATA", &[b'<', 0xff, 0xfe, b'>']);
    let err = extractor.decode_container(&invalid_utf8, "bad.czi").unwrap_err();
    assert!(err.is_format_error());
}

#[test]
fn test_metadata_segment_with_preamble() {
    let xml = "<ImageDocument><Metadata><Information><Image><SizeX>512</SizeX>\
               </Image></Information></Metadata></ImageDocument>";
    let mut body = vec![0u8; METADATA_XML_OFFSET];
    body[..4].copy_from_slice(&(xml.len() as u32).to_le_bytes());
    body.extend_from_slice(xml.as_bytes());
    body.extend_from_slice(&[0u8; 32]);

    let mut data = file_header();
    push_segment(&mut data, "ZISRAWMETADATA", &body);

    let metadata = CziExtractor::default()
        .decode_container(&data, "preamble.czi")
        .unwrap();
    assert_eq!(metadata.get("image_size_x"), Some(&json!(512)));
}

fn preamble_body(xml: &str) -> Vec<u8> {
    let mut body = vec![0u8; METADATA_XML_OFFSET];
    body[..4].copy_from_slice(&(xml.len() as u32).to_le_bytes());
    body.extend_from_slice(xml.as_bytes());
    body
}

fn padded(xml: &str, size: usize) -> String {
    assert!(size >= xml.len(), "document is {} bytes", xml.len());
    format!("{}{}", xml, " ".repeat(size - xml.len()))
}

fn preamble_container(xml: &str) -> Vec<u8> {
    let body = preamble_body(xml);
    let mut data = file_header();
    push_segment(&mut data, "ZISRAWMETADATA", &body);
    data
}

#[test]
fn test_preamble_size_starting_with_angle_bracket() {
    // size 60 is 3C 00 00 00
    let xml = padded("<ImageDocument><Metadata/></ImageDocument>", 60);
    let data = preamble_container(&xml);
    assert_eq!(data[FILE_HEADER_LEN + SEGMENT_HEADER_LEN], b'<');

    let metadata = CziExtractor::default()
        .decode_container(&data, "small.czi")
        .unwrap();
    assert!(metadata.get("image_size_x").is_none());
    assert!(!metadata.notes().is_empty());

    // size 316 is 3C 01 00 00
    let xml = padded(
        "<ImageDocument><Metadata><Information><Image><SizeX>64</SizeX>\
         </Image></Information></Metadata></ImageDocument>",
        316,
    );
    let data = preamble_container(&xml);
    assert_eq!(data[FILE_HEADER_LEN + SEGMENT_HEADER_LEN], b'<');

    let metadata = CziExtractor::default()
        .decode_container(&data, "larger.czi")
        .unwrap();
    assert_eq!(metadata.get("image_size_x"), Some(&json!(64)));
}

#[test]
fn test_preamble_size_with_leading_whitespace_byte() {
    // size 0x3C20 is 20 3C 00 00
    let xml = padded(
        "<ImageDocument><Metadata><Information><Image><SizeY>32</SizeY>\
         </Image></Information></Metadata></ImageDocument>",
        0x3C20,
    );
    let data = preamble_container(&xml);

    let metadata = CziExtractor::default()
        .decode_container(&data, "space.czi")
        .unwrap();
    assert_eq!(metadata.get("image_size_y"), Some(&json!(32)));
}

#[test]
fn test_bare_xml_body_with_declaration() {
    let xml = "<?xml version=\"1.0\"?><ImageDocument><Metadata><Information><Image>\
               <SizeZ>7</SizeZ></Image></Information></Metadata></ImageDocument>";
    let mut data = file_header();
    push_segment(&mut data, "ZISRAWMETADATA", xml.as_bytes());

    let metadata = CziExtractor::default()
        .decode_container(&data, "decl.czi")
        .unwrap();
    assert_eq!(metadata.get("image_size_z"), Some(&json!(7)));
}

#[test]
fn test_preamble_size_past_payload_is_format_error() {
    let mut body = vec![0u8; METADATA_XML_OFFSET];
    body[..4].copy_from_slice(&10_000u32.to_le_bytes());
    body.extend_from_slice(b"<ImageDocument/>");

    let mut data = file_header();
    push_segment(&mut data, "ZISRAWMETADATA", &body);

    let err = CziExtractor::default()
        .decode_container(&data, "oversized.czi")
        .unwrap_err();
    assert!(err.is_format_error());
}

#[test]
fn test_truncated_segment_stops_scan_with_note() {
    let mut data = container_with_xml(SAMPLE_XML);
    let mut raw_id = [0u8; 16];
    raw_id[..14].copy_from_slice(b"ZISRAWSUBBLOCK");
    data.extend_from_slice(&raw_id);
    data.extend_from_slice(&1_000_000u64.to_le_bytes());
    data.extend_from_slice(&1_000_000u64.to_le_bytes());
    data.extend_from_slice(&[0u8; 10]);

    let metadata = CziExtractor::default()
        .decode_container(&data, "cut.czi")
        .unwrap();

    assert_eq!(metadata.get("segment_count"), Some(&json!(4)));
    assert!(metadata.microscopy().is_some());
    assert!(metadata
        .notes()
        .iter()
        .any(|n| n.contains("segment scan stopped")));
}

#[test]
fn test_overflowing_size_stops_scan() {
    let mut data = file_header();
    let mut raw_id = [0u8; 16];
    raw_id[..7].copy_from_slice(b"DELETED");
    data.extend_from_slice(&raw_id);
    data.extend_from_slice(&u64::MAX.to_le_bytes());
    data.extend_from_slice(&0u64.to_le_bytes());

    let mut scanner = SegmentScanner::new(&data);
    assert!(scanner.next().is_none());
    assert!(matches!(
        scanner.stop(),
        Some(ScanStop::SizeOverflow { .. }) | Some(ScanStop::DataOutOfBounds { .. })
    ));
}

#[test]
fn test_partial_header_stops_scan() {
    let mut data = file_header();
    data.extend_from_slice(b"ZISRAW");

    let mut scanner = SegmentScanner::new(&data);
    assert!(scanner.next().is_none());
    assert_eq!(scanner.stop(), Some(&ScanStop::TruncatedHeader { offset: 16 }));
}

#[test]
fn test_payload_uses_used_size() {
    let mut data = file_header();
    let mut raw_id = [0u8; 16];
    raw_id[..14].copy_from_slice(b"ZISRAWMETADATA");
    data.extend_from_slice(&raw_id);
    data.extend_from_slice(&8u64.to_le_bytes());
    data.extend_from_slice(&3u64.to_le_bytes());
    data.extend_from_slice(b"<a/>\0\0\0\0");

    let segment = SegmentScanner::new(&data).next().unwrap();
    assert_eq!(segment.header.kind(), SegmentKind::Metadata);
    assert_eq!(segment.payload(), b"<a/");
}

#[test]
fn test_size_limit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.czi");
    std::fs::write(&path, container_with_xml(SAMPLE_XML)).unwrap();

    let err = CziExtractor::new(Some(64)).extract(&path).unwrap_err();
    assert!(matches!(err, ExtractError::ResourceLimit { limit: 64, .. }));

    let ok = CziExtractor::new(Some(1 << 20)).extract(&path).unwrap();
    assert_eq!(ok.get_str("file_name"), Some("big.czi"));

    let mut reader = std::io::Cursor::new(container_with_xml(SAMPLE_XML));
    let err = CziExtractor::new(Some(64))
        .extract_from_reader(&mut reader, "big.czi")
        .unwrap_err();
    assert!(matches!(err, ExtractError::ResourceLimit { .. }));
}
