/// Run identity encoded in an Illumina read header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IlluminaHeader {
    /// Instrument identifier
    pub instrument_id: String,
    /// Run number on the instrument
    pub run_number: Option<u64>,
    /// Flowcell identifier
    pub flowcell_id: Option<String>,
    /// Flowcell lane
    pub lane: Option<u32>,
}

/// Parse a read header in either Illumina layout
///
/// - Casava 1.8+: `@instrument:run:flowcell:lane:tile:x:y [read:filtered:control:index]`
/// - Older:       `@instrument:lane:tile:x:y[#index/read]`
///
/// Returns `None` for headers in neither layout.
pub fn parse_illumina_header(header: &str) -> Option<IlluminaHeader> {
    let id = header.strip_prefix('@')?.split_whitespace().next()?;
    let id = id.split(['#', '/']).next().unwrap_or(id);
    let parts: Vec<&str> = id.split(':').collect();

    match parts.as_slice() {
        [instrument, run, flowcell, lane, _tile, _x, _y] if !instrument.is_empty() => {
            Some(IlluminaHeader {
                instrument_id: instrument.to_string(),
                run_number: run.parse().ok(),
                flowcell_id: (!flowcell.is_empty()).then(|| flowcell.to_string()),
                lane: lane.parse().ok(),
            })
        }
        [instrument, lane, _tile, _x, _y] if !instrument.is_empty() => Some(IlluminaHeader {
            instrument_id: instrument.to_string(),
            run_number: None,
            flowcell_id: None,
            lane: lane.parse().ok(),
        }),
        _ => None,
    }
}
