//! Mapping of the embedded `ImageDocument` XML onto [`MicroscopyMetadata`].
//!
//! The document is walked with a pull parser while keeping the stack of open
//! element names, so each value is recognised by its parent element. Only
//! structural XML problems are errors; unknown elements and unparseable
//! values are skipped.

use chrono::{DateTime, NaiveDateTime};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::CziError;
use crate::metadata::{ApplicationInfo, ChannelInfo, MicroscopyMetadata, ObjectiveInfo};

/// Scaling distances are stored in meters
const METERS_TO_MICROMETERS: f64 = 1e6;

/// Parse the metadata document of a container
pub fn parse_metadata_xml(xml: &str) -> Result<MicroscopyMetadata, CziError> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    reader.config_mut().trim_text(true);

    let mut mapper = XmlMapper::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = element_name(e)?;
                mapper.open(&name, e)?;
                mapper.stack.push(name);
            }
            Ok(Event::Empty(ref e)) => {
                let name = element_name(e)?;
                mapper.open(&name, e)?;
                mapper.close(&name);
            }
            Ok(Event::Text(ref t)) => {
                let text = t.unescape()?;
                let text = text.trim();
                if !text.is_empty() {
                    mapper.text(text);
                }
            }
            Ok(Event::End(_)) => {
                if let Some(name) = mapper.stack.pop() {
                    mapper.close(&name);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(CziError::XmlError(e)),
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = mapper.stack.pop() {
        return Err(CziError::UnclosedElement(open));
    }

    Ok(mapper.finish())
}

/// Local name of an element, namespace prefix dropped
fn element_name(e: &BytesStart) -> Result<String, CziError> {
    Ok(std::str::from_utf8(e.local_name().as_ref())?.to_string())
}

/// Helper function to get an attribute value from a BytesStart
fn get_attribute(e: &BytesStart, name: &str) -> Result<Option<String>, CziError> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == name.as_bytes() {
            let value = std::str::from_utf8(&attr.value)?.trim().to_string();
            return Ok((!value.is_empty()).then_some(value));
        }
    }
    Ok(None)
}

/// Strict RFC 3339 first, then a zone-less ISO-8601 timestamp, then the raw
/// text
fn normalize_timestamp(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.to_rfc3339();
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.and_utc().to_rfc3339();
    }
    raw.to_string()
}

fn set_once<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

#[derive(Default)]
struct XmlMapper {
    stack: Vec<String>,
    metadata: MicroscopyMetadata,
    channel: Option<ChannelInfo>,
    objective: Option<ObjectiveInfo>,
    objective_done: bool,
    distance_axis: Option<String>,
    application: ApplicationInfo,
    display_name: Option<String>,
    document_user: Option<String>,
    acquisition_time: Option<String>,
    creation_date: Option<String>,
}

impl XmlMapper {
    fn parent(&self) -> Option<&str> {
        self.stack.last().map(String::as_str)
    }

    fn grandparent(&self) -> Option<&str> {
        self.stack.iter().rev().nth(1).map(String::as_str)
    }

    /// Element opened; the stack does not yet include it
    fn open(&mut self, name: &str, e: &BytesStart) -> Result<(), CziError> {
        match (name, self.parent(), self.grandparent()) {
            ("Channel", Some("Channels"), Some("Dimensions")) => {
                self.channel = Some(ChannelInfo {
                    id: get_attribute(e, "Id")?,
                    name: get_attribute(e, "Name")?,
                    ..Default::default()
                });
            }
            ("Objective", Some("Objectives"), _) if !self.objective_done => {
                self.objective = Some(ObjectiveInfo {
                    name: get_attribute(e, "Name")?,
                    ..Default::default()
                });
            }
            ("Microscope", Some("Microscopes"), _) => {
                let model = get_attribute(e, "Name")?;
                set_once(&mut self.metadata.microscope_model, model);
            }
            ("Distance", Some("Items"), Some("Scaling")) => {
                self.distance_axis = get_attribute(e, "Id")?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Element closed; the stack no longer includes it
    fn close(&mut self, name: &str) {
        match name {
            "Channel" => {
                if let Some(channel) = self.channel.take() {
                    self.metadata.channels.push(channel);
                }
            }
            "Objective" => {
                if let Some(objective) = self.objective.take() {
                    self.metadata.objective = Some(objective);
                    self.objective_done = true;
                }
            }
            "Distance" => self.distance_axis = None,
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        let (element, parent) = match (self.parent(), self.grandparent()) {
            (Some(element), Some(parent)) => (element.to_string(), parent.to_string()),
            _ => return,
        };
        let owned = || Some(text.to_string());

        match (parent.as_str(), element.as_str()) {
            ("Channel", field) if self.channel.is_some() => {
                if let Some(channel) = self.channel.as_mut() {
                    match field {
                        "ExcitationWavelength" => channel.excitation_wavelength_nm = text.parse().ok(),
                        "EmissionWavelength" => channel.emission_wavelength_nm = text.parse().ok(),
                        "Fluor" | "DyeName" => set_once(&mut channel.dye, owned()),
                        "Name" => set_once(&mut channel.name, owned()),
                        _ => {}
                    }
                }
            }
            ("Objective", field) if self.objective.is_some() => {
                if let Some(objective) = self.objective.as_mut() {
                    match field {
                        "NominalMagnification" | "Magnification" => {
                            set_once(&mut objective.magnification, text.parse().ok())
                        }
                        "LensNA" => objective.numerical_aperture = text.parse().ok(),
                        "Immersion" => objective.immersion = owned(),
                        "Name" | "Model" => set_once(&mut objective.name, owned()),
                        _ => {}
                    }
                }
            }
            ("Image", field) => {
                let dims = &mut self.metadata.dimensions;
                match field {
                    "SizeX" => dims.size_x = text.parse().ok(),
                    "SizeY" => dims.size_y = text.parse().ok(),
                    "SizeZ" => dims.size_z = text.parse().ok(),
                    "SizeC" => dims.size_c = text.parse().ok(),
                    "SizeT" => dims.size_t = text.parse().ok(),
                    "ComponentBitCount" => dims.bit_depth = text.parse().ok(),
                    "PixelType" => dims.pixel_type = owned(),
                    "AcquisitionDateAndTime" => self.acquisition_time = owned(),
                    _ => {}
                }
            }
            ("Microscope", "System" | "Name") => {
                set_once(&mut self.metadata.microscope_model, owned());
            }
            ("Distance", "Value") => {
                let um = text.parse::<f64>().ok().map(|m| m * METERS_TO_MICROMETERS);
                let scaling = &mut self.metadata.scaling;
                match self.distance_axis.as_deref() {
                    Some("X") => scaling.x_um = um,
                    Some("Y") => scaling.y_um = um,
                    Some("Z") => scaling.z_um = um,
                    _ => {}
                }
            }
            ("Application", "Name") => self.application.name = owned(),
            ("Application", "Version") => self.application.version = owned(),
            ("User", "DisplayName") => set_once(&mut self.display_name, owned()),
            ("Document", "UserName") => self.document_user = owned(),
            ("Document", "CreationDate") => self.creation_date = owned(),
            _ => {}
        }
    }

    fn finish(mut self) -> MicroscopyMetadata {
        self.metadata.operator = self.display_name.or(self.document_user);
        self.metadata.acquisition_date = self
            .acquisition_time
            .or(self.creation_date)
            .map(|raw| normalize_timestamp(&raw));
        if self.application != ApplicationInfo::default() {
            self.metadata.application = Some(self.application);
        }
        self.metadata
    }
}

#[cfg(test)]
mod timestamp_tests {
    use super::normalize_timestamp;

    #[test]
    fn test_rfc3339() {
        assert_eq!(
            normalize_timestamp("2023-05-04T10:20:30Z"),
            "2023-05-04T10:20:30+00:00"
        );
    }

    #[test]
    fn test_zoneless() {
        assert_eq!(
            normalize_timestamp("2023-05-04T10:20:30.5"),
            "2023-05-04T10:20:30.500+00:00"
        );
    }

    #[test]
    fn test_raw_fallback() {
        assert_eq!(normalize_timestamp("04/05/2023 10:20"), "04/05/2023 10:20");
    }
}
