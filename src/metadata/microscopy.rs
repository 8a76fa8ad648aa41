use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::FieldMap;

/// Instrument and acquisition metadata from a microscopy container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MicroscopyMetadata {
    /// Microscope model name
    pub microscope_model: Option<String>,

    /// First objective listed in the instrument section
    pub objective: Option<ObjectiveInfo>,

    /// Image dimensions and pixel depth
    pub dimensions: ImageDimensions,

    /// Acquisition channels in document order
    pub channels: Vec<ChannelInfo>,

    /// Physical pixel sizes
    pub scaling: PhysicalScaling,

    /// Acquisition timestamp, RFC 3339 when it parsed, raw text otherwise
    pub acquisition_date: Option<String>,

    /// Operator / user name
    pub operator: Option<String>,

    /// Authoring application
    pub application: Option<ApplicationInfo>,
}

/// Objective lens description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveInfo {
    /// Objective name as written by the acquisition software
    pub name: Option<String>,
    /// Nominal magnification
    pub magnification: Option<f64>,
    /// Numerical aperture
    pub numerical_aperture: Option<f64>,
    /// Immersion medium (e.g., "Oil", "Water", "Air")
    pub immersion: Option<String>,
}

/// Image dimensions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageDimensions {
    /// Width in pixels
    pub size_x: Option<u64>,
    /// Height in pixels
    pub size_y: Option<u64>,
    /// Number of focal planes
    pub size_z: Option<u64>,
    /// Number of channels
    pub size_c: Option<u64>,
    /// Number of time points
    pub size_t: Option<u64>,
    /// Bits per pixel component
    pub bit_depth: Option<u32>,
    /// Pixel type label (e.g., "Gray16")
    pub pixel_type: Option<String>,
}

/// A single acquisition channel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// Channel identifier
    pub id: Option<String>,
    /// Channel display name
    pub name: Option<String>,
    /// Excitation wavelength in nanometers
    pub excitation_wavelength_nm: Option<f64>,
    /// Emission wavelength in nanometers
    pub emission_wavelength_nm: Option<f64>,
    /// Dye / fluorophore name
    pub dye: Option<String>,
}

/// Physical pixel sizes in micrometers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicalScaling {
    /// X pixel size (µm)
    pub x_um: Option<f64>,
    /// Y pixel size (µm)
    pub y_um: Option<f64>,
    /// Z step size (µm)
    pub z_um: Option<f64>,
}

/// Software that wrote the file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationInfo {
    /// Application name
    pub name: Option<String>,
    /// Application version
    pub version: Option<String>,
}

impl MicroscopyMetadata {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// True when nothing was populated
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Number of channels, preferring the channel list over the declared size
    pub fn channel_count(&self) -> Option<u64> {
        if self.channels.is_empty() {
            self.dimensions.size_c
        } else {
            Some(self.channels.len() as u64)
        }
    }

    /// Flatten into the field names used by schemas and tag projection
    pub fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        let mut put = |key: &str, value: Option<Value>| {
            if let Some(value) = value {
                fields.insert(key.to_string(), value);
            }
        };

        put("instrument_model", self.microscope_model.clone().map(Value::from));

        if let Some(objective) = &self.objective {
            put("objective_name", objective.name.clone().map(Value::from));
            put("objective_magnification", objective.magnification.map(Value::from));
            put("objective_na", objective.numerical_aperture.map(Value::from));
            put("objective_immersion", objective.immersion.clone().map(Value::from));
        }

        let dims = &self.dimensions;
        put("image_size_x", dims.size_x.map(Value::from));
        put("image_size_y", dims.size_y.map(Value::from));
        put("image_size_z", dims.size_z.map(Value::from));
        put("image_size_t", dims.size_t.map(Value::from));
        put("bit_depth", dims.bit_depth.map(Value::from));
        put("pixel_type", dims.pixel_type.clone().map(Value::from));
        put("channel_count", self.channel_count().map(Value::from));

        if !self.channels.is_empty() {
            let channels = self.channels.iter().map(ChannelInfo::to_value).collect();
            put("channels", Some(Value::Array(channels)));
        }

        put("physical_size_x_um", self.scaling.x_um.map(Value::from));
        put("physical_size_y_um", self.scaling.y_um.map(Value::from));
        put("physical_size_z_um", self.scaling.z_um.map(Value::from));

        put("acquisition_date", self.acquisition_date.clone().map(Value::from));
        put("operator", self.operator.clone().map(Value::from));

        if let Some(app) = &self.application {
            put("software_name", app.name.clone().map(Value::from));
            put("software_version", app.version.clone().map(Value::from));
        }

        fields
    }
}

impl ChannelInfo {
    fn to_value(&self) -> Value {
        let mut map = Map::new();
        if let Some(id) = &self.id {
            map.insert("id".into(), Value::from(id.clone()));
        }
        if let Some(name) = &self.name {
            map.insert("name".into(), Value::from(name.clone()));
        }
        if let Some(ex) = self.excitation_wavelength_nm {
            map.insert("excitation_wavelength_nm".into(), Value::from(ex));
        }
        if let Some(em) = self.emission_wavelength_nm {
            map.insert("emission_wavelength_nm".into(), Value::from(em));
        }
        if let Some(dye) = &self.dye {
            map.insert("dye".into(), Value::from(dye.clone()));
        }
        Value::Object(map)
    }
}
