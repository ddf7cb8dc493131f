//! Process-level configuration document.
//!
//! Layered the way the teacher's "V5 configuration system" is: figment
//! merges compiled-in defaults, an optional TOML file, and `CAMERA_DAQ_`
//! prefixed environment variables, in that precedence order.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Implements `Serialize`/`Deserialize` for a `trigger_*` enum as its
/// `to_wire()`/`from_wire()` `u8` code rather than serde's default
/// variant-name string, so JSON config documents carry the same
/// small-integer codes spec §3's table defines.
macro_rules! impl_wire_repr {
    ($ty:ident) => {
        impl Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_u8(self.to_wire())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let code = u8::deserialize(deserializer)?;
                $ty::from_wire(code).ok_or_else(|| {
                    serde::de::Error::custom(format!(
                        concat!("invalid ", stringify!($ty), " wire code {}"),
                        code
                    ))
                })
            }
        }
    };
}

/// Trigger source selector (spec §3 `trigger_source`).
///
/// Serialised as its wire-integer code rather than the variant name:
/// spec §3 types every `trigger_*` field as a small integer enum on the
/// wire, and `camera-controller::diff` reads/writes these fields as
/// `u64` codes when applying a control-plane diff, so `request_configuration`
/// must emit the same representation for the S6 round-trip
/// (`request_configuration` then `configure` with the returned document)
/// to be a true no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TriggerSource {
    Internal = 1,
    External = 2,
    Software = 3,
    MasterPulse = 4,
}

impl TriggerSource {
    /// Decode the wire-integer representation (spec §3 table), used when
    /// applying a control-plane configuration diff.
    pub fn from_wire(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Internal),
            2 => Some(Self::External),
            3 => Some(Self::Software),
            4 => Some(Self::MasterPulse),
            _ => None,
        }
    }

    pub fn to_wire(self) -> u8 {
        self as u8
    }
}

impl_wire_repr!(TriggerSource);

/// Trigger activation edge/level (spec §3 `trigger_active`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TriggerActive {
    Edge = 1,
    Level = 2,
    Pulse = 3,
}

impl TriggerActive {
    pub fn from_wire(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Edge),
            2 => Some(Self::Level),
            3 => Some(Self::Pulse),
            _ => None,
        }
    }

    pub fn to_wire(self) -> u8 {
        self as u8
    }
}

impl_wire_repr!(TriggerActive);

/// Trigger mode (spec §3 `trigger_mode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TriggerMode {
    Normal = 1,
    Piv = 2,
    Start = 3,
}

impl TriggerMode {
    pub fn from_wire(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Normal),
            2 => Some(Self::Piv),
            3 => Some(Self::Start),
            _ => None,
        }
    }

    pub fn to_wire(self) -> u8 {
        self as u8
    }
}

impl_wire_repr!(TriggerMode);

/// Trigger polarity (spec §3 `trigger_polarity`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TriggerPolarity {
    Low = 1,
    High = 2,
}

impl TriggerPolarity {
    pub fn from_wire(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Low),
            2 => Some(Self::High),
            _ => None,
        }
    }

    pub fn to_wire(self) -> u8 {
        self as u8
    }
}

impl_wire_repr!(TriggerPolarity);

/// Trigger connector (spec §3 `trigger_connector`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TriggerConnector {
    Bnc = 1,
    Interface = 2,
    Multi = 3,
}

impl TriggerConnector {
    pub fn from_wire(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Bnc),
            2 => Some(Self::Interface),
            3 => Some(Self::Multi),
            _ => None,
        }
    }

    pub fn to_wire(self) -> u8 {
        self as u8
    }
}

impl_wire_repr!(TriggerConnector);

/// Camera configuration record — one field per recognised key in spec §3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub camera_number: u32,
    pub image_timeout: f64,
    pub num_frames: u32,
    pub exposure_time: f64,
    pub frame_rate: f64,
    pub trigger_source: Option<TriggerSource>,
    pub trigger_active: Option<TriggerActive>,
    pub trigger_mode: Option<TriggerMode>,
    pub trigger_polarity: Option<TriggerPolarity>,
    pub trigger_connector: Option<TriggerConnector>,
    pub simulated_camera: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            camera_number: 0,
            image_timeout: 1.0,
            num_frames: 0,
            exposure_time: 1.0 / 120.0,
            frame_rate: 120.0,
            trigger_source: None,
            trigger_active: None,
            trigger_mode: None,
            trigger_polarity: None,
            trigger_connector: None,
            simulated_camera: true,
        }
    }
}

/// Control-plane endpoint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Bind address, e.g. `tcp://0.0.0.0:9001` (spec §6 default).
    pub endpoint: String,
    /// Poll timeout in milliseconds between accept/read cycles.
    pub poll_interval_ms: u64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            endpoint: "tcp://0.0.0.0:9001".to_string(),
            poll_interval_ms: 100,
        }
    }
}

/// Capture-core local configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Number of pre-allocated buffers seeded into the CLEAR ring.
    pub pool_size: usize,
    /// Number of downstream worker rings frames are dispatched across.
    pub num_downstream_cores: usize,
    /// Identifier this capture core's rings are namespaced under.
    pub socket_id: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            pool_size: 16,
            num_downstream_cores: 2,
            socket_id: 0,
        }
    }
}

/// Live-view core local configuration (spec §4.7, optional).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveviewConfig {
    /// Whether the live-view core is started at all.
    pub enabled: bool,
    /// Which of the capture core's downstream rings to consume.
    pub downstream_index: usize,
    /// Maximum encoded frames retained before the oldest is dropped.
    pub session_capacity: usize,
}

impl Default for LiveviewConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            downstream_index: 0,
            session_capacity: 4,
        }
    }
}

/// Top-level process configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub camera: CameraConfig,
    pub control: ControlConfig,
    pub capture: CaptureConfig,
    pub liveview: LiveviewConfig,
}

impl EngineConfig {
    /// Load defaults, overlay an optional TOML file, then environment
    /// variables prefixed `CAMERA_DAQ_` (double-underscore nested keys,
    /// e.g. `CAMERA_DAQ_CAMERA__EXPOSURE_TIME`).
    pub fn load(path: Option<&str>) -> EngineResult<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(EngineConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed("CAMERA_DAQ_").split("__"));

        figment
            .extract()
            .map_err(|e| EngineError::Configuration(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_load_without_a_file() {
        let cfg = EngineConfig::load(None).unwrap();
        assert_eq!(cfg.camera.camera_number, 0);
        assert_eq!(cfg.control.endpoint, "tcp://0.0.0.0:9001");
        assert_eq!(cfg.capture.pool_size, 16);
    }

    #[test]
    fn toml_file_overlays_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [camera]
            camera_number = 2
            image_timeout = 1.0
            num_frames = 5
            exposure_time = 0.01
            frame_rate = 100.0
            simulated_camera = true

            [control]
            endpoint = "tcp://0.0.0.0:9100"
            poll_interval_ms = 50

            [capture]
            pool_size = 16
            num_downstream_cores = 2
            socket_id = 1
            "#
        )
        .unwrap();

        let cfg = EngineConfig::load(Some(file.path().to_str().unwrap())).unwrap();
        assert_eq!(cfg.camera.camera_number, 2);
        assert_eq!(cfg.camera.num_frames, 5);
        assert_eq!(cfg.control.endpoint, "tcp://0.0.0.0:9100");
        assert_eq!(cfg.capture.socket_id, 1);
    }

    /// A set trigger field serialises as its spec §3 wire-integer code,
    /// not the variant name, so a JSON-encoded config document matches
    /// the control protocol's own encoding of the same fields.
    #[test]
    fn trigger_fields_serialise_as_wire_integer_codes() {
        let mut config = CameraConfig::default();
        config.trigger_source = Some(TriggerSource::External);
        config.trigger_connector = Some(TriggerConnector::Bnc);

        let encoded = serde_json::to_value(&config).unwrap();
        assert_eq!(encoded["trigger_source"], 2);
        assert_eq!(encoded["trigger_connector"], 1);

        let decoded: CameraConfig = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, config);
    }

    #[test]
    fn invalid_trigger_wire_code_fails_to_deserialise() {
        let err = serde_json::from_value::<TriggerSource>(serde_json::json!(9)).unwrap_err();
        assert!(err.to_string().contains("invalid"));
    }
}
