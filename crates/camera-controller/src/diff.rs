//! Per-field configuration diff application (spec §4.4
//! `update_configuration`), grounded on `OrcaQuestCameraController.cpp`'s
//! actual field-by-field commit behaviour: push each changed
//! camera-owned field to the camera in declaration order, committing it
//! into the live config immediately (commit-as-you-go), and stop without
//! committing the remainder on the first rejection. This resolves
//! spec.md §9's open question in favour of "commit-as-you-go, stop on
//! first failure".

use serde_json::{Map, Value};

use camera_iface::CameraInterface;
use daq_core::config::{
    CameraConfig, TriggerActive, TriggerConnector, TriggerMode, TriggerPolarity, TriggerSource,
};
use daq_core::error::{EngineError, EngineResult};

/// Configuration fields the camera can be asked to honour, in the exact
/// declaration order spec.md §4.4 requires diffs to be pushed in.
pub const CAMERA_OWNED_FIELDS: [&str; 8] = [
    "camera_number",
    "exposure_time",
    "frame_rate",
    "trigger_source",
    "trigger_active",
    "trigger_mode",
    "trigger_polarity",
    "trigger_connector",
];

/// Recognised fields the controller tracks but never pushes to the
/// camera (spec §3's `image_timeout`, `num_frames`, `simulated_camera`).
const LOCAL_ONLY_FIELDS: [&str; 3] = ["image_timeout", "num_frames", "simulated_camera"];

fn numeric_field_error(field: &str) -> EngineError {
    EngineError::Configuration(format!("{field} must be a number"))
}

/// Apply every camera-owned field present in `diff` to `camera`, in
/// declaration order, committing each into `config` as it succeeds.
/// Returns on the first `set_property` rejection without touching the
/// remaining fields.
pub fn apply_camera_owned_fields(
    camera: &mut dyn CameraInterface,
    config: &mut CameraConfig,
    diff: &Map<String, Value>,
) -> EngineResult<()> {
    for field in CAMERA_OWNED_FIELDS {
        let Some(value) = diff.get(field) else {
            continue;
        };
        if field_unchanged(config, field, value) {
            continue;
        }
        apply_one_field(camera, config, field, value)?;
    }
    Ok(())
}

/// Spec §4.4: `update_configuration` computes a per-field diff against
/// the current config and only pushes *changed* fields. This is what
/// makes `request_configuration` followed by `configure` with the
/// returned document a no-op (spec §8 scenario S6): every field is
/// present in the round-tripped document, but none of them differ from
/// the value already on record.
fn field_unchanged(config: &CameraConfig, field: &str, value: &Value) -> bool {
    match field {
        "camera_number" => value.as_u64() == Some(config.camera_number as u64),
        "exposure_time" => value
            .as_f64()
            .is_some_and(|v| (v - config.exposure_time).abs() < f64::EPSILON),
        "frame_rate" => value
            .as_f64()
            .is_some_and(|v| (v - config.frame_rate).abs() < f64::EPSILON),
        "trigger_source" => match value.as_u64() {
            None => config.trigger_source.is_none(), // null == unset
            Some(code) => config.trigger_source.map(|v| v.to_wire() as u64) == Some(code),
        },
        "trigger_active" => match value.as_u64() {
            None => config.trigger_active.is_none(),
            Some(code) => config.trigger_active.map(|v| v.to_wire() as u64) == Some(code),
        },
        "trigger_mode" => match value.as_u64() {
            None => config.trigger_mode.is_none(),
            Some(code) => config.trigger_mode.map(|v| v.to_wire() as u64) == Some(code),
        },
        "trigger_polarity" => match value.as_u64() {
            None => config.trigger_polarity.is_none(),
            Some(code) => config.trigger_polarity.map(|v| v.to_wire() as u64) == Some(code),
        },
        "trigger_connector" => match value.as_u64() {
            None => config.trigger_connector.is_none(),
            Some(code) => config.trigger_connector.map(|v| v.to_wire() as u64) == Some(code),
        },
        _ => false,
    }
}

/// Commit the recognised local-only fields directly (no camera push).
pub fn apply_local_fields(config: &mut CameraConfig, diff: &Map<String, Value>) -> EngineResult<()> {
    for field in LOCAL_ONLY_FIELDS {
        let Some(value) = diff.get(field) else {
            continue;
        };
        match field {
            "image_timeout" => {
                config.image_timeout = value.as_f64().ok_or_else(|| numeric_field_error(field))?;
            }
            "num_frames" => {
                config.num_frames = value
                    .as_u64()
                    .ok_or_else(|| numeric_field_error(field))? as u32;
            }
            "simulated_camera" => {
                config.simulated_camera = value
                    .as_bool()
                    .ok_or_else(|| EngineError::Configuration(format!("{field} must be a boolean")))?;
            }
            _ => unreachable!("LOCAL_ONLY_FIELDS is exhaustively matched above"),
        }
    }
    Ok(())
}

/// Parse a camera-owned field's raw config value into its numeric wire
/// representation, without touching either the camera or `config`.
fn wire_value_from(field: &str, value: &Value) -> EngineResult<f64> {
    match field {
        "camera_number" => Ok(value.as_u64().ok_or_else(|| numeric_field_error(field))? as f64),
        "exposure_time" | "frame_rate" => {
            Ok(value.as_f64().ok_or_else(|| numeric_field_error(field))?)
        }
        "trigger_source" | "trigger_active" | "trigger_mode" | "trigger_polarity"
        | "trigger_connector" => Ok(value.as_u64().ok_or_else(|| numeric_field_error(field))? as f64),
        _ => Ok(0.0),
    }
}

fn apply_one_field(
    camera: &mut dyn CameraInterface,
    config: &mut CameraConfig,
    field: &str,
    value: &Value,
) -> EngineResult<()> {
    let wire_value = wire_value_from(field, value)?;

    if !camera.set_property(field, wire_value) {
        return Err(EngineError::CameraPropertyRejected {
            name: field.to_string(),
        });
    }

    commit_field(config, field, wire_value)
}

/// Commit a camera-owned field's already-parsed wire value directly into
/// `config`, without a camera call. Used both by [`apply_one_field`]
/// (after the camera has accepted the value) and by
/// [`apply_camera_owned_fields_locally`] (no camera attached yet, so
/// there is nothing to push to).
fn commit_field(config: &mut CameraConfig, field: &str, wire_value: f64) -> EngineResult<()> {
    let code = wire_value as u8;
    match field {
        "camera_number" => config.camera_number = wire_value as u32,
        "exposure_time" => config.exposure_time = wire_value,
        "frame_rate" => config.frame_rate = wire_value,
        "trigger_source" => {
            config.trigger_source = Some(
                TriggerSource::from_wire(code)
                    .ok_or_else(|| EngineError::Configuration(format!("invalid trigger_source {code}")))?,
            )
        }
        "trigger_active" => {
            config.trigger_active = Some(
                TriggerActive::from_wire(code)
                    .ok_or_else(|| EngineError::Configuration(format!("invalid trigger_active {code}")))?,
            )
        }
        "trigger_mode" => {
            config.trigger_mode = Some(
                TriggerMode::from_wire(code)
                    .ok_or_else(|| EngineError::Configuration(format!("invalid trigger_mode {code}")))?,
            )
        }
        "trigger_polarity" => {
            config.trigger_polarity = Some(TriggerPolarity::from_wire(code).ok_or_else(|| {
                EngineError::Configuration(format!("invalid trigger_polarity {code}"))
            })?)
        }
        "trigger_connector" => {
            config.trigger_connector = Some(TriggerConnector::from_wire(code).ok_or_else(|| {
                EngineError::Configuration(format!("invalid trigger_connector {code}"))
            })?)
        }
        _ => {}
    }

    Ok(())
}

/// Commit every changed camera-owned field present in `diff` directly
/// into `config`, in declaration order, without a camera to push to.
/// Spec §6: a combined `{camera, command}` message applies `camera`
/// first, so a diff arriving alongside a `connect` command must be able
/// to commit before the camera exists; `apply_configuration` pushes the
/// whole committed config to the camera once `connect`'s hook runs.
pub fn apply_camera_owned_fields_locally(
    config: &mut CameraConfig,
    diff: &Map<String, Value>,
) -> EngineResult<()> {
    for field in CAMERA_OWNED_FIELDS {
        let Some(value) = diff.get(field) else {
            continue;
        };
        if field_unchanged(config, field, value) {
            continue;
        }
        let wire_value = wire_value_from(field, value)?;
        commit_field(config, field, wire_value)?;
    }
    Ok(())
}

/// Numeric wire value for a camera-owned field in its current config
/// state, or `None` when the field is an unset trigger option (nothing
/// to push yet). Used by [`crate::CameraController::apply_configuration`]
/// to push the whole configuration on connect.
pub fn wire_value_of(config: &CameraConfig, field: &str) -> Option<f64> {
    match field {
        "camera_number" => Some(config.camera_number as f64),
        "exposure_time" => Some(config.exposure_time),
        "frame_rate" => Some(config.frame_rate),
        "trigger_source" => config.trigger_source.map(|v| v.to_wire() as f64),
        "trigger_active" => config.trigger_active.map(|v| v.to_wire() as f64),
        "trigger_mode" => config.trigger_mode.map(|v| v.to_wire() as f64),
        "trigger_polarity" => config.trigger_polarity.map(|v| v.to_wire() as f64),
        "trigger_connector" => config.trigger_connector.map(|v| v.to_wire() as f64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct RecordingCamera {
        calls: Vec<(String, f64)>,
        reject: Option<&'static str>,
    }

    impl camera_iface::CameraInterface for RecordingCamera {
        fn api_init(&mut self) -> daq_core::error::EngineResult<()> {
            Ok(())
        }
        fn connect(&mut self, _index: u32) -> daq_core::error::EngineResult<()> {
            Ok(())
        }
        fn disconnect(&mut self) -> daq_core::error::EngineResult<()> {
            Ok(())
        }
        fn attach_buffer(&mut self, _n_frames: u32) -> daq_core::error::EngineResult<()> {
            Ok(())
        }
        fn prepare_capture(&mut self, _timeout_ms: u32) -> daq_core::error::EngineResult<()> {
            Ok(())
        }
        fn capture_frame(&mut self) -> daq_core::error::EngineResult<Option<&[u8]>> {
            Ok(None)
        }
        fn abort_capture(&mut self) -> daq_core::error::EngineResult<()> {
            Ok(())
        }
        fn disarm(&mut self) -> daq_core::error::EngineResult<()> {
            Ok(())
        }
        fn remove_buffer(&mut self) -> daq_core::error::EngineResult<()> {
            Ok(())
        }
        fn close(&mut self) -> daq_core::error::EngineResult<()> {
            Ok(())
        }
        fn set_property(&mut self, name: &str, value: f64) -> bool {
            if self.reject == Some(name) {
                return false;
            }
            self.calls.push((name.to_string(), value));
            true
        }
        fn get_property(&self, _name: &str) -> Option<f64> {
            None
        }
        fn get_device_count(&self) -> u32 {
            1
        }
    }

    #[test]
    fn pushes_changed_fields_in_declaration_order() {
        let mut camera = RecordingCamera {
            calls: vec![],
            reject: None,
        };
        let mut config = CameraConfig::default();
        let diff = json!({"frame_rate": 100.0, "exposure_time": 0.02, "trigger_source": 2});
        let diff = diff.as_object().unwrap();

        apply_camera_owned_fields(&mut camera, &mut config, diff).unwrap();

        assert_eq!(
            camera.calls,
            vec![
                ("exposure_time".to_string(), 0.02),
                ("frame_rate".to_string(), 100.0),
                ("trigger_source".to_string(), 2.0),
            ]
        );
        assert_eq!(config.exposure_time, 0.02);
        assert_eq!(config.frame_rate, 100.0);
        assert_eq!(config.trigger_source, Some(TriggerSource::External));
    }

    #[test]
    fn stops_on_first_rejection_leaving_earlier_commits_in_place() {
        let mut camera = RecordingCamera {
            calls: vec![],
            reject: Some("trigger_source"),
        };
        let mut config = CameraConfig::default();
        let diff = json!({"exposure_time": 0.02, "trigger_source": 2});
        let diff = diff.as_object().unwrap();

        let err = apply_camera_owned_fields(&mut camera, &mut config, diff).unwrap_err();
        assert!(matches!(err, EngineError::CameraPropertyRejected { .. }));
        assert_eq!(config.exposure_time, 0.02);
        assert_eq!(config.trigger_source, None);
    }
}
