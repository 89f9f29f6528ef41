use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Environment metadata, from which a simulated environment is constructed.
///
/// This is stored as JSON text in the `env_args` attribute of a dataset and
/// shared read-only by all episodes run against that dataset.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct EnvMeta {
    /// Name of the environment, e.g. `Lift`.
    pub env_name: String,

    /// Version of the simulator the data was collected with.
    #[serde(default)]
    pub env_version: Option<String>,

    /// Type of the environment backend.
    #[serde(rename = "type")]
    pub env_type: i64,

    /// Keyword arguments passed to the constructor of the environment,
    /// including `controller_configs`.
    #[serde(default)]
    pub env_kwargs: Map<String, Value>,
}

impl EnvMeta {
    /// Parses the metadata from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the metadata into indented JSON text.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Returns the constructor keyword argument of the given name.
    pub fn kwarg(&self, name: &str) -> Option<&Value> {
        self.env_kwargs.get(name)
    }

    /// Overrides a constructor keyword argument.
    pub fn with_kwarg(mut self, name: impl Into<String>, value: Value) -> Self {
        self.env_kwargs.insert(name.into(), value);
        self
    }

    /// Type of the controller, e.g. `OSC_POSE`.
    pub fn controller_type(&self) -> Option<&str> {
        self.kwarg("controller_configs")?.get("type")?.as_str()
    }

    /// Names of the robots in the scene.
    pub fn robots(&self) -> Vec<String> {
        match self.kwarg("robots") {
            Some(Value::Array(vs)) => vs
                .iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect(),
            Some(Value::String(s)) => vec![s.clone()],
            _ => vec![],
        }
    }

    /// Control frequency in Hz.
    pub fn control_freq(&self) -> Option<f64> {
        self.kwarg("control_freq")?.as_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIFT: &str = r#"{
        "env_name": "Lift",
        "env_version": "1.4.1",
        "type": 1,
        "env_kwargs": {
            "has_renderer": false,
            "has_offscreen_renderer": false,
            "ignore_done": true,
            "use_object_obs": true,
            "use_camera_obs": false,
            "control_freq": 20,
            "controller_configs": {
                "type": "OSC_POSE",
                "input_max": 1,
                "input_min": -1,
                "output_max": [0.05, 0.05, 0.05, 0.5, 0.5, 0.5],
                "output_min": [-0.05, -0.05, -0.05, -0.5, -0.5, -0.5],
                "kp": 150,
                "damping": 1,
                "impedance_mode": "fixed",
                "kp_limits": [0, 300],
                "damping_limits": [0, 10],
                "position_limits": null,
                "orientation_limits": null,
                "uncouple_pos_ori": true,
                "control_delta": true,
                "interpolation": null,
                "ramp_ratio": 0.2
            },
            "robots": ["Panda"],
            "camera_depths": false,
            "camera_heights": 84,
            "camera_widths": 84,
            "reward_shaping": false
        }
    }"#;

    #[test]
    fn test_parse_lift() -> Result<()> {
        let meta = EnvMeta::from_json(LIFT)?;
        assert_eq!(meta.env_name, "Lift");
        assert_eq!(meta.env_version.as_deref(), Some("1.4.1"));
        assert_eq!(meta.env_type, 1);
        assert_eq!(meta.controller_type(), Some("OSC_POSE"));
        assert_eq!(meta.robots(), vec!["Panda"]);
        assert_eq!(meta.control_freq(), Some(20.0));

        let meta = meta.with_kwarg("has_offscreen_renderer", Value::Bool(true));
        let meta2 = EnvMeta::from_json(&meta.to_json_pretty()?)?;
        assert_eq!(meta2.kwarg("has_offscreen_renderer"), Some(&Value::Bool(true)));
        Ok(())
    }

    #[test]
    fn test_missing_name_is_error() {
        assert!(EnvMeta::from_json(r#"{"type": 1}"#).is_err());
    }
}
