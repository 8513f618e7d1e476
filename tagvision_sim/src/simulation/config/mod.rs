// tagvision_sim/src/simulation/config/mod.rs

//! This module handles loading and validating scenario configuration from
//! disk, including the optional field layout document it points at.

pub mod structs;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::fs;
use std::path::Path;

use tagvision_core::mapping::FieldMap;

use crate::error::{Result, SimError};
pub use structs::{
    CameraConfig, FieldConfig, Pose, RobotConfig, ScenarioConfig, Simulation, TagConfig,
    VisionConfig,
};

/// Environment variables with this prefix override scenario keys, with `__`
/// separating nesting levels (`TAGVISION_VISION__MAX_AMBIGUITY=0.3`).
pub const ENV_PREFIX: &str = "TAGVISION_";

/// The provider stack for one scenario file: the TOML file, then environment overrides.
pub fn scenario_figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Loads, overrides and validates a scenario. A missing file is an error
/// rather than an all-defaults scenario.
pub fn load_scenario(path: &Path) -> Result<ScenarioConfig> {
    fs::metadata(path).map_err(|source| SimError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("Loading scenario from: {}", path.display());

    let config: ScenarioConfig = scenario_figment(path).extract()?;
    config.validate()?;
    Ok(config)
}

impl ScenarioConfig {
    /// Parses a scenario from TOML text without environment overrides.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ScenarioConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the runner cannot work with.
    pub fn validate(&self) -> Result<()> {
        let sim = &self.simulation;
        positive("simulation.duration_seconds", sim.duration_seconds)?;
        positive("simulation.control_rate_hz", sim.control_rate_hz)?;
        non_negative("simulation.time_scale", sim.time_scale)?;

        let cam = &self.camera;
        positive("camera.rate_hz", cam.rate_hz)?;
        non_negative("camera.latency_ms", cam.latency_ms)?;
        non_negative("camera.latency_jitter_ms", cam.latency_jitter_ms)?;
        positive("camera.max_range", cam.max_range)?;
        positive("camera.tag_size", cam.tag_size)?;
        non_negative("camera.translation_noise_per_meter", cam.translation_noise_per_meter)?;
        non_negative("camera.rotation_noise_deg", cam.rotation_noise_deg)?;
        non_negative("camera.ambiguity_base", cam.ambiguity_base)?;
        non_negative("camera.ambiguity_per_meter", cam.ambiguity_per_meter)?;
        non_negative("camera.ambiguity_noise", cam.ambiguity_noise)?;
        for (key, fov) in [
            ("camera.horizontal_fov_deg", cam.horizontal_fov_deg),
            ("camera.vertical_fov_deg", cam.vertical_fov_deg),
        ] {
            if !(fov > 0.0 && fov < 180.0) {
                return Err(SimError::invalid(format!(
                    "{key} must be within (0, 180), got {fov}"
                )));
            }
        }
        cam.mount.to_transform().validate()?;

        non_negative("vision.max_frame_age_s", self.vision.max_frame_age_s)?;
        if self.vision.max_ambiguity.is_nan() {
            return Err(SimError::invalid("vision.max_ambiguity is NaN"));
        }

        if self.field.layout_file.is_none() && self.field.tags.is_empty() {
            return Err(SimError::invalid(
                "field has no tags; add [[field.tags]] or field.layout_file",
            ));
        }
        for tag in &self.field.tags {
            tag.to_pose()
                .validate()
                .map_err(|e| SimError::invalid(format!("field tag {}: {e}", tag.id)))?;
        }

        self.robot
            .trajectory
            .validate()
            .map_err(SimError::Invalid)?;
        Ok(())
    }
}

impl FieldConfig {
    /// Builds the tag map. `base_dir` anchors a relative `layout_file`.
    pub fn build_field_map(&self, base_dir: &Path) -> Result<FieldMap> {
        let mut field = match &self.layout_file {
            Some(file) => {
                let path = base_dir.join(file);
                let json = fs::read_to_string(&path).map_err(|source| SimError::Io {
                    path: path.clone(),
                    source,
                })?;
                FieldMap::from_layout_json(&json)?
            }
            None => FieldMap::new(),
        };

        for tag in &self.tags {
            if field.add_tag(tag.id, tag.to_pose()).is_some() {
                tracing::debug!(tag_id = tag.id, "scenario tag overrides layout entry");
            }
        }

        if field.is_empty() {
            return Err(SimError::invalid("field has no tags"));
        }
        tracing::info!("Field map ready with {} tags: {:?}", field.len(), field.ids());
        Ok(field)
    }
}

fn positive(key: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::invalid(format!("{key} must be > 0, got {value}")))
    }
}

fn non_negative(key: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::invalid(format!("{key} must be >= 0, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [[field.tags]]
        id = 1
        translation = [5.0, 0.0, 0.5]
        rotation = [0.0, 0.0, 180.0]
    "#;

    #[test]
    fn minimal_scenario_uses_defaults() {
        let config = ScenarioConfig::from_toml_str(MINIMAL).expect("valid scenario");
        assert_eq!(config.simulation.control_rate_hz, 50.0);
        assert_eq!(config.camera.rate_hz, 30.0);
        assert_eq!(config.vision.max_ambiguity, 0.2);
        assert_eq!(config.field.tags.len(), 1);
        assert_eq!(config.robot.trajectory.get_type_str(), "Stationary");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let text = format!("{MINIMAL}\n[camera]\nframe_rate = 10.0\n");
        assert!(matches!(
            ScenarioConfig::from_toml_str(&text),
            Err(SimError::Toml(_))
        ));
    }

    #[test]
    fn non_positive_rates_are_rejected() {
        for section in [
            "[simulation]\ncontrol_rate_hz = 0.0",
            "[camera]\nrate_hz = -5.0",
            "[simulation]\nduration_seconds = 0.0",
        ] {
            let text = format!("{MINIMAL}\n{section}\n");
            assert!(
                matches!(ScenarioConfig::from_toml_str(&text), Err(SimError::Invalid(_))),
                "{section}"
            );
        }
    }

    #[test]
    fn empty_field_is_rejected() {
        assert!(matches!(
            ScenarioConfig::from_toml_str("[simulation]\nseed = 1\n"),
            Err(SimError::Invalid(_))
        ));
    }

    #[test]
    fn field_of_view_must_be_a_real_cone() {
        let text = format!("{MINIMAL}\n[camera]\nhorizontal_fov_deg = 180.0\n");
        assert!(ScenarioConfig::from_toml_str(&text).is_err());
    }

    #[test]
    fn inline_tags_build_a_field() {
        let config = ScenarioConfig::from_toml_str(MINIMAL).expect("valid scenario");
        let field = config
            .field
            .build_field_map(Path::new("."))
            .expect("one inline tag");
        assert!(field.contains(1));
    }

    #[test]
    fn missing_layout_file_is_an_io_error() {
        let field = FieldConfig {
            layout_file: Some("does/not/exist.json".into()),
            tags: Vec::new(),
        };
        assert!(matches!(
            field.build_field_map(Path::new("/nonexistent")),
            Err(SimError::Io { .. })
        ));
    }
}
