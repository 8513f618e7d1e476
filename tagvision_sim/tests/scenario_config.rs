// tagvision_sim/tests/scenario_config.rs

use figment::Jail;
use std::path::{Path, PathBuf};

use tagvision_sim::prelude::*;

const SCENARIO: &str = r#"
    [simulation]
    seed = 1
    control_rate_hz = 50.0

    [camera]
    rate_hz = 30.0

    [vision]
    max_ambiguity = 0.2
    sort_mode = "closest"

    [[field.tags]]
    id = 4
    translation = [4.0, 0.0, 0.8]
    rotation = [0.0, 0.0, 180.0]
"#;

fn asset(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join(relative)
}

// Every test that goes through the env provider runs inside a Jail so the
// process environment is never shared between them.

#[test]
fn scenario_file_parses() {
    Jail::expect_with(|jail| {
        jail.create_file("scenario.toml", SCENARIO)?;
        let config = load_scenario(Path::new("scenario.toml")).map_err(|e| e.to_string())?;
        assert_eq!(config.vision.sort_mode, SortMode::Closest);
        assert_eq!(config.field.tags[0].id, 4);
        assert_eq!(config.simulation.seed, Some(1));
        Ok(())
    });
}

#[test]
fn env_overrides_file_values() {
    Jail::expect_with(|jail| {
        jail.create_file("scenario.toml", SCENARIO)?;
        jail.set_env("TAGVISION_VISION__MAX_AMBIGUITY", "0.35");
        jail.set_env("TAGVISION_VISION__SORT_MODE", "centermost");
        jail.set_env("TAGVISION_SIMULATION__SEED", "99");

        let config = load_scenario(Path::new("scenario.toml")).map_err(|e| e.to_string())?;
        assert_eq!(config.vision.max_ambiguity, 0.35);
        assert_eq!(config.vision.sort_mode, SortMode::Centermost);
        assert_eq!(config.simulation.seed, Some(99));
        Ok(())
    });
}

#[test]
fn env_cannot_sneak_in_invalid_rates() {
    Jail::expect_with(|jail| {
        jail.create_file("scenario.toml", SCENARIO)?;
        jail.set_env("TAGVISION_CAMERA__RATE_HZ", "0");
        let result = load_scenario(Path::new("scenario.toml"));
        assert!(matches!(result, Err(SimError::Invalid(_))), "{result:?}");
        Ok(())
    });
}

#[test]
fn missing_scenario_is_an_io_error() {
    Jail::expect_with(|_| {
        let result = load_scenario(Path::new("nope.toml"));
        assert!(matches!(result, Err(SimError::Io { .. })), "{result:?}");
        Ok(())
    });
}

#[test]
fn unknown_section_is_a_config_error() {
    Jail::expect_with(|jail| {
        jail.create_file("scenario.toml", &format!("{SCENARIO}\n[lidar]\nrate = 10\n"))?;
        let result = load_scenario(Path::new("scenario.toml"));
        assert!(matches!(result, Err(SimError::Config(_))), "{result:?}");
        Ok(())
    });
}

#[test]
fn layout_file_and_inline_tags_merge() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "layout.json",
            r#"{"tags": [
                {"ID": 4, "pose": {"translation": {"x": 9.0, "y": 0.0, "z": 0.8},
                    "rotation": {"quaternion": {"W": 0.0, "X": 0.0, "Y": 0.0, "Z": 1.0}}}},
                {"ID": 6, "pose": {"translation": {"x": 4.0, "y": 2.0, "z": 0.8},
                    "rotation": {"quaternion": {"W": 0.0, "X": 0.0, "Y": 0.0, "Z": 1.0}}}}
            ]}"#,
        )?;
        jail.create_file(
            "scenario.toml",
            &SCENARIO.replace("[[field.tags]]", "[field]\nlayout_file = \"layout.json\"\n\n[[field.tags]]"),
        )?;

        let runner =
            SimulationRunner::from_scenario_file(Path::new("scenario.toml")).map_err(|e| e.to_string())?;
        let field = runner.vision().field();
        assert_eq!(field.ids(), vec![4, 6]);
        // The inline entry wins over the layout's tag 4.
        let tag4 = field.tag_pose(4).ok_or_else(|| "tag 4 missing".to_string())?;
        assert!((tag4.translation().x - 4.0).abs() < 1e-12);
        Ok(())
    });
}

#[test]
fn shipped_scenarios_load() {
    Jail::expect_with(|_| {
        for name in ["00_single_tag.toml", "01_circle_two_tags.toml"] {
            let path = asset(&format!("assets/scenarios/{name}"));
            let runner = SimulationRunner::from_scenario_file(&path).map_err(|e| format!("{name}: {e}"))?;
            assert!(!runner.vision().field().is_empty());
        }
        Ok(())
    });
}
