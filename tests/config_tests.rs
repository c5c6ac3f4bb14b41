use std::path::PathBuf;
use std::time::Duration;

use portfolio_backdrop::config::{Configuration, PoolSource};

#[test]
fn parse_minimal_manifest_config() {
    let yaml = r#"
pool:
  manifest: "images.yaml"
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    let cfg = cfg.validated().unwrap();
    assert_eq!(
        cfg.pool.source().unwrap(),
        PoolSource::Manifest(&PathBuf::from("images.yaml"))
    );
    assert_eq!(cfg.rotation.rotate_interval, Duration::from_millis(3000));
    assert_eq!(cfg.rotation.transition_interval, Duration::from_millis(1500));
    assert_eq!(cfg.rotation.initial_paint_delay, Duration::from_millis(10));
    assert!((cfg.rotation.orientation_ratio - 4.0 / 3.0).abs() < f64::EPSILON);
    assert_eq!(cfg.rotation.seed, None);
    assert_eq!(cfg.pool.extensions, None);
    assert!(cfg.pool.exclude.is_empty());
    assert!((cfg.viewport.width - 1920.0).abs() < f64::EPSILON);
    assert!((cfg.viewport.height - 1080.0).abs() < f64::EPSILON);
}

#[test]
fn parse_library_config_with_overrides() {
    let yaml = r#"
pool:
  library: "/photos"
  recursive: false
  max-depth: 2
  extensions: [png, jpg]
  exclude: [logo.png]
rotation:
  rotate-interval: 5s
  transition-interval: 2s 500ms
  initial-paint-delay: 50ms
  orientation-ratio: 1.5
  seed: 7
viewport:
  width: 800
  height: 1200
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    let cfg = cfg.validated().unwrap();
    assert_eq!(
        cfg.pool.source().unwrap(),
        PoolSource::Library(&PathBuf::from("/photos"))
    );
    assert!(!cfg.pool.recursive);
    assert_eq!(cfg.pool.max_depth, Some(2));
    assert_eq!(
        cfg.pool.extensions.as_deref(),
        Some(&["png".to_string(), "jpg".to_string()][..])
    );
    assert_eq!(cfg.pool.exclude, ["logo.png"]);
    assert_eq!(cfg.rotation.rotate_interval, Duration::from_secs(5));
    assert_eq!(cfg.rotation.transition_interval, Duration::from_millis(2500));
    assert_eq!(cfg.rotation.initial_paint_delay, Duration::from_millis(50));
    assert!((cfg.rotation.orientation_ratio - 1.5).abs() < f64::EPSILON);
    assert_eq!(cfg.rotation.seed, Some(7));
    assert!((cfg.viewport.ratio() - 800.0 / 1200.0).abs() < f64::EPSILON);
}

#[test]
fn pool_source_is_required_and_exclusive() {
    let cfg: Configuration = serde_yaml::from_str("rotation: {}").unwrap();
    let err = cfg.validated().unwrap_err();
    assert!(err.to_string().contains("must be set"), "{err}");

    let yaml = r#"
pool:
  manifest: "a.yaml"
  library: "/photos"
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    let err = cfg.validated().unwrap_err();
    assert!(err.to_string().contains("mutually exclusive"), "{err}");
}

#[test]
fn rotate_interval_must_exceed_transition() {
    let yaml = r#"
pool:
  manifest: "a.yaml"
rotation:
  rotate-interval: 1s
  transition-interval: 1s
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    let err = cfg.validated().unwrap_err();
    assert!(err.to_string().contains("longer than"), "{err}");
}

#[test]
fn orientation_ratio_must_exceed_one() {
    let yaml = r#"
pool:
  manifest: "a.yaml"
rotation:
  orientation-ratio: 0.9
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert!(cfg.validated().is_err());
}

#[test]
fn viewport_must_be_positive() {
    let yaml = r#"
pool:
  manifest: "a.yaml"
viewport:
  width: 0
  height: 100
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    let err = cfg.validated().unwrap_err();
    assert!(err.to_string().contains("viewport"), "{err}");
}

#[test]
fn unknown_keys_are_rejected() {
    let yaml = r#"
pool:
  manifest: "a.yaml"
rotation:
  rotate-every: 3s
"#;
    assert!(serde_yaml::from_str::<Configuration>(yaml).is_err());
}

#[test]
fn load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "pool:\n  library: \"./photos\"\n").unwrap();
    let cfg = Configuration::from_yaml_file(&path).unwrap().validated().unwrap();
    assert_eq!(cfg.pool.library, Some(PathBuf::from("./photos")));
    assert!(cfg.pool.recursive);
}

#[test]
fn empty_extension_list_is_rejected() {
    let yaml = r#"
pool:
  library: "/photos"
  extensions: []
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    let err = cfg.validated().unwrap_err();
    assert!(err.to_string().contains("pool.extensions"), "{err}");
}
