use std::path::Path;
use std::sync::Mutex;

use tempfile::NamedTempFile;

use signal_witness::config::ClassifierConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "TL_CONFIG",
        "TL_MODEL_PATH",
        "TL_CONFIDENCE_THRESHOLD",
        "TL_INTENSITY_THRESHOLD",
        "TL_INPUT_SIZE",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let toml = r#"
        confidence_threshold = 0.35
        intensity_threshold = 55.0

        [model]
        path = "/srv/models/coco"
        topology_file = "detector.onnx"
        weights_file = "detector.bin"
        input_size = 320
    "#;
    std::io::Write::write_all(&mut file, toml.as_bytes()).expect("write config");

    std::env::set_var("TL_CONFIG", file.path());
    std::env::set_var("TL_MODEL_PATH", "/opt/yolo");
    std::env::set_var("TL_INTENSITY_THRESHOLD", "42.1");

    let cfg = ClassifierConfig::load().expect("load config");

    assert_eq!(cfg.confidence_threshold, 0.35);
    assert_eq!(cfg.intensity_threshold, 42.1);
    assert_eq!(cfg.traffic_light_class_id, 9);
    assert_eq!(cfg.model.input_size, 320);
    assert_eq!(cfg.topology_path(), Path::new("/opt/yolo/detector.onnx"));
    assert_eq!(cfg.weights_path(), Path::new("/opt/yolo/detector.bin"));

    clear_env();
}

#[test]
fn invalid_confidence_from_env_is_fatal() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("TL_CONFIDENCE_THRESHOLD", "0");
    assert!(ClassifierConfig::load().is_err());

    std::env::set_var("TL_CONFIDENCE_THRESHOLD", "high");
    assert!(ClassifierConfig::load().is_err());

    clear_env();
}

#[test]
fn missing_config_file_is_fatal() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("absent.toml");
    assert!(ClassifierConfig::load_from(Some(&missing)).is_err());

    clear_env();
}

#[test]
fn defaults_apply_without_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = ClassifierConfig::load().expect("default config");
    assert_eq!(cfg, ClassifierConfig::default());

    clear_env();
}
