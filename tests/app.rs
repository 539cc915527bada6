use opinet::app::{load_config, App, RunOptions};
use opinet::model::config::OpDynConfig;
use opinet::model::snapshot::Record;
use std::fs;
use std::path::PathBuf;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("opinet_{}_{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_config_file_round_trip() {
    let dir = scratch_dir("config");
    let path = dir.join("config.toml");

    let mut config = OpDynConfig::default();
    config.seed = Some(99);
    config.modes.media = true;
    config.parameters.rewiring = 0.35;
    fs::write(&path, toml::to_string(&config).unwrap()).unwrap();

    let loaded = load_config(Some(&path)).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.fingerprint(), config.fingerprint());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_missing_config_file_is_reported() {
    let err = load_config(Some(&PathBuf::from("/nonexistent/opinet.toml"))).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = scratch_dir("invalid");
    let path = dir.join("config.toml");
    fs::write(&path, "[parameters]\nrewiring = 1.5\n").unwrap();
    assert!(load_config(Some(&path)).is_err());
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_run_writes_jsonl() {
    let dir = scratch_dir("run");
    let output = dir.join("out").join("run.jsonl");

    let mut app = App::new(RunOptions {
        config: None,
        seed: Some(5),
        steps: Some(300),
        output: Some(output.clone()),
    })
    .unwrap();
    app.run().unwrap();
    assert_eq!(app.model.time, 300);

    let text = fs::read_to_string(&output).unwrap();
    let records: Vec<Record> = text
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    // Header, t = 0, 100, 200, 300, final analysis
    assert_eq!(records.len(), 6);
    assert!(matches!(&records[0], Record::Header(h) if h.seed == Some(5)));
    let times: Vec<u64> = records
        .iter()
        .filter_map(|r| match r {
            Record::Snapshot(s) => Some(s.time),
            _ => None,
        })
        .collect();
    assert_eq!(times, vec![0, 100, 200, 300]);
    assert!(matches!(&records[5], Record::Analysis(a) if a.time == 300));

    fs::remove_dir_all(&dir).ok();
}
