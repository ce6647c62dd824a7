// tests/config_env.rs
// Config loading through env vars and files. Mutates process env → serial.

use award_consensus::analyze::{ner::ner_config_dir, EntityRecognizer, GazetteerRecognizer};
use award_consensus::config::{PipelineConfig, ENV_LOW_CONFIDENCE_SHARE, ENV_PIPELINE_CONFIG};
use award_consensus::{Pipeline, LayeredRecognizer};
use std::{env, fs, sync::Arc};

#[serial_test::serial]
#[test]
fn explicit_path_and_share_override() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("pipeline.toml");
    fs::write(&p, "[voter]\nlow_confidence_share = 0.4\nmax_runner_ups = 2\n").unwrap();

    env::set_var(ENV_PIPELINE_CONFIG, &p);
    env::remove_var(ENV_LOW_CONFIDENCE_SHARE);
    let cfg = PipelineConfig::from_toml().unwrap();
    assert_eq!(cfg.voter.low_confidence_share, 0.4);
    assert_eq!(cfg.voter.max_runner_ups, 2);

    env::set_var(ENV_LOW_CONFIDENCE_SHARE, "0.9");
    let cfg = PipelineConfig::from_toml().unwrap();
    assert_eq!(cfg.voter.low_confidence_share, 0.9);

    // out-of-range env is clamped, garbage is ignored
    env::set_var(ENV_LOW_CONFIDENCE_SHARE, "7");
    assert_eq!(PipelineConfig::from_toml().unwrap().voter.low_confidence_share, 1.0);
    env::set_var(ENV_LOW_CONFIDENCE_SHARE, "high");
    assert_eq!(PipelineConfig::from_toml().unwrap().voter.low_confidence_share, 0.4);

    env::remove_var(ENV_LOW_CONFIDENCE_SHARE);
    env::remove_var(ENV_PIPELINE_CONFIG);
}

#[serial_test::serial]
#[test]
fn missing_explicit_path_is_an_error() {
    env::set_var(ENV_PIPELINE_CONFIG, "/definitely/not/here/pipeline.toml");
    let err = PipelineConfig::from_toml().unwrap_err().to_string();
    assert!(err.contains("Failed to read pipeline config"));
    env::remove_var(ENV_PIPELINE_CONFIG);
}

#[serial_test::serial]
#[test]
fn default_path_falls_back_to_defaults() {
    // Isolate CWD so the repo's own config/ is not read
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var(ENV_PIPELINE_CONFIG);
    env::remove_var(ENV_LOW_CONFIDENCE_SHARE);

    let cfg = PipelineConfig::from_toml().unwrap();
    assert_eq!(cfg, PipelineConfig::default());

    // a default-location file is picked up
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(tmp.path().join("config/pipeline.toml"), "[detector]\ntop_k = 4\n").unwrap();
    assert_eq!(PipelineConfig::from_toml().unwrap().detector.top_k, 4);

    env::set_current_dir(old).unwrap();
}

#[serial_test::serial]
#[test]
fn gazetteer_dir_follows_env() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("people.json"),
        r#"{ "kind": "PERSON", "patterns": [ { "regex": "(?i)\\bddl\\b", "label": "Daniel Day-Lewis" } ] }"#,
    )
    .unwrap();
    fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    env::set_var("NER_CONFIG_DIR", dir.path());
    assert_eq!(ner_config_dir(), dir.path());
    let g = GazetteerRecognizer::from_default_dir();
    assert_eq!(g.len(), 1);
    let hits = LayeredRecognizer::standard().typed_entities("DDL for Lincoln");
    assert_eq!(hits[0].text, "Daniel Day-Lewis");
    env::remove_var("NER_CONFIG_DIR");
}

#[test]
fn bad_config_fails_before_running() {
    let cfg = PipelineConfig::from_toml_str(
        r#"
[[gate.blockers]]
id = "oops"
pattern = "(unclosed"
reason = "broken"
"#,
    )
    .unwrap();
    let err = Pipeline::from_config(&cfg, Arc::new(LayeredRecognizer::new()))
        .unwrap_err()
        .to_string();
    assert!(err.contains("blocker `oops` regex error"));

    let cfg = PipelineConfig::from_toml_str(
        "[canonicalizer]\nknown_categories_path = \"/definitely/not/here.txt\"\n",
    )
    .unwrap();
    assert!(Pipeline::from_config(&cfg, Arc::new(LayeredRecognizer::new())).is_err());
}
