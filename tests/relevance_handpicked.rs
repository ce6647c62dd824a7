// tests/relevance_handpicked.rs
// Hand-picked cases for the relevance gate, using an inline TOML config.

use award_consensus::relevance::RelevanceGate;
use award_consensus::PipelineConfig;
use std::path::Path;

const TEST_TOML: &str = r#"
[gate]
exclude_reshares = true

# Predictions are chatter, not results
[[gate.blockers]]
id = "prediction"
pattern = "(?i)\\b(predict(ion|s)?|hope|should win|will win)\\b"
reason = "prediction"

[[gate.blockers]]
id = "fashion"
pattern = "(?i)\\b(wearing|dressed|gown)\\b"
reason = "red carpet"
"#;

fn gate() -> RelevanceGate {
    RelevanceGate::from_toml_str(TEST_TOML).expect("test gate compiles")
}

#[test]
fn award_results_pass() {
    let g = gate();
    for text in [
        "Argo wins Best Motion Picture - Drama",
        "Best Director goes to Ben Affleck",
        "And the winner is... Jennifer Lawrence!",
        "Anne Hathaway won best supporting actress",
        "Tina Fey and Amy Poehler host the Golden Globes",
    ] {
        assert!(g.is_relevant(text), "should pass: {text}");
    }
}

#[test]
fn chatter_is_dropped() {
    let g = gate();
    assert!(!g.is_relevant("Red carpet looks are amazing tonight"));
    assert!(!g.is_relevant("brb getting snacks"));
}

#[test]
fn reshares_are_dropped_before_blockers() {
    let v = gate().check("RT @goldenglobes: Argo wins Best Motion Picture");
    assert!(v.reshare);
    assert!(v.keyword);
    assert!(!v.relevant);
    assert!(v.blockers.is_empty());

    let v = gate().check("so true RT @someone Argo wins");
    assert!(v.reshare);
}

#[test]
fn blockers_report_id_and_reason() {
    let v = gate().check("My prediction: Lincoln wins best picture");
    assert!(!v.relevant);
    assert_eq!(v.blockers, vec!["blocker:prediction:prediction".to_string()]);

    let v = gate().check("Best dressed tonight: Anne Hathaway in a Valentino gown");
    assert_eq!(v.blockers, vec!["blocker:fashion:red carpet".to_string()]);
}

#[test]
fn shipped_config_lets_nominee_lists_through() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/pipeline.toml");
    let cfg = PipelineConfig::load_from(&path).unwrap();
    let g = RelevanceGate::from_cfg(&cfg.gate).unwrap();
    assert!(g.is_relevant("Best Director nominees: Ben Affleck, Kathryn Bigelow and Ang Lee"));
    assert!(g.is_relevant("Nominations for best actor: Hugh Jackman, Daniel Day-Lewis"));
    assert!(!g.is_relevant("Lincoln should win best picture"));
}

#[test]
fn reshares_kept_when_toggle_off() {
    let g = RelevanceGate::from_toml_str("[gate]\nexclude_reshares = false\n").unwrap();
    assert!(g.is_relevant("RT @goldenglobes: Argo wins Best Motion Picture"));
}

#[test]
fn custom_pattern_replaces_default() {
    let g = RelevanceGate::from_toml_str("[gate]\npattern = \"(?i)\\\\boscar\\\\b\"\n").unwrap();
    assert!(g.is_relevant("Oscar night"));
    assert!(!g.is_relevant("Argo wins"));
}
