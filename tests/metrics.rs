// tests/metrics.rs
// Counters land in a Prometheus recorder without installing a global one.

use award_consensus::analyze::CapitalizedSpanRecognizer;
use award_consensus::{Message, Pipeline, PipelineConfig};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;

#[test]
fn pipeline_counters_render() {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    let pipeline = Pipeline::from_config(
        &PipelineConfig::default(),
        Arc::new(CapitalizedSpanRecognizer::default()),
    )
    .unwrap();
    let msgs = vec![
        Message::new("1", Some(0), "Argo wins Best Motion Picture Drama"),
        Message::new("2", Some(1_000), "Best Motion Picture Drama goes to Argo"),
        Message::new("3", Some(2_000), "lunch time"),
    ];

    metrics::with_local_recorder(&recorder, || {
        pipeline.run(&msgs);
    });

    let text = handle.render();
    assert!(text.contains("pipeline_messages_total 3"), "{text}");
    assert!(text.contains("pipeline_relevant_total 2"), "{text}");
    assert!(text.contains("pipeline_candidates_total 2"), "{text}");
    assert!(text.contains("pipeline_elections_total 1"), "{text}");
}
