//! End-to-end tests of the capture pipeline on realistic transcripts

use iftopwatch_core::capture::{FRAME_SEPARATOR, ParseError, PipelineOutput, StreamPipeline};
use iftopwatch_core::to_numeric;

use crate::fixtures;

fn snapshots(outputs: &[PipelineOutput]) -> Vec<&iftopwatch_core::Snapshot> {
    outputs
        .iter()
        .filter_map(|output| match output {
            PipelineOutput::Snapshot(snapshot) => Some(snapshot),
            _ => None,
        })
        .collect()
}

#[test]
fn test_three_row_frame_with_single_line_rates() {
    let mut pipeline = StreamPipeline::iftop();
    let text = format!(
        "{}{}",
        fixtures::PREAMBLE,
        fixtures::report_with(&fixtures::rows(3), fixtures::SINGLE_LINE_RATES)
    );

    let outputs = pipeline.ingest(&text);
    let found = snapshots(&outputs);
    assert_eq!(found.len(), 1);

    let snapshot = found[0];
    assert_eq!(snapshot.flow_count(), 3);
    assert_eq!(snapshot.send.last_2s, to_numeric("1.2Mb").unwrap());
    assert_eq!(snapshot.receive.last_2s, to_numeric("2.0Mb").unwrap());
    assert_eq!(snapshot.combined.last_2s, to_numeric("3.2Mb").unwrap());
    assert_eq!(snapshot.flows[2].source, "192.168.1.3");
    assert_eq!(snapshot.flows[2].destination, "151.101.3.69");
    assert_eq!(snapshot.flows[0].total_cumulative(), 7_550_000);
}

#[test]
fn test_transcript_fed_in_small_chunks() {
    let text = fixtures::transcript(4);
    let mut pipeline = StreamPipeline::iftop();

    let mut outputs = Vec::new();
    let bytes = text.as_bytes();
    for chunk in bytes.chunks(37) {
        // Fixtures are ASCII, so every byte boundary is a char boundary
        outputs.extend(pipeline.ingest(std::str::from_utf8(chunk).unwrap()));
    }

    let found = snapshots(&outputs);
    assert_eq!(found.len(), 4);
    assert!(found.iter().all(|s| s.flow_count() == 3));
    assert!(found.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn test_row_limit_of_many_rows() {
    let mut pipeline = StreamPipeline::iftop();
    let outputs = pipeline.ingest(&fixtures::report(120));
    let found = snapshots(&outputs);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].flow_count(), 120);
    assert_eq!(found[0].flows[119].source, "192.168.1.120");
}

#[test]
fn test_corrupted_frame_between_good_ones() {
    let mut pipeline = StreamPipeline::iftop();
    let corrupted = fixtures::report(2).replacen("1.20Mb", "1.20M b", 1);
    let text = format!("{}{corrupted}{}", fixtures::report(1), fixtures::report(2));

    let outputs = pipeline.ingest(&text);
    assert_eq!(outputs.len(), 3);
    assert!(matches!(outputs[0], PipelineOutput::Snapshot(_)));
    assert!(matches!(
        outputs[1],
        PipelineOutput::MalformedFrame(ParseError::MalformedRow { row: 1, .. })
    ));
    assert!(matches!(outputs[2], PipelineOutput::Snapshot(_)));
}

#[test]
fn test_buffer_keeps_only_separator_and_partial_frame() {
    let mut pipeline = StreamPipeline::iftop();
    let partial = &fixtures::report(1)[..50];
    let text = format!("{}{partial}", fixtures::report(1));

    assert_eq!(snapshots(&pipeline.ingest(&text)).len(), 1);
    assert_eq!(
        pipeline.buffered_len(),
        FRAME_SEPARATOR.len() + "\n\n".len() + partial.len()
    );
}

#[test]
fn test_device_error_after_snapshots() {
    let mut pipeline = StreamPipeline::iftop();
    assert_eq!(snapshots(&pipeline.ingest(&fixtures::report(1))).len(), 1);

    let outputs = pipeline.ingest("pcap_open_live(eth7): eth7: No such device exists\n");
    assert!(matches!(outputs.as_slice(), [PipelineOutput::DeviceNotFound(_)]));
    assert!(pipeline.ingest(&fixtures::report(1)).is_empty());
}
