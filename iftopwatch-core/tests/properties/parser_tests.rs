//! Property-based tests for the entry parser

use proptest::prelude::*;

use iftopwatch_core::capture::{EntryParser, FrameBuffer, ParseError};

use crate::fixtures;

/// Cuts the single frame out of a report
fn frame_of(report: &str) -> String {
    let mut frames = FrameBuffer::iftop().ingest(report);
    assert_eq!(frames.len(), 1);
    frames.remove(0)
}

// ========== Strategies ==========

fn arb_host() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u8..=255, 0u8..=255).prop_map(|(a, b)| format!("10.{a}.{b}.1")),
        "[a-z]{1,12}(\\.[a-z]{2,5}){1,2}(:[a-z]{2,8})?",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every row comes back with its hosts, in on-screen order
    #[test]
    fn rows_parse_in_order(hosts in prop::collection::vec((arb_host(), arb_host()), 0..25)) {
        let rows: String = hosts
            .iter()
            .enumerate()
            .map(|(i, (src, dst))| fixtures::row(i + 1, src, dst))
            .collect();
        let frame = frame_of(&fixtures::report_with(&rows, fixtures::MULTI_LINE_RATES));

        let snapshot = EntryParser::iftop().parse(&frame).unwrap();
        prop_assert_eq!(snapshot.flow_count(), hosts.len());
        for (flow, (src, dst)) in snapshot.flows.iter().zip(&hosts) {
            prop_assert_eq!(&flow.source, src);
            prop_assert_eq!(&flow.destination, dst);
        }
    }

    /// Damaging any one row makes the whole frame malformed instead of
    /// silently dropping that row
    #[test]
    fn corrupted_row_is_never_skipped(count in 1usize..10, victim in 0usize..10) {
        let victim = victim % count + 1;
        let rows: String = (1..=count)
            .map(|i| {
                let row = fixtures::row(i, &format!("10.0.0.{i}"), "10.0.1.1");
                if i == victim { row.replacen("=>", "->", 1) } else { row }
            })
            .collect();
        let frame = frame_of(&fixtures::report_with(&rows, fixtures::MULTI_LINE_RATES));

        let err = EntryParser::iftop().parse(&frame).unwrap_err();
        prop_assert_eq!(
            err,
            ParseError::MalformedRow { row: victim, text: rows_body(&rows, victim) }
        );
    }
}

/// Text of row `index` as the parser reports it: without its index column
fn rows_body(rows: &str, index: usize) -> String {
    let lines: Vec<&str> = rows.lines().collect();
    let first = &lines[(index - 1) * 2][5..];
    let second = lines[(index - 1) * 2 + 1];
    format!("{first}\n{second}")
}
