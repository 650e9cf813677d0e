//! Text fixtures shaped like `iftop -t` output

#![allow(dead_code)]

use iftopwatch_core::capture::FRAME_SEPARATOR;

pub const TABLE_HEADER: &str = "   # Host name (port/service if enabled)            last 2s   last 10s   last 40s cumulative";

pub const MULTI_LINE_RATES: &str = "Total send rate:                                     1.20Mb      980Kb     1.10Mb\n\
Total receive rate:                                  2.00Mb     1.80Mb     1.90Mb\n\
Total send and receive rate:                         3.20Mb     2.80Mb     3.00Mb\n";

pub const SINGLE_LINE_RATES: &str = "Total send rate: 1.2Mb 980Kb 1.1Mb Total receive rate: 2.0Mb 1.8Mb 1.9Mb Total send and receive rate: 3.2Mb 2.8Mb 3.0Mb\n";

pub const PEAKS: &str = "Peak rate (sent/received/total):                     1.40Mb     2.30Mb     3.70Mb\n\
Cumulative (sent/received/total):                    2.87MB     4.84MB     7.71MB\n";

/// What iftop prints before the first report
pub const PREAMBLE: &str = "interface: eth0\nIP address is: 192.168.1.10\nMAC address is: 52:54:00:12:34:56\nListening on eth0\n";

pub fn rule() -> String {
    "-".repeat(92)
}

/// One two-line table row
pub fn row(index: usize, source: &str, destination: &str) -> String {
    format!(
        "{index:>4} {source:<40} => {s2:>10} {s10:>10} {s40:>10} {scum:>10}\n     {destination:<40} <= {r2:>10} {r10:>10} {r40:>10} {rcum:>10}\n",
        s2 = "1.20Mb",
        s10 = "980Kb",
        s40 = "1.10Mb",
        scum = "2.75MB",
        r2 = "2.00Mb",
        r10 = "1.80Mb",
        r40 = "1.90Mb",
        rcum = "4.80MB",
    )
}

/// `count` rows with distinct hosts
pub fn rows(count: usize) -> String {
    (1..=count)
        .map(|i| row(i, &format!("192.168.1.{i}"), &format!("151.101.{i}.69")))
        .collect()
}

/// A complete report including its closing separator
pub fn report_with(rows: &str, rates: &str) -> String {
    let rule = rule();
    format!("{TABLE_HEADER}\n{rule}\n{rows}{rule}\n{rates}{rule}\n{PEAKS}{FRAME_SEPARATOR}\n\n")
}

/// A complete report with `count` rows and multi-line rate summary
pub fn report(count: usize) -> String {
    report_with(&rows(count), MULTI_LINE_RATES)
}

/// Preamble followed by `frames` reports of three rows each
pub fn transcript(frames: usize) -> String {
    let mut text = PREAMBLE.to_string();
    for _ in 0..frames {
        text.push_str(&report(3));
    }
    text
}
