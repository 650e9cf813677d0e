//! Snapshot records parsed from one iftop report
//!
//! Rates are bits per second, cumulative values are bytes. All types are
//! plain values; nothing here borrows from the capture buffer.

use serde::{Deserialize, Serialize};

/// Rates over iftop's three averaging windows, in bits per second
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntervalRates {
    /// Average over the last 2 seconds
    pub last_2s: u64,
    /// Average over the last 10 seconds
    pub last_10s: u64,
    /// Average over the last 40 seconds
    pub last_40s: u64,
}

impl IntervalRates {
    /// Creates rates from the three window averages
    #[must_use]
    pub const fn new(last_2s: u64, last_10s: u64, last_40s: u64) -> Self {
        Self {
            last_2s,
            last_10s,
            last_40s,
        }
    }
}

/// A sent/received/total triple
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Totals {
    /// Outgoing direction
    pub sent: u64,
    /// Incoming direction
    pub received: u64,
    /// Both directions
    pub total: u64,
}

impl Totals {
    /// Creates a triple
    #[must_use]
    pub const fn new(sent: u64, received: u64, total: u64) -> Self {
        Self {
            sent,
            received,
            total,
        }
    }
}

/// One connection row of the iftop table
///
/// `sent` is the `=>` line (source to destination), `received` is the `<=`
/// line (destination to source).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowRecord {
    /// Source host (address, name, or `host:port` depending on display mode)
    pub source: String,
    /// Source-to-destination rates
    pub sent: IntervalRates,
    /// Bytes sent since capture start
    pub sent_cumulative: u64,
    /// Destination host
    pub destination: String,
    /// Destination-to-source rates
    pub received: IntervalRates,
    /// Bytes received since capture start
    pub received_cumulative: u64,
}

impl FlowRecord {
    /// Bytes transferred in both directions
    #[must_use]
    pub const fn total_cumulative(&self) -> u64 {
        self.sent_cumulative.saturating_add(self.received_cumulative)
    }
}

/// One fully parsed iftop report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Connection rows in on-screen order
    pub flows: Vec<FlowRecord>,
    /// Total send rate
    pub send: IntervalRates,
    /// Total receive rate
    pub receive: IntervalRates,
    /// Total send and receive rate
    pub combined: IntervalRates,
    /// Peak rates (bits per second)
    pub peak: Totals,
    /// Cumulative transfer (bytes)
    pub cumulative: Totals,
}

impl Snapshot {
    /// Number of connection rows
    #[must_use]
    pub fn flow_count(&self) -> usize {
        self.flows.len()
    }
}
