//! Parser for a single iftop report
//!
//! A report is laid out as:
//!
//! ```text
//!    # Host name (port/service if enabled)     last 2s   last 10s   last 40s cumulative
//! --------------------------------------------------------------------------------------------
//!    1 192.168.1.10              =>     1.20Mb      980Kb     1.10Mb     2.75MB
//!      151.101.1.69              <=     2.00Mb     1.80Mb     1.90Mb     4.80MB
//! --------------------------------------------------------------------------------------------
//! Total send rate:                      1.20Mb      980Kb     1.10Mb
//! Total receive rate:                   2.00Mb     1.80Mb     1.90Mb
//! Total send and receive rate:          3.20Mb     2.80Mb     3.00Mb
//! --------------------------------------------------------------------------------------------
//! Peak rate (sent/received/total):      1.40Mb     2.30Mb     3.70Mb
//! Cumulative (sent/received/total):     2.87MB     4.84MB     7.71MB
//! ```

use std::sync::Arc;

use regex::Captures;
use thiserror::Error;

use super::grammar::Grammar;
use super::snapshot::{FlowRecord, IntervalRates, Snapshot, Totals};
use crate::units::{Quantity, UnitError, UnitKind};

/// Errors for a frame that was cut out of the stream but could not be parsed
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A required section is absent
    #[error("Malformed frame: missing {0} section")]
    MissingSection(&'static str),

    /// A table row does not match the flow row layout
    #[error("Malformed frame: row {row} does not match the flow layout: {text:?}")]
    MalformedRow {
        /// 1-based row position in the table
        row: usize,
        /// The offending row text
        text: String,
    },

    /// A summary section does not match its layout
    #[error("Malformed frame: {0} summary does not match")]
    MalformedSummary(&'static str),

    /// A magnitude could not be normalized
    #[error("Malformed frame: {0}")]
    InvalidQuantity(#[from] UnitError),
}

/// Result type for frame parsing
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Parses frames produced by [`super::FrameBuffer`] into [`Snapshot`]s
#[derive(Debug, Clone)]
pub struct EntryParser {
    grammar: Arc<Grammar>,
}

impl EntryParser {
    /// Creates a parser for `grammar`
    #[must_use]
    pub fn new(grammar: Arc<Grammar>) -> Self {
        Self { grammar }
    }

    /// Creates a parser for the built-in iftop grammar
    #[must_use]
    pub fn iftop() -> Self {
        Self::new(Grammar::iftop())
    }

    /// Parses one frame.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] on the first section, row, or value that does
    /// not match; no partial snapshot is ever produced.
    pub fn parse(&self, frame: &str) -> ParseResult<Snapshot> {
        let text = frame.replace('\r', "");
        let sections: Vec<&str> = self.grammar.section_rule().split(&text).collect();

        if !sections
            .first()
            .is_some_and(|header| self.grammar.is_frame_start(header))
        {
            return Err(ParseError::MissingSection("table header"));
        }
        let table = sections
            .get(1)
            .ok_or(ParseError::MissingSection("connection table"))?;
        let rate_section = sections
            .get(2)
            .ok_or(ParseError::MissingSection("rate summary"))?;
        // Anything after the peak section is ignored
        let peak_section = sections
            .get(3)
            .ok_or(ParseError::MissingSection("peak/cumulative"))?;

        let flows = self.parse_flows(table)?;
        let (send, receive, combined) = self.parse_rates(rate_section)?;
        let (peak, cumulative) = self.parse_peaks(peak_section)?;

        Ok(Snapshot {
            flows,
            send,
            receive,
            combined,
            peak,
            cumulative,
        })
    }

    /// Splits the table on row indices and parses every row body
    fn parse_flows(&self, table: &str) -> ParseResult<Vec<FlowRecord>> {
        let starts: Vec<(usize, usize)> = self
            .grammar
            .row_index()
            .find_iter(table)
            .map(|m| (m.start(), m.end()))
            .collect();

        let prelude_end = starts.first().map_or(table.len(), |&(start, _)| start);
        let prelude = &table[..prelude_end];
        if !prelude.trim().is_empty() {
            return Err(ParseError::MalformedRow {
                row: 0,
                text: prelude.trim().to_string(),
            });
        }

        let mut flows = Vec::with_capacity(starts.len());
        for (i, &(_, body_start)) in starts.iter().enumerate() {
            let body_end = starts.get(i + 1).map_or(table.len(), |&(next, _)| next);
            flows.push(self.parse_flow(i + 1, &table[body_start..body_end])?);
        }
        Ok(flows)
    }

    /// Parses one row body: source line plus destination line
    fn parse_flow(&self, row: usize, body: &str) -> ParseResult<FlowRecord> {
        let malformed = || ParseError::MalformedRow {
            row,
            text: body.trim_end().to_string(),
        };
        let caps = self.grammar.flow_row().captures(body).ok_or_else(malformed)?;

        Ok(FlowRecord {
            source: group(&caps, 1).ok_or_else(malformed)?.to_string(),
            sent: rates(&caps, 2)?,
            sent_cumulative: magnitude(&caps, 5, UnitKind::Bytes)?,
            destination: group(&caps, 6).ok_or_else(malformed)?.to_string(),
            received: rates(&caps, 7)?,
            received_cumulative: magnitude(&caps, 10, UnitKind::Bytes)?,
        })
    }

    /// Parses the send/receive/combined rate summary
    fn parse_rates(
        &self,
        section: &str,
    ) -> ParseResult<(IntervalRates, IntervalRates, IntervalRates)> {
        let caps = self
            .grammar
            .rate_summary()
            .captures(section)
            .ok_or(ParseError::MalformedSummary("rate"))?;
        Ok((rates(&caps, 1)?, rates(&caps, 4)?, rates(&caps, 7)?))
    }

    /// Parses the peak rate and cumulative summary
    fn parse_peaks(&self, section: &str) -> ParseResult<(Totals, Totals)> {
        let caps = self
            .grammar
            .peak_summary()
            .captures(section)
            .ok_or(ParseError::MalformedSummary("peak/cumulative"))?;

        let peak = Totals::new(
            magnitude(&caps, 1, UnitKind::Bits)?,
            magnitude(&caps, 2, UnitKind::Bits)?,
            magnitude(&caps, 3, UnitKind::Bits)?,
        );
        let cumulative = Totals::new(
            magnitude(&caps, 4, UnitKind::Bytes)?,
            magnitude(&caps, 5, UnitKind::Bytes)?,
            magnitude(&caps, 6, UnitKind::Bytes)?,
        );
        Ok((peak, cumulative))
    }
}

fn group<'t>(caps: &Captures<'t>, index: usize) -> Option<&'t str> {
    caps.get(index).map(|m| m.as_str())
}

/// Normalizes capture group `index`, which must be expressed in `kind`
fn magnitude(caps: &Captures<'_>, index: usize, kind: UnitKind) -> ParseResult<u64> {
    let text = group(caps, index).ok_or(UnitError::Empty)?;
    Ok(Quantity::parse_as(text, kind)?)
}

/// Reads three consecutive rate groups starting at `first`
fn rates(caps: &Captures<'_>, first: usize) -> ParseResult<IntervalRates> {
    Ok(IntervalRates::new(
        magnitude(caps, first, UnitKind::Bits)?,
        magnitude(caps, first + 1, UnitKind::Bits)?,
        magnitude(caps, first + 2, UnitKind::Bits)?,
    ))
}
