//! Turning iftop text output into snapshots
//!
//! The stages are independent of the process that produces the text:
//! - [`grammar`]: markers and patterns of the `iftop -t` report layout
//! - [`framing`]: cutting complete reports out of arbitrarily split chunks
//! - [`parser`]: parsing one report into a [`Snapshot`]
//! - [`pipeline`]: the three combined, plus device error detection

pub mod framing;
pub mod grammar;
pub mod parser;
pub mod pipeline;
pub mod snapshot;

pub use framing::FrameBuffer;
pub use grammar::{
    DEVICE_NOT_FOUND_MARKER, FRAME_SEPARATOR, Grammar, GrammarError, GrammarSpec, HEADER_MARKER,
};
pub use parser::{EntryParser, ParseError, ParseResult};
pub use pipeline::{PipelineOutput, StreamPipeline};
pub use snapshot::{FlowRecord, IntervalRates, Snapshot, Totals};
