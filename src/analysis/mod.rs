//! Buffer analysis runs
//!
//! [`Analyzer`] drives one run through its phases: build the buffer, fetch the
//! coverage clipped to its extent, decode it and aggregate the pixels inside
//! the ring. [`AnalysisSession`] sits in front of it for interactive callers
//! that fire new requests before earlier ones finish; only the latest
//! submission ever reaches the observer.

mod error;
mod fetch;
mod orchestrator;
mod session;

pub use error::AnalysisError;
pub use fetch::{CoverageFetcher, HttpCoverageFetcher};
pub use orchestrator::{AnalysisPhase, AnalysisReport, Analyzer, NoopListener, RunListener};
pub use session::{AnalysisObserver, AnalysisSession};
