//! Latest-wins session over an [`Analyzer`]
//!
//! Every submission and every clear takes the next sequence number. Runs
//! report through a single channel to one consumer task, which forwards an
//! event to the observer only while its sequence number is still the latest.
//! A run that was superseded keeps going in the background but nothing it
//! produces is displayed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use crate::geometry::{BufferPolygon, GeoPoint};
use super::{AnalysisError, AnalysisPhase, AnalysisReport, Analyzer, RunListener};

/// Display side of a session, e.g. a map view
///
/// All calls come from the session's consumer task, one at a time.
pub trait AnalysisObserver: Send + Sync + 'static {
    /// A run started while nothing was running
    fn busy(&self);
    /// The displayed run finished or was cleared
    fn idle(&self);
    /// Remove the displayed buffer and result
    fn clear(&self);
    fn phase(&self, _phase: AnalysisPhase) {}
    fn show_buffer(&self, polygon: &BufferPolygon);
    fn show_result(&self, result: &Result<AnalysisReport, AnalysisError>);
}

#[derive(Debug)]
enum SessionEvent {
    Started { seq: u64 },
    Phase { seq: u64, phase: AnalysisPhase },
    Buffer { seq: u64, polygon: BufferPolygon },
    Finished { seq: u64, result: Result<AnalysisReport, AnalysisError> },
    Cleared { seq: u64 },
}

impl SessionEvent {
    fn seq(&self) -> u64 {
        match self {
            SessionEvent::Started { seq }
            | SessionEvent::Phase { seq, .. }
            | SessionEvent::Buffer { seq, .. }
            | SessionEvent::Finished { seq, .. }
            | SessionEvent::Cleared { seq } => *seq,
        }
    }
}

/// Forwards one run's progress into the session channel
struct ChannelListener {
    seq: u64,
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl RunListener for ChannelListener {
    fn phase(&self, phase: AnalysisPhase) {
        let _ = self.tx.send(SessionEvent::Phase { seq: self.seq, phase });
    }

    fn buffer_ready(&self, polygon: &BufferPolygon) {
        let _ = self.tx.send(SessionEvent::Buffer {
            seq: self.seq,
            polygon: polygon.clone(),
        });
    }
}

/// Interactive analysis front: at most one buffer and one result visible
///
/// Must be created inside a tokio runtime.
pub struct AnalysisSession {
    analyzer: Arc<Analyzer>,
    latest: Arc<AtomicU64>,
    tx: mpsc::UnboundedSender<SessionEvent>,
    consumer: JoinHandle<()>,
}

impl AnalysisSession {
    pub fn new(analyzer: Arc<Analyzer>, observer: Arc<dyn AnalysisObserver>) -> Self {
        let latest = Arc::new(AtomicU64::new(0));
        let (tx, rx) = mpsc::unbounded_channel();
        let consumer = tokio::spawn(consume(rx, Arc::clone(&latest), observer));

        Self { analyzer, latest, tx, consumer }
    }

    /// Starts a run that supersedes every earlier one; returns its sequence number
    pub fn submit(&self, center: GeoPoint, radius_m: f64) -> u64 {
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        info!(seq, lon = center.lon, lat = center.lat, radius = radius_m, "analysis submitted");
        let _ = self.tx.send(SessionEvent::Started { seq });

        let analyzer = Arc::clone(&self.analyzer);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let listener = ChannelListener { seq, tx: tx.clone() };
            let run = tokio::spawn(async move { analyzer.analyze(center, radius_m, &listener).await });

            let result = match run.await {
                Ok(result) => result,
                Err(e) => Err(AnalysisError::Decode(format!("analysis task failed: {}", e))),
            };
            let _ = tx.send(SessionEvent::Finished { seq, result });
        });

        seq
    }

    /// Closes the displayed result and invalidates any run in flight
    pub fn clear(&self) -> u64 {
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.tx.send(SessionEvent::Cleared { seq });
        seq
    }

    /// Sequence number of the most recent submit or clear
    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Waits until every run has finished and its events were delivered or discarded
    pub async fn shutdown(self) {
        let Self { tx, consumer, .. } = self;
        drop(tx);
        let _ = consumer.await;
    }
}

async fn consume(
    mut rx: mpsc::UnboundedReceiver<SessionEvent>,
    latest: Arc<AtomicU64>,
    observer: Arc<dyn AnalysisObserver>,
) {
    let mut busy = false;

    while let Some(event) = rx.recv().await {
        let seq = event.seq();
        if seq != latest.load(Ordering::SeqCst) {
            if matches!(event, SessionEvent::Finished { .. }) {
                debug!(seq, "discarding superseded result");
            }
            continue;
        }

        match event {
            SessionEvent::Started { .. } => {
                observer.clear();
                if !busy {
                    busy = true;
                    observer.busy();
                }
            }
            SessionEvent::Phase { phase, .. } => observer.phase(phase),
            SessionEvent::Buffer { polygon, .. } => observer.show_buffer(&polygon),
            SessionEvent::Finished { result, .. } => {
                observer.show_result(&result);
                if busy {
                    busy = false;
                    observer.idle();
                }
            }
            SessionEvent::Cleared { .. } => {
                observer.clear();
                if busy {
                    busy = false;
                    observer.idle();
                }
            }
        }
    }
}
