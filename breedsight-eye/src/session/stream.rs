//! Stream mode: continuous recognition over camera frames

use super::{validate_vision_config, RecognitionPipeline};
use crate::camera::FrameSource;
use crate::config::VisionConfig;
use crate::display::{DisplayUpdate, PresentationSink};
use crate::error::VisionError;
use crate::models::Classifier;
use breedsight_core::{SelectionResult, SelectorConfig};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const STOP_GRACE_PERIOD: Duration = Duration::from_secs(1);

/// Result of a single stream cycle
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// A selection was presented
    Presented(SelectionResult),
    /// The classifier returned nothing; the fallback was presented
    NoResults,
    /// The camera had no frame yet
    NoFrame,
    /// Another inference was still in flight
    Busy,
    /// Frame capture or inference failed; the cycle was abandoned
    Failed(String),
}

/// Counters for a stream session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreamStats {
    pub processed: u64,
    pub skipped: u64,
    pub busy: u64,
    pub failed: u64,
}

#[derive(Default)]
struct StreamCounters {
    processed: AtomicU64,
    skipped: AtomicU64,
    busy: AtomicU64,
    failed: AtomicU64,
}

/// Token held for the duration of one inference. Only one can exist per session.
struct InFlight<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Clears the running flag when a loop task ends, including by panic or abort.
///
/// A stale guard from a previous run leaves a newer run's flag alone.
struct RunningGuard {
    is_running: Arc<RwLock<bool>>,
    generation: Arc<AtomicU64>,
    run: u64,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        let mut is_running = self.is_running.write();
        if self.generation.load(Ordering::Acquire) == self.run {
            *is_running = false;
        }
    }
}

/// State shared between the session handle and its loop task
#[derive(Clone)]
struct StreamWorker {
    id: Uuid,
    pipeline: Arc<RecognitionPipeline>,
    in_flight: Arc<AtomicBool>,
    is_running: Arc<RwLock<bool>>,
    /// Bumped on every start
    generation: Arc<AtomicU64>,
    counters: Arc<StreamCounters>,
    idle_interval: Duration,
}

impl StreamWorker {
    async fn run_cycle(&self, source: &dyn FrameSource) -> CycleOutcome {
        let Some(_token) = InFlight::acquire(&self.in_flight) else {
            self.counters.busy.fetch_add(1, Ordering::Relaxed);
            return CycleOutcome::Busy;
        };

        let frame = match source.current_frame().await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                self.counters.skipped.fetch_add(1, Ordering::Relaxed);
                return CycleOutcome::NoFrame;
            }
            Err(e) => {
                warn!(session = %self.id, "Frame capture failed: {}", e);
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                return CycleOutcome::Failed(e.to_string());
            }
        };

        match self.pipeline.recognize(&frame).await {
            Ok(selection) => {
                self.pipeline.present(DisplayUpdate::from_selection(
                    &selection,
                    self.pipeline.selector_config(),
                ));
                self.counters.processed.fetch_add(1, Ordering::Relaxed);
                CycleOutcome::Presented(selection)
            }
            Err(e) if e.is_no_results() => {
                debug!(session = %self.id, "No results for frame");
                self.pipeline
                    .present(DisplayUpdate::no_results(self.pipeline.selector_config()));
                self.counters.processed.fetch_add(1, Ordering::Relaxed);
                CycleOutcome::NoResults
            }
            Err(e) => {
                error!(session = %self.id, "Frame recognition failed: {}", e);
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                CycleOutcome::Failed(e.to_string())
            }
        }
    }

    async fn run(self, source: Arc<dyn FrameSource>, run: u64) {
        let _guard = RunningGuard {
            is_running: self.is_running.clone(),
            generation: self.generation.clone(),
            run,
        };
        info!(session = %self.id, "Stream recognition started");

        while *self.is_running.read() {
            match self.run_cycle(source.as_ref()).await {
                CycleOutcome::Presented(_) | CycleOutcome::NoResults => {
                    tokio::task::yield_now().await;
                }
                CycleOutcome::NoFrame | CycleOutcome::Busy | CycleOutcome::Failed(_) => {
                    tokio::time::sleep(self.idle_interval).await;
                }
            }
        }

        info!(session = %self.id, "Stream recognition stopped");
    }
}

/// Continuously recognizes the camera's current frame with at most one
/// inference in flight.
///
/// The loop task lives between [`StreamSession::start`] and
/// [`StreamSession::stop`]; dropping the session aborts it.
pub struct StreamSession {
    worker: StreamWorker,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl StreamSession {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        selector_config: SelectorConfig,
        sink: Arc<dyn PresentationSink>,
        vision_config: &VisionConfig,
    ) -> Result<Self, VisionError> {
        validate_vision_config(vision_config)?;
        let pipeline = RecognitionPipeline::new(classifier, selector_config, sink)?;

        Ok(Self {
            worker: StreamWorker {
                id: Uuid::new_v4(),
                pipeline: Arc::new(pipeline),
                in_flight: Arc::new(AtomicBool::new(false)),
                is_running: Arc::new(RwLock::new(false)),
                generation: Arc::new(AtomicU64::new(0)),
                counters: Arc::new(StreamCounters::default()),
                idle_interval: vision_config.idle_interval(),
            },
            handle: Mutex::new(None),
        })
    }

    pub fn id(&self) -> Uuid {
        self.worker.id
    }

    /// Spawn the recognition loop. Must be called from within a tokio runtime.
    ///
    /// A loop that ended on its own (for example a panicking classifier)
    /// no longer counts as running, so the session can be started again.
    pub fn start(&self, source: Arc<dyn FrameSource>) -> Result<(), VisionError> {
        let run = {
            let mut is_running = self.worker.is_running.write();
            if *is_running {
                return Err(VisionError::Session("Stream session already running".to_string()));
            }
            *is_running = true;
            self.worker.generation.fetch_add(1, Ordering::AcqRel) + 1
        };

        let worker = self.worker.clone();
        let handle = tokio::spawn(worker.run(source, run));
        *self.handle.lock() = Some(handle);
        Ok(())
    }

    /// Run a single cycle against `source`.
    ///
    /// Returns [`CycleOutcome::Busy`] without touching the source if an
    /// inference is already in flight for this session.
    pub async fn process_once(&self, source: &dyn FrameSource) -> CycleOutcome {
        self.worker.run_cycle(source).await
    }

    /// Stop the loop, giving an in-flight cycle a short grace period to finish
    pub async fn stop(&self) {
        {
            let mut is_running = self.worker.is_running.write();
            if !*is_running {
                return;
            }
            *is_running = false;
        }

        let handle = self.handle.lock().take();
        if let Some(mut handle) = handle {
            if tokio::time::timeout(STOP_GRACE_PERIOD, &mut handle).await.is_err() {
                warn!(session = %self.worker.id, "Stream loop did not stop in time, aborting");
                handle.abort();
            }
        }
    }

    pub fn is_running(&self) -> bool {
        *self.worker.is_running.read()
    }

    pub fn stats(&self) -> StreamStats {
        let counters = &self.worker.counters;
        StreamStats {
            processed: counters.processed.load(Ordering::Relaxed),
            skipped: counters.skipped.load(Ordering::Relaxed),
            busy: counters.busy.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
        }
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        *self.worker.is_running.write() = false;
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_flight_token_is_exclusive() {
        let flag = AtomicBool::new(false);
        let first = InFlight::acquire(&flag);
        assert!(first.is_some());
        assert!(InFlight::acquire(&flag).is_none());

        drop(first);
        assert!(!flag.load(Ordering::Acquire));
        assert!(InFlight::acquire(&flag).is_some());
    }
}
