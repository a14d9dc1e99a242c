// SPDX-License-Identifier: GPL-3.0-only

//! Pass controller
//!
//! Runs one analysis pass per incoming frame: checks the failure throttle,
//! separates the frame into channel images, submits each image to the
//! decoder as its own task and folds the results into the shared decode
//! session. Callers observe progress through [`ScanEvent`]s and may await a
//! [`PassHandle`] for the pass's own outcome.
//!
//! A pass completes at its first channel failure or when its last decode
//! attempt finishes, whichever comes first. Completion releases the frame
//! and emits `PassCompleted`, each exactly once per pass.

use crate::backends::camera::FrameLease;
use crate::config::ScannerConfig;
use crate::errors::AppError;
use crate::frame_processor::decoder::{BarcodeDecoder, DecodeResult};
use crate::frame_processor::separator::ChannelSeparator;
use crate::frame_processor::session::{DecodeSession, Recorded};
use crate::frame_processor::throttle::Throttle;
use crate::frame_processor::types::{Channel, MonochromeImage, PassOutcome, ScanEvent};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

/// Lock a mutex, recovering the data if a panicking task poisoned it
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        warn!("Recovering poisoned lock");
        poisoned.into_inner()
    })
}

/// State shared by every pass of one controller
struct Shared {
    session: Mutex<DecodeSession>,
    throttle: Mutex<Throttle>,
}

/// Book-keeping for one in-flight pass
struct PassState {
    id: u64,
    lease: FrameLease,
    outstanding: AtomicUsize,
    had_failure: AtomicBool,
    completed: AtomicBool,
    output: Mutex<Option<String>>,
    events: UnboundedSender<ScanEvent>,
}

impl PassState {
    /// Release the frame and announce completion, once
    fn finish(&self) {
        if self.completed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.lease.release();
        let had_failure = self.had_failure.load(Ordering::Acquire);
        debug!(pass = self.id, had_failure, "Pass completed");
        let _ = self.events.send(ScanEvent::PassCompleted { had_failure });
    }
}

/// Counts a channel attempt as finished when dropped, even on panic
struct AttemptGuard(Arc<PassState>);

impl Drop for AttemptGuard {
    fn drop(&mut self) {
        if self.0.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.finish();
        }
    }
}

/// Handle to a submitted pass
pub struct PassHandle {
    pass: Option<Arc<PassState>>,
    tasks: Vec<JoinHandle<()>>,
}

impl PassHandle {
    fn throttled() -> Self {
        Self {
            pass: None,
            tasks: Vec::new(),
        }
    }

    /// Whether the pass was skipped by the failure throttle
    pub fn is_throttled(&self) -> bool {
        self.pass.is_none()
    }

    /// Wait for every channel attempt of this pass
    pub async fn join(self) -> PassOutcome {
        let Some(pass) = self.pass else {
            return PassOutcome::Throttled;
        };

        for result in futures::future::join_all(self.tasks).await {
            if let Err(e) = result {
                warn!(pass = pass.id, error = %e, "Channel task failed");
            }
        }

        pass.finish();
        PassOutcome::Completed {
            output: lock(&pass.output).take(),
            had_failure: pass.had_failure.load(Ordering::Acquire),
        }
    }
}

/// Drives decode passes against one shared session
pub struct PassController {
    decoder: Arc<dyn BarcodeDecoder>,
    separator: ChannelSeparator,
    shared: Arc<Shared>,
    events: UnboundedSender<ScanEvent>,
    next_pass: AtomicU64,
}

impl PassController {
    /// Create a controller and the receiving end of its event stream
    pub fn new(
        decoder: impl BarcodeDecoder,
        config: &ScannerConfig,
    ) -> (Self, UnboundedReceiver<ScanEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let controller = Self {
            decoder: Arc::new(decoder),
            separator: ChannelSeparator::from_config(config),
            shared: Arc::new(Shared {
                session: Mutex::new(DecodeSession::new()),
                throttle: Mutex::new(Throttle::new(config.throttle_window())),
            }),
            events,
            next_pass: AtomicU64::new(0),
        };
        (controller, receiver)
    }

    /// Fill state of the live session, in channel order
    pub fn filled(&self) -> [bool; 3] {
        lock(&self.shared.session).filled()
    }

    /// Generation of the live session
    pub fn generation(&self) -> u64 {
        lock(&self.shared.session).generation()
    }

    /// Abandon the partially decoded payload and start over
    pub fn reset_session(&self) {
        lock(&self.shared.session).reset();
        info!("Decode session abandoned");
    }

    /// Submit a frame for one pass without waiting for the decoder
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, lease: FrameLease) -> PassHandle {
        let id = self.next_pass.fetch_add(1, Ordering::Relaxed);

        {
            let mut throttle = lock(&self.shared.throttle);
            if throttle.should_skip(Instant::now()) {
                debug!(pass = id, "Throttling pass after recent failure");
                lease.release();
                return PassHandle::throttled();
            }
            throttle.begin_pass();
        }

        let (filled, generation) = {
            let session = lock(&self.shared.session);
            (session.filled(), session.generation())
        };

        let frame = Arc::clone(lease.frame());
        let images: Vec<MonochromeImage> =
            if self.separator.region_for(frame.width, frame.height).is_empty() {
                debug!(pass = id, width = frame.width, height = frame.height, "Degenerate frame");
                Vec::new()
            } else {
                self.separator
                    .separate(&frame, filled)
                    .into_iter()
                    .flatten()
                    .collect()
            };

        let pass = Arc::new(PassState {
            id,
            lease,
            outstanding: AtomicUsize::new(images.len()),
            had_failure: AtomicBool::new(false),
            completed: AtomicBool::new(false),
            output: Mutex::new(None),
            events: self.events.clone(),
        });

        if images.is_empty() {
            pass.finish();
            return PassHandle {
                pass: Some(pass),
                tasks: Vec::new(),
            };
        }

        trace!(pass = id, generation, channels = images.len(), "Submitting channel images");

        let tasks = images
            .into_iter()
            .map(|image| {
                let channel = image.channel;
                let attempt = self.decoder.decode(image);
                let shared = Arc::clone(&self.shared);
                let guard = AttemptGuard(Arc::clone(&pass));
                tokio::spawn(async move {
                    let result = attempt.await;
                    handle_result(&shared, &guard.0, channel, generation, result);
                    drop(guard);
                })
            })
            .collect();

        PassHandle {
            pass: Some(pass),
            tasks,
        }
    }

    /// Run one pass to completion
    pub async fn run_pass(&self, lease: FrameLease) -> PassOutcome {
        self.submit(lease).join().await
    }
}

/// Fold one channel's decode result into the session and throttle
fn handle_result(
    shared: &Shared,
    pass: &PassState,
    channel: Channel,
    generation: u64,
    result: DecodeResult,
) {
    match result {
        Ok(candidates) => {
            let Some(first) = candidates.into_iter().next() else {
                trace!(pass = pass.id, %channel, "No symbols found");
                return;
            };
            let text = first.raw_value.unwrap_or_default();

            let completed = {
                let mut session = lock(&shared.session);
                match session.record_for(generation, channel, &text) {
                    Recorded::Stored => session.take_completed(),
                    Recorded::Empty | Recorded::AlreadyFilled | Recorded::Stale => None,
                }
            };

            match completed {
                Some(Ok(payload)) => {
                    info!(pass = pass.id, len = payload.chars().count(), "Payload reconstructed");
                    *lock(&pass.output) = Some(payload.clone());
                    let _ = pass.events.send(ScanEvent::Decoded(payload));
                }
                Some(Err(error)) => {
                    warn!(pass = pass.id, error = %error, "Discarding unmergeable session");
                    let _ = pass.events.send(ScanEvent::Failed {
                        channel: None,
                        error: error.into(),
                    });
                }
                None => {}
            }
        }
        Err(error) => {
            lock(&shared.throttle).record_failure(Instant::now());
            pass.had_failure.store(true, Ordering::Release);
            warn!(pass = pass.id, %channel, error = %error, "Channel decode failed");
            let _ = pass.events.send(ScanEvent::Failed {
                channel: Some(channel),
                error: AppError::from(error),
            });
            pass.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::CameraFrame;
    use crate::frame_processor::types::DecodedCandidate;
    use futures::FutureExt;
    use futures::future::BoxFuture;
    use std::collections::HashMap;

    /// Decoder answering from a fixed per-channel table
    struct TableDecoder {
        answers: HashMap<Channel, DecodeResult>,
        calls: Arc<AtomicUsize>,
    }

    impl BarcodeDecoder for TableDecoder {
        fn decode(&self, image: MonochromeImage) -> BoxFuture<'static, DecodeResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let answer = self
                .answers
                .get(&image.channel)
                .cloned()
                .unwrap_or(Ok(Vec::new()));
            async move { answer }.boxed()
        }
    }

    fn table(answers: &[(Channel, DecodeResult)]) -> (TableDecoder, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let decoder = TableDecoder {
            answers: answers.iter().cloned().collect(),
            calls: Arc::clone(&calls),
        };
        (decoder, calls)
    }

    fn lease(width: u32, height: u32) -> FrameLease {
        let data = vec![128u8; (width * height * 4) as usize];
        FrameLease::detached(CameraFrame::from_rgba(width, height, data).unwrap())
    }

    #[tokio::test]
    async fn test_single_pass_reconstructs() {
        let (decoder, calls) = table(&[
            (Channel::Red, Ok(vec![DecodedCandidate::qr("AB")])),
            (Channel::Green, Ok(vec![DecodedCandidate::qr("CD")])),
            (Channel::Blue, Ok(vec![DecodedCandidate::qr("EF")])),
        ]);
        let (controller, mut events) = PassController::new(decoder, &ScannerConfig::default());

        let outcome = controller.run_pass(lease(8, 8)).await;
        assert_eq!(
            outcome,
            PassOutcome::Completed {
                output: Some("ECAFDB".to_string()),
                had_failure: false
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(controller.filled(), [false; 3]);
        assert_eq!(controller.generation(), 1);

        let mut decoded = 0;
        let mut completed = 0;
        while let Ok(event) = events.try_recv() {
            match event {
                ScanEvent::Decoded(text) => {
                    assert_eq!(text, "ECAFDB");
                    decoded += 1;
                }
                ScanEvent::PassCompleted { had_failure } => {
                    assert!(!had_failure);
                    completed += 1;
                }
                ScanEvent::Failed { .. } => panic!("unexpected failure"),
            }
        }
        assert_eq!((decoded, completed), (1, 1));
    }

    #[tokio::test]
    async fn test_filled_channels_not_resubmitted() {
        let (decoder, calls) = table(&[(Channel::Green, Ok(vec![DecodedCandidate::qr("g")]))]);
        let (controller, _events) = PassController::new(decoder, &ScannerConfig::default());

        controller.run_pass(lease(8, 8)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(controller.filled(), [false, true, false]);

        controller.run_pass(lease(8, 8)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_candidate_without_text_leaves_slot_empty() {
        let candidate = DecodedCandidate {
            raw_value: None,
            format: crate::frame_processor::types::SymbolFormat::QrCode,
        };
        let (decoder, _calls) = table(&[(Channel::Red, Ok(vec![candidate]))]);
        let (controller, _events) = PassController::new(decoder, &ScannerConfig::default());

        controller.run_pass(lease(8, 8)).await;
        assert_eq!(controller.filled(), [false; 3]);
    }

    #[tokio::test]
    async fn test_degenerate_frame_is_noop() {
        let (decoder, calls) = table(&[]);
        let (controller, mut events) = PassController::new(decoder, &ScannerConfig::default());

        let frame = CameraFrame::from_rgba(0, 0, Vec::new()).unwrap();
        let outcome = controller.run_pass(FrameLease::detached(frame)).await;

        assert_eq!(
            outcome,
            PassOutcome::Completed {
                output: None,
                had_failure: false
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(matches!(
            events.try_recv(),
            Ok(ScanEvent::PassCompleted { had_failure: false })
        ));
    }

    #[tokio::test]
    async fn test_length_mismatch_resets_session() {
        let (decoder, _calls) = table(&[
            (Channel::Red, Ok(vec![DecodedCandidate::qr("AB")])),
            (Channel::Green, Ok(vec![DecodedCandidate::qr("C")])),
            (Channel::Blue, Ok(vec![DecodedCandidate::qr("EF")])),
        ]);
        let (controller, mut events) = PassController::new(decoder, &ScannerConfig::default());

        let outcome = controller.run_pass(lease(8, 8)).await;
        assert_eq!(outcome.output(), None);
        assert_eq!(controller.filled(), [false; 3]);

        let mut saw_mismatch = false;
        while let Ok(event) = events.try_recv() {
            if let ScanEvent::Failed {
                channel: None,
                error: AppError::Session(_),
            } = event
            {
                saw_mismatch = true;
            }
        }
        assert!(saw_mismatch);
    }
}
