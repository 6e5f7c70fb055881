//! # Session Module
//!
//! A live session couples three cursors that must move in lockstep: the
//! captured block stream, the reference frame cursor and the lyric cursor.
//! [`LiveSession`] owns all per-session state and is driven one block at a
//! time from the capture callback. [`SessionController`] owns the
//! lifecycle:
//!
//! ```text
//! Idle --arm--> Armed --start--> Running --stop--> Finalizing --> Idle
//! ```
//!
//! ## Threading
//! The capture callback is the only writer of session state while running.
//! The control context touches the state again only after capture has been
//! paused and the running gate closed, so the shared mutex is never
//! contended in steady state. Per-frame reports leave the callback through a
//! bounded channel with `try_send`; a full queue drops reports, never
//! blocks.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};

use crate::audio::{ActiveStream, AudioBackend, MonoAudio, PlaybackTrack, StreamFormat};
use crate::capture::LiveCapturePipeline;
use crate::error::{Result, ScoreError};
use crate::lyrics::LyricTimeline;
use crate::pitch::{LiveFrame, PitchEstimator, YinEstimator};
use crate::reference::{AnalysisConfig, ReferenceAnalyzer, ReferenceTrack};
use crate::scoring::{FrameOutcome, ScoringConfig, ScoringEngine};
use crate::sync::{FrameSynchronizer, ReferenceFrame};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Idle,
    Armed,
    Running,
    Finalizing,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Armed => "armed",
            SessionPhase::Running => "running",
            SessionPhase::Finalizing => "finalizing",
        };
        f.write_str(name)
    }
}

/// Mutable per-session state. Created fresh for every session.
#[derive(Debug, Clone)]
pub struct SessionState {
    synchronizer: FrameSynchronizer,
    scoring: ScoringEngine,
    current_lyric_index: usize,
}

impl SessionState {
    pub fn new(reference: Arc<ReferenceTrack>, scoring: ScoringConfig) -> Self {
        // One entry per reference frame plus the trailing zero.
        let capacity = reference.len() + 1;
        Self {
            synchronizer: FrameSynchronizer::new(reference),
            scoring: ScoringEngine::with_capacity(scoring, capacity),
            current_lyric_index: 0,
        }
    }

    pub fn current_frame_index(&self) -> usize {
        self.synchronizer.current_frame_index()
    }

    pub fn current_lyric_index(&self) -> usize {
        self.current_lyric_index
    }

    pub fn score_history(&self) -> &[f32] {
        self.scoring.score_history()
    }

    pub fn previous_accuracy(&self) -> Option<f32> {
        self.scoring.previous_accuracy()
    }

    pub fn synchronizer(&self) -> &FrameSynchronizer {
        &self.synchronizer
    }

    pub fn scoring(&self) -> &ScoringEngine {
        &self.scoring
    }
}

/// Everything the display needs about one processed frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameReport {
    pub frame_index: usize,
    /// Session time at the start of the frame.
    pub time_secs: f64,
    pub live: LiveFrame,
    pub reference: ReferenceFrame,
    pub outcome: FrameOutcome,
    /// Index of the active lyric segment, if any.
    pub lyric_index: Option<usize>,
}

/// Aggregate result of a finished session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    /// Mean of the score history; 0 when nothing was usable.
    pub final_score: f32,
    pub score_history: Vec<f32>,
    pub frames_processed: usize,
    pub usable_frames: u64,
    pub reference_frames: usize,
    pub frames_past_reference_end: usize,
    /// Backing samples played minus samples captured, when playback ran.
    /// Positive means playback ran ahead of capture.
    pub playback_offset_samples: Option<i64>,
}

/// The per-block scoring loop.
pub struct LiveSession<E: PitchEstimator> {
    pipeline: LiveCapturePipeline<E>,
    state: SessionState,
    lyrics: Arc<LyricTimeline>,
    reports: Option<Sender<FrameReport>>,
}

impl<E: PitchEstimator> LiveSession<E> {
    pub fn new(
        pipeline: LiveCapturePipeline<E>,
        reference: Arc<ReferenceTrack>,
        lyrics: Arc<LyricTimeline>,
        scoring: ScoringConfig,
    ) -> Result<Self> {
        scoring.validate()?;
        if pipeline.hop_size() != reference.hop_size() {
            return Err(ScoreError::InvalidReference {
                message: format!(
                    "reference hop {} does not match capture hop {}",
                    reference.hop_size(),
                    pipeline.hop_size()
                ),
            });
        }
        Ok(Self {
            pipeline,
            state: SessionState::new(reference, scoring),
            lyrics,
            reports: None,
        })
    }

    /// Publishes a [`FrameReport`] for every processed block.
    pub fn with_reports(mut self, reports: Sender<FrameReport>) -> Self {
        self.reports = Some(reports);
        self
    }

    /// Processes one captured block: estimate, align, score, update lyrics.
    ///
    /// Safe to call from a real-time callback. No allocation happens here
    /// once the history has reached its reserved capacity.
    pub fn process_block(&mut self, interleaved: &[f32]) -> FrameReport {
        let live = self.pipeline.process_block(interleaved);
        let reference = self.state.synchronizer.advance();
        let outcome = self.state.scoring.record(live, reference.pitch_hz);

        let frame_secs = self.state.synchronizer.reference().frame_duration_secs();
        let time_secs = reference.index as f64 * frame_secs;
        // Lyrics follow the audio captured so far, i.e. the end of this frame.
        let lyric_index = self
            .lyrics
            .advance(
                &mut self.state.current_lyric_index,
                self.state.synchronizer.elapsed_secs(),
            )
            .map(|_| self.state.current_lyric_index);

        let report = FrameReport {
            frame_index: reference.index,
            time_secs,
            live,
            reference,
            outcome,
            lyric_index,
        };
        if let Some(reports) = &self.reports {
            let _ = reports.try_send(report);
        }
        report
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn lyrics(&self) -> &LyricTimeline {
        &self.lyrics
    }

    pub fn hop_size(&self) -> usize {
        self.pipeline.hop_size()
    }

    /// Snapshot of the aggregate result so far.
    pub fn summary(&self) -> SessionSummary {
        let sync = &self.state.synchronizer;
        SessionSummary {
            final_score: self.state.scoring.final_score(),
            score_history: self.state.scoring.score_history().to_vec(),
            frames_processed: sync.current_frame_index(),
            usable_frames: self.state.scoring.usable_frames(),
            reference_frames: sync.reference().len(),
            frames_past_reference_end: sync.frames_past_end(),
            playback_offset_samples: None,
        }
    }

    pub fn finish(self) -> SessionSummary {
        self.summary()
    }
}

/// Scores a recorded performance against a reference without any device.
///
/// The performance is cut into hop-sized blocks exactly as live capture
/// would deliver them. It is resampled first if its rate differs from the
/// reference.
pub fn score_performance(
    reference: Arc<ReferenceTrack>,
    lyrics: Arc<LyricTimeline>,
    performance: &MonoAudio,
    config: &SessionConfig,
    mut on_frame: impl FnMut(&FrameReport),
) -> Result<SessionSummary> {
    let performance = performance.resampled_to(reference.sample_rate());
    let estimator = YinEstimator::new(config.analysis.yin_config(reference.sample_rate()))?;
    let pipeline = LiveCapturePipeline::new(estimator, reference.hop_size(), 1)?;
    let mut session = LiveSession::new(pipeline, reference, lyrics, config.scoring)?;

    for block in performance.samples.chunks(session.hop_size()) {
        let report = session.process_block(block);
        on_frame(&report);
    }
    Ok(session.finish())
}

/// Settings for a controlled live session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub analysis: AnalysisConfig,
    pub scoring: ScoringConfig,
    /// Capture rate asked of the input device.
    pub preferred_sample_rate: u32,
    /// Capacity of the frame report queue.
    pub report_queue: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            scoring: ScoringConfig::default(),
            preferred_sample_rate: 44100,
            report_queue: 1024,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        self.analysis.validate()?;
        self.scoring.validate()?;
        if self.preferred_sample_rate == 0 {
            return Err(ScoreError::InvalidConfig {
                message: "preferred sample rate must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Streams and shared state of an armed or running session.
struct ActiveSession {
    session: Arc<Mutex<LiveSession<YinEstimator>>>,
    running: Arc<AtomicBool>,
    /// Frames processed, published by the capture handler after each block.
    frames: Arc<AtomicUsize>,
    capture: Box<dyn ActiveStream>,
    playback: Box<dyn ActiveStream>,
    track: PlaybackTrack,
    format: StreamFormat,
    hop_size: usize,
}

/// Drives the session lifecycle against an [`AudioBackend`].
pub struct SessionController<B: AudioBackend> {
    backend: B,
    config: SessionConfig,
    phase: SessionPhase,
    active: Option<ActiveSession>,
    report_tx: Sender<FrameReport>,
    report_rx: Receiver<FrameReport>,
}

impl<B: AudioBackend> SessionController<B> {
    pub fn new(backend: B, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let (report_tx, report_rx) = crossbeam_channel::bounded(config.report_queue.max(1));
        Ok(Self {
            backend,
            config,
            phase: SessionPhase::Idle,
            active: None,
            report_tx,
            report_rx,
        })
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Receiving end of the per-frame report queue.
    pub fn reports(&self) -> Receiver<FrameReport> {
        self.report_rx.clone()
    }

    /// Capture format of the armed session.
    pub fn stream_format(&self) -> Option<StreamFormat> {
        self.active.as_ref().map(|a| a.format)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Analyzes the vocal stem and prepares both streams.
    ///
    /// Both tracks are resampled to the capture rate first, so reference
    /// frames and live frames share one frame rate.
    pub fn arm(
        &mut self,
        vocals: &MonoAudio,
        backing: &MonoAudio,
        lyrics: LyricTimeline,
    ) -> Result<()> {
        self.expect_phase(SessionPhase::Idle, "arm")?;
        let format = self.backend.capture_format(self.config.preferred_sample_rate)?;

        let vocals = vocals.resampled_to(format.sample_rate);
        let analyzer = ReferenceAnalyzer::new(self.config.analysis)?;
        let reference = analyzer.analyze(&vocals.samples, vocals.sample_rate)?;
        log::info!(
            "Reference analyzed: {} frames ({:.1}s, {:.0}% voiced)",
            reference.len(),
            reference.duration_secs(),
            reference.voiced_ratio() * 100.0
        );

        self.open_streams(format, reference, backing, lyrics)
    }

    /// Prepares both streams for an already analyzed reference.
    pub fn arm_with_reference(
        &mut self,
        reference: ReferenceTrack,
        backing: &MonoAudio,
        lyrics: LyricTimeline,
    ) -> Result<()> {
        self.expect_phase(SessionPhase::Idle, "arm")?;
        let format = self.backend.capture_format(self.config.preferred_sample_rate)?;
        if reference.sample_rate() != format.sample_rate {
            return Err(ScoreError::SampleRateMismatch {
                expected: reference.sample_rate(),
                actual: format.sample_rate,
            });
        }
        self.open_streams(format, reference, backing, lyrics)
    }

    fn open_streams(
        &mut self,
        format: StreamFormat,
        reference: ReferenceTrack,
        backing: &MonoAudio,
        lyrics: LyricTimeline,
    ) -> Result<()> {
        let hop_size = reference.hop_size();
        let estimator = YinEstimator::new(self.config.analysis.yin_config(format.sample_rate))?;
        let pipeline = LiveCapturePipeline::new(estimator, hop_size, format.channels)?;
        let session = LiveSession::new(
            pipeline,
            Arc::new(reference),
            Arc::new(lyrics),
            self.config.scoring,
        )?
        .with_reports(self.report_tx.clone());

        let session = Arc::new(Mutex::new(session));
        let running = Arc::new(AtomicBool::new(false));
        let frames = Arc::new(AtomicUsize::new(0));

        let handler_session = Arc::clone(&session);
        let handler_running = Arc::clone(&running);
        let handler_frames = Arc::clone(&frames);
        let capture = self.backend.open_capture(
            format,
            hop_size,
            Box::new(move |block: &[f32]| {
                // Blocks before start or after stop are not part of the session.
                if !handler_running.load(Ordering::Acquire) {
                    return;
                }
                if let Ok(mut session) = handler_session.lock() {
                    let report = session.process_block(block);
                    handler_frames.store(report.frame_index + 1, Ordering::Release);
                }
            }),
        )?;

        let track = PlaybackTrack::new(backing.resampled_to(format.sample_rate).samples);
        let playback = self.backend.open_playback(format.sample_rate, track.clone())?;

        log::info!(
            "Session armed: {} Hz, {} channel(s), hop {} samples",
            format.sample_rate,
            format.channels,
            hop_size
        );
        self.active = Some(ActiveSession {
            session,
            running,
            frames,
            capture,
            playback,
            track,
            format,
            hop_size,
        });
        self.phase = SessionPhase::Armed;
        Ok(())
    }

    /// Starts backing playback and capture back to back.
    pub fn start(&mut self) -> Result<()> {
        match self.phase {
            SessionPhase::Armed => {}
            SessionPhase::Idle => return Err(ScoreError::ReferenceNotAnalyzed),
            phase => {
                return Err(ScoreError::InvalidTransition {
                    phase,
                    action: "start",
                });
            }
        }
        let active = self.active.as_mut().ok_or(ScoreError::ReferenceNotAnalyzed)?;

        active.running.store(true, Ordering::Release);
        let started = active.playback.play().and_then(|_| active.capture.play());
        if let Err(e) = started {
            log::error!("Failed to start session streams: {}", e);
            active.running.store(false, Ordering::Release);
            self.active = None;
            self.phase = SessionPhase::Idle;
            return Err(e);
        }

        self.phase = SessionPhase::Running;
        log::info!("Session running");
        Ok(())
    }

    /// True once the backing track has been played to the end.
    pub fn playback_finished(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.track.is_finished())
    }

    /// Frames processed so far in the current session. Never waits on the
    /// capture callback.
    pub fn frames_processed(&self) -> usize {
        self.active
            .as_ref()
            .map_or(0, |a| a.frames.load(Ordering::Acquire))
    }

    /// Stops both streams and computes the aggregate result.
    pub fn stop(&mut self) -> Result<SessionSummary> {
        self.expect_phase(SessionPhase::Running, "stop")?;
        let mut active = self.active.take().ok_or(ScoreError::ReferenceNotAnalyzed)?;
        self.phase = SessionPhase::Finalizing;

        if let Err(e) = active.capture.pause() {
            log::warn!("Failed to pause capture stream: {}", e);
        }
        active.running.store(false, Ordering::Release);
        if let Err(e) = active.playback.pause() {
            log::warn!("Failed to pause playback stream: {}", e);
        }

        // Waits for an in-flight callback to finish its block.
        let summary = active
            .session
            .lock()
            .map(|session| session.summary())
            .map_err(|_| ScoreError::Stream {
                message: "capture handler panicked".to_string(),
            });
        drop(active.capture);
        drop(active.playback);
        self.phase = SessionPhase::Idle;

        let mut summary = summary?;
        let captured = (summary.frames_processed * active.hop_size) as i64;
        let offset = active.track.position() as i64 - captured;
        summary.playback_offset_samples = Some(offset);

        if summary.frames_past_reference_end > 0 {
            log::info!(
                "Capture ran {} frames past the end of the reference",
                summary.frames_past_reference_end
            );
        }
        log::info!(
            "Session finished: {} frames, final score {:.1}, playback offset {} samples",
            summary.frames_processed,
            summary.final_score,
            offset
        );
        Ok(summary)
    }

    /// Drops an armed session without running it.
    pub fn disarm(&mut self) -> Result<()> {
        self.expect_phase(SessionPhase::Armed, "disarm")?;
        self.active = None;
        self.phase = SessionPhase::Idle;
        log::info!("Session disarmed");
        Ok(())
    }

    fn expect_phase(&self, expected: SessionPhase, action: &'static str) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(ScoreError::InvalidTransition {
                phase: self.phase,
                action,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::BlockHandler;
    use crate::lyrics::LyricSegment;

    /// Replays a fixed list of estimates, one per block.
    struct Scripted {
        frames: Vec<LiveFrame>,
        next: usize,
    }

    impl PitchEstimator for Scripted {
        fn window_size(&self) -> usize {
            4
        }

        fn estimate(&mut self, _window: &[f32]) -> LiveFrame {
            let frame = self.frames.get(self.next).copied().unwrap_or(LiveFrame::UNVOICED);
            self.next += 1;
            frame
        }
    }

    fn session(
        reference: &[f32],
        live: &[(f32, f32)],
        lyrics: LyricTimeline,
    ) -> LiveSession<Scripted> {
        let estimator = Scripted {
            frames: live.iter().map(|&(p, c)| LiveFrame::new(p, c)).collect(),
            next: 0,
        };
        let pipeline = LiveCapturePipeline::new(estimator, 4, 1).unwrap();
        let loudness = vec![0.1; reference.len()];
        let reference = ReferenceTrack::from_frames(4, 8, reference.to_vec(), loudness).unwrap();
        LiveSession::new(
            pipeline,
            Arc::new(reference),
            Arc::new(lyrics),
            ScoringConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn phase_display_is_lowercase() {
        assert_eq!(SessionPhase::Finalizing.to_string(), "finalizing");
        assert_eq!(SessionPhase::Idle.to_string(), "idle");
    }

    #[test]
    fn block_count_equals_frame_index() {
        let mut live = session(&[440.0; 3], &[], LyricTimeline::empty());
        for n in 0..7 {
            let report = live.process_block(&[0.0; 4]);
            assert_eq!(report.frame_index, n);
        }
        assert_eq!(live.state().current_frame_index(), 7);
    }

    #[test]
    fn lyric_cursor_follows_frame_time() {
        // hop 4 at 8 Hz: each frame is half a second.
        let lyrics = LyricTimeline::new(vec![
            LyricSegment::new(0.0, 1.0, "first"),
            LyricSegment::new(1.0, 2.0, "second"),
        ])
        .unwrap();
        let mut live = session(&[0.0; 8], &[], lyrics);
        let indices: Vec<Option<usize>> = (0..6)
            .map(|_| live.process_block(&[0.0; 4]).lyric_index)
            .collect();
        assert_eq!(
            indices,
            vec![Some(0), Some(0), Some(1), Some(1), Some(1), Some(1)]
        );
        assert_eq!(live.state().current_lyric_index(), 1);
    }

    #[test]
    fn reports_are_published_without_blocking() {
        let (tx, rx) = crossbeam_channel::bounded(2);
        let mut live =
            session(&[440.0; 4], &[(440.0, 0.9); 4], LyricTimeline::empty()).with_reports(tx);
        for _ in 0..4 {
            live.process_block(&[0.0; 4]);
        }
        let received: Vec<FrameReport> = rx.try_iter().collect();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].frame_index, 0);
        assert_eq!(received[0].outcome.score(), Some(100.0));
    }

    #[test]
    fn mismatched_hop_is_rejected() {
        let estimator = Scripted {
            frames: Vec::new(),
            next: 0,
        };
        let pipeline = LiveCapturePipeline::new(estimator, 8, 1).unwrap();
        let reference = ReferenceTrack::from_frames(4, 8, vec![0.0], vec![0.0]).unwrap();
        let result = LiveSession::new(
            pipeline,
            Arc::new(reference),
            Arc::new(LyricTimeline::empty()),
            ScoringConfig::default(),
        );
        assert!(matches!(result, Err(ScoreError::InvalidReference { .. })));
    }

    #[test]
    fn summary_counts_frames_past_end() {
        let mut live = session(&[440.0], &[(440.0, 0.9); 12], LyricTimeline::empty());
        for _ in 0..12 {
            live.process_block(&[0.0; 4]);
        }
        let summary = live.finish();
        assert_eq!(summary.frames_processed, 12);
        assert_eq!(summary.frames_past_reference_end, 11);
        assert_eq!(summary.score_history, vec![100.0, 0.0]);
        assert_eq!(summary.usable_frames, 12);
        assert!((summary.final_score - 50.0).abs() < 1e-4);
    }

    #[test]
    fn offline_scoring_cuts_the_take_into_hops() {
        let rate = 44100;
        let reference =
            ReferenceTrack::from_frames(512, rate, vec![220.0; 10], vec![0.1; 10]).unwrap();
        let take: Vec<f32> = (0..512 * 10)
            .map(|i| 0.4 * (2.0 * std::f32::consts::PI * 220.0 * i as f32 / rate as f32).sin())
            .collect();
        let mut frames = 0;
        let summary = score_performance(
            Arc::new(reference),
            Arc::new(LyricTimeline::empty()),
            &MonoAudio::new(take, rate),
            &SessionConfig::default(),
            |_| frames += 1,
        )
        .unwrap();

        assert_eq!(frames, 10);
        assert_eq!(summary.frames_processed, 10);
        assert_eq!(summary.frames_past_reference_end, 0);
        assert!(summary.final_score > 95.0, "score {}", summary.final_score);
    }

    /// Keeps the capture handler so the test can play the audio thread.
    struct HeldHandler {
        handler: Arc<Mutex<Option<BlockHandler>>>,
    }

    struct Silent;

    impl ActiveStream for Silent {
        fn play(&mut self) -> Result<()> {
            Ok(())
        }

        fn pause(&mut self) -> Result<()> {
            Ok(())
        }
    }

    impl AudioBackend for HeldHandler {
        fn capture_format(&mut self, preferred_sample_rate: u32) -> Result<StreamFormat> {
            Ok(StreamFormat {
                sample_rate: preferred_sample_rate,
                channels: 1,
            })
        }

        fn open_capture(
            &mut self,
            _format: StreamFormat,
            _block_frames: usize,
            handler: BlockHandler,
        ) -> Result<Box<dyn ActiveStream>> {
            *self.handler.lock().unwrap() = Some(handler);
            Ok(Box::new(Silent))
        }

        fn open_playback(
            &mut self,
            _sample_rate: u32,
            _track: PlaybackTrack,
        ) -> Result<Box<dyn ActiveStream>> {
            Ok(Box::new(Silent))
        }
    }

    #[test]
    fn frame_count_is_readable_while_the_callback_holds_the_session() {
        let rate = 44100;
        let handler = Arc::new(Mutex::new(None));
        let backend = HeldHandler {
            handler: Arc::clone(&handler),
        };
        let mut controller = SessionController::new(backend, SessionConfig::default()).unwrap();
        let reference = ReferenceTrack::from_frames(512, rate, vec![0.0; 8], vec![0.0; 8]).unwrap();
        let backing = MonoAudio::new(vec![0.0; 4096], rate);
        controller
            .arm_with_reference(reference, &backing, LyricTimeline::empty())
            .unwrap();
        controller.start().unwrap();

        let mut handler = handler.lock().unwrap().take().unwrap();
        let block = vec![0.0; 512];
        for _ in 0..3 {
            handler(block.as_slice());
        }

        let active = controller.active.as_ref().unwrap();
        let held = active.session.lock().unwrap();
        assert_eq!(controller.frames_processed(), 3);
        drop(held);

        let summary = controller.stop().unwrap();
        assert_eq!(summary.frames_processed, 3);
    }

    #[test]
    fn default_config_is_valid() {
        assert!(SessionConfig::default().validate().is_ok());
        let config = SessionConfig {
            preferred_sample_rate: 0,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
