//! Text rendering of frame reports and session results.

use singscore_core::lyrics::LyricTimeline;
use singscore_core::notes::{self, NOT_AVAILABLE};
use singscore_core::scoring::FrameOutcome;
use singscore_core::{FrameReport, SessionSummary};

fn pitch_label(pitch_hz: f32) -> String {
    if pitch_hz > 0.0 {
        format!("{:7.2} Hz ({:<3})", pitch_hz, notes::note_label(pitch_hz))
    } else {
        format!("{:>16}", NOT_AVAILABLE)
    }
}

/// One line of live feedback.
pub fn frame_line(report: &FrameReport) -> String {
    let accuracy = match report.outcome {
        FrameOutcome::Scored { score, .. } => format!("{:5.1}%", score),
        FrameOutcome::Unusable => "   -- ".to_string(),
    };
    let cents = notes::cents_between(report.live.pitch_hz, report.reference.pitch_hz)
        .map(|c| format!(" | {:+5.0} cents", c))
        .unwrap_or_default();
    format!(
        "[{:7.2}s] Reference: {} | Live: {} | Accuracy: {}{}",
        report.time_secs,
        pitch_label(report.reference.pitch_hz),
        pitch_label(report.live.pitch_hz),
        accuracy,
        cents
    )
}

/// Remembers the last lyric shown so each line is printed once.
#[derive(Debug, Default)]
pub struct LyricPrinter {
    shown: Option<usize>,
}

impl LyricPrinter {
    /// Text to print if the active segment changed.
    pub fn update<'a>(
        &mut self,
        report: &FrameReport,
        lyrics: &'a LyricTimeline,
    ) -> Option<&'a str> {
        if report.lyric_index == self.shown {
            return None;
        }
        self.shown = report.lyric_index;
        report
            .lyric_index
            .and_then(|i| lyrics.get(i))
            .map(|segment| segment.text.as_str())
    }
}

pub fn summary_text(summary: &SessionSummary) -> String {
    let mut text = format!(
        "Final score: {:.1} / 100\n\
         Frames: {} processed, {} usable, {} scored\n\
         Reference: {} frames",
        summary.final_score,
        summary.frames_processed,
        summary.usable_frames,
        summary.score_history.len(),
        summary.reference_frames
    );
    if summary.frames_past_reference_end > 0 {
        text.push_str(&format!(
            " ({} captured past the end)",
            summary.frames_past_reference_end
        ));
    }
    if let Some(offset) = summary.playback_offset_samples {
        text.push_str(&format!("\nPlayback/capture offset: {} samples", offset));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use singscore_core::lyrics::LyricSegment;
    use singscore_core::pitch::LiveFrame;
    use singscore_core::sync::ReferenceFrame;

    fn report(
        live_hz: f32,
        reference_hz: f32,
        outcome: FrameOutcome,
        lyric_index: Option<usize>,
    ) -> FrameReport {
        FrameReport {
            frame_index: 0,
            time_secs: 1.5,
            live: LiveFrame::new(live_hz, 0.9),
            reference: ReferenceFrame {
                index: 0,
                pitch_hz: reference_hz,
                loudness: 0.1,
                exhausted: false,
            },
            outcome,
            lyric_index,
        }
    }

    #[test]
    fn scored_frame_shows_notes_accuracy_and_cents() {
        let line = frame_line(&report(
            445.0,
            440.0,
            FrameOutcome::Scored {
                score: 98.86,
                recorded: true,
            },
            None,
        ));
        assert!(line.contains("440.00 Hz (A4"), "{}", line);
        assert!(line.contains("445.00 Hz"), "{}", line);
        assert!(line.contains("Accuracy:  98.9%"), "{}", line);
        assert!(line.contains("+20 cents"), "{}", line);
    }

    #[test]
    fn silent_reference_shows_not_available() {
        let line = frame_line(&report(0.0, 0.0, FrameOutcome::Unusable, None));
        assert!(line.contains(NOT_AVAILABLE));
        assert!(!line.contains("cents"));
    }

    #[test]
    fn lyric_lines_print_once() {
        let lyrics = LyricTimeline::new(vec![
            LyricSegment::new(0.0, 1.0, "la"),
            LyricSegment::new(1.0, 2.0, "di"),
        ])
        .unwrap();
        let mut printer = LyricPrinter::default();
        let first = report(0.0, 0.0, FrameOutcome::Unusable, Some(0));
        let second = report(0.0, 0.0, FrameOutcome::Unusable, Some(1));
        assert_eq!(printer.update(&first, &lyrics), Some("la"));
        assert_eq!(printer.update(&first, &lyrics), None);
        assert_eq!(printer.update(&second, &lyrics), Some("di"));
    }

    #[test]
    fn summary_mentions_overrun_and_offset() {
        let summary = SessionSummary {
            final_score: 87.3,
            score_history: vec![80.0, 94.5],
            frames_processed: 120,
            usable_frames: 90,
            reference_frames: 100,
            frames_past_reference_end: 20,
            playback_offset_samples: Some(-256),
        };
        let text = summary_text(&summary);
        assert!(text.starts_with("Final score: 87.3"), "{}", text);
        assert!(text.contains("20 captured past the end"));
        assert!(text.contains("-256 samples"));
    }
}
