// singscore-cli/src/main.rs

//! # Karaoke Vocal Scorer
//!
//! Command line front end for `singscore-core`:
//! - **analyze**: turn an isolated vocal stem into a reference track
//! - **score**: grade a recorded take against a reference, offline
//! - **sing**: play the backing track, listen to the microphone and show
//!   live pitch feedback and lyrics, then print the final score
//!
//! ## Threading (sing)
//! - **Audio callbacks**: capture and scoring, owned by the core controller
//! - **Stdin thread**: turns each ENTER press into a control event
//! - **Main thread**: drains frame reports and control events with
//!   `crossbeam_channel::select!`

mod cli;
mod config;
mod display;
mod wav;

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::{select, Receiver};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cli::{Cli, Command};
use config::{Config, LiveConfig};
use display::LyricPrinter;
use singscore_core::{LyricTimeline, ReferenceAnalyzer, ReferenceTrack, SessionSummary};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    let config = match config::find_config(cli.config.clone()) {
        Some(path) => {
            let config = config::load_config(&path)?;
            log::info!("Loaded config from {}", path.display());
            config
        }
        None => Config::default(),
    };
    let Config { mut session, live } = config;

    match cli.command {
        Command::Analyze {
            vocals,
            output,
            hop_size,
        } => {
            if let Some(hop_size) = hop_size {
                session.analysis.hop_size = hop_size;
            }
            let audio = wav::read_mono(&vocals)?;
            let analyzer = ReferenceAnalyzer::new(session.analysis)?;
            let reference = analyzer.analyze(&audio.samples, audio.sample_rate)?;
            std::fs::write(&output, reference.to_json_string()?)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            log::info!(
                "Wrote {} reference frames ({:.1}s, {:.0}% voiced) to {}",
                reference.len(),
                reference.duration_secs(),
                reference.voiced_ratio() * 100.0,
                output.display()
            );
        }

        Command::Score {
            reference,
            performance,
            lyrics,
            policy,
            verbose,
            summary,
        } => {
            if let Some(policy) = policy {
                session.scoring.policy = policy.into();
            }
            let reference = load_or_analyze_reference(&reference, &session.analysis)?;
            let lyrics = load_lyrics(lyrics.as_deref())?;
            let take = wav::read_mono(&performance)?;

            let mut printer = LyricPrinter::default();
            let result = singscore_core::session::score_performance(
                Arc::new(reference),
                Arc::new(lyrics.clone()),
                &take,
                &session,
                |report| {
                    if verbose {
                        if let Some(text) = printer.update(report, &lyrics) {
                            println!("♪ {}", text);
                        }
                        println!("{}", display::frame_line(report));
                    }
                },
            )?;
            finish(&result, summary.as_deref())?;
        }

        Command::Sing {
            backing,
            vocals,
            reference,
            lyrics,
            policy,
            stop_at_end,
            summary,
        } => {
            if let Some(policy) = policy {
                session.scoring.policy = policy.into();
            }
            let live = LiveConfig {
                stop_at_end: stop_at_end || live.stop_at_end,
                ..live
            };
            let backing = wav::read_mono(&backing)?;
            let lyrics = load_lyrics(lyrics.as_deref())?;
            let source = match (vocals, reference) {
                (_, Some(path)) => ReferenceSource::Analyzed(load_reference_json(&path)?),
                (Some(path), None) => ReferenceSource::Stem(wav::read_mono(&path)?),
                (None, None) => anyhow::bail!("Either --vocals or --reference is required"),
            };
            let result = sing(session, &live, source, &backing, lyrics)?;
            finish(&result, summary.as_deref())?;
        }
    }

    Ok(())
}

enum ReferenceSource {
    Stem(singscore_core::MonoAudio),
    Analyzed(ReferenceTrack),
}

#[cfg(feature = "cpal-audio")]
fn sing(
    session: singscore_core::SessionConfig,
    live: &LiveConfig,
    source: ReferenceSource,
    backing: &singscore_core::MonoAudio,
    lyrics: LyricTimeline,
) -> Result<SessionSummary> {
    use singscore_core::{CpalBackend, SessionController};

    let mut controller = SessionController::new(CpalBackend::new(), session)?;
    match source {
        ReferenceSource::Stem(vocals) => controller.arm(&vocals, backing, lyrics.clone())?,
        ReferenceSource::Analyzed(reference) => {
            controller.arm_with_reference(reference, backing, lyrics.clone())?
        }
    }

    let enter = spawn_enter_listener();
    println!("Ready. Press ENTER to start singing.");
    enter.recv().context("Input closed before the session started")?;

    let reports = controller.reports();
    controller.start()?;
    println!("Singing! Press ENTER to stop.");

    let ticker = crossbeam_channel::tick(Duration::from_millis(live.display_interval_ms.max(1)));
    let mut printer = LyricPrinter::default();
    loop {
        select! {
            recv(reports) -> report => {
                if let Ok(report) = report {
                    if let Some(text) = printer.update(&report, &lyrics) {
                        println!("♪ {}", text);
                    }
                    println!("{}", display::frame_line(&report));
                }
            }
            recv(enter) -> _ => break,
            recv(ticker) -> _ => {
                if live.stop_at_end && controller.playback_finished() {
                    log::info!("Backing track finished");
                    break;
                }
            }
        }
    }

    let result = controller.stop()?;
    for report in reports.try_iter() {
        println!("{}", display::frame_line(&report));
    }
    Ok(result)
}

#[cfg(not(feature = "cpal-audio"))]
fn sing(
    _session: singscore_core::SessionConfig,
    _live: &LiveConfig,
    _source: ReferenceSource,
    _backing: &singscore_core::MonoAudio,
    _lyrics: LyricTimeline,
) -> Result<SessionSummary> {
    anyhow::bail!(
        "Live sessions require the 'cpal-audio' feature. \
         Rebuild with: cargo build --features cpal-audio"
    )
}

/// Forwards every line read from stdin as an event.
#[cfg_attr(not(feature = "cpal-audio"), allow(dead_code))]
fn spawn_enter_listener() -> Receiver<()> {
    let (tx, rx) = crossbeam_channel::unbounded();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    if tx.send(()).is_err() {
                        break;
                    }
                }
            }
        }
    });
    rx
}

fn load_reference_json(path: &Path) -> Result<ReferenceTrack> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let reference = ReferenceTrack::from_json_str(&json)
        .with_context(|| format!("Failed to load reference {}", path.display()))?;
    log::info!(
        "Loaded reference: {} frames at {} Hz",
        reference.len(),
        reference.sample_rate()
    );
    Ok(reference)
}

/// JSON files are pre-analyzed references; anything else is decoded as a
/// vocal stem and analyzed at its own sample rate.
fn load_or_analyze_reference(
    path: &Path,
    analysis: &singscore_core::AnalysisConfig,
) -> Result<ReferenceTrack> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        return load_reference_json(path);
    }
    let vocals = wav::read_mono(path)?;
    let analyzer = ReferenceAnalyzer::new(*analysis)?;
    Ok(analyzer.analyze(&vocals.samples, vocals.sample_rate)?)
}

fn load_lyrics(path: Option<&Path>) -> Result<LyricTimeline> {
    let Some(path) = path else {
        return Ok(LyricTimeline::empty());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let lyrics = LyricTimeline::from_json_str(&json)
        .with_context(|| format!("Failed to load lyrics {}", path.display()))?;
    log::info!("Loaded {} lyric segments", lyrics.len());
    Ok(lyrics)
}

fn finish(summary: &SessionSummary, output: Option<&Path>) -> Result<()> {
    println!("{}", display::summary_text(summary));
    if let Some(path) = output {
        let json = serde_json::to_string_pretty(summary)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Wrote session summary to {}", path.display());
    }
    Ok(())
}
