//! Health Monitor - Replay entry point
//!
//! Usage: `health-monitor <frames.jsonl> [--recalibrate]`
//!
//! Each line of the input is a `LandmarkFrame`. A reader thread feeds the
//! frame queue, the main thread drives the engine, a tokio runtime thread
//! delivers alerts. On EOF the engine stops, the baseline is persisted and the
//! daily summary is written.

use std::error::Error;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use health_monitor_core::constants::{self, APP_NAME, APP_VERSION};
use health_monitor_core::logic::baseline::storage::{default_baseline_path, load_baseline_if_present, save_baseline};
use health_monitor_core::logic::config::MonitorConfig;
use health_monitor_core::logic::events::{run_notifier, EventBus, LogNotifier};
use health_monitor_core::logic::history::HistoryLog;
use health_monitor_core::logic::queue::FrameQueue;
use health_monitor_core::{EngineError, HealthMonitorEngine, LandmarkFrame};

struct Args {
    input: PathBuf,
    recalibrate: bool,
}

fn parse_args() -> Option<Args> {
    let mut input = None;
    let mut recalibrate = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--recalibrate" => recalibrate = true,
            _ if input.is_none() => input = Some(PathBuf::from(arg)),
            _ => return None,
        }
    }
    input.map(|input| Args { input, recalibrate })
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting {} v{}", APP_NAME, APP_VERSION);

    let args = match parse_args() {
        Some(args) => args,
        None => {
            eprintln!("usage: health-monitor <frames.jsonl> [--recalibrate]");
            std::process::exit(2);
        }
    };

    if let Err(e) = run(args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = MonitorConfig::load_default()?;
    let baseline_path = default_baseline_path();

    let mut engine = HealthMonitorEngine::new(config.clone())?;
    if args.recalibrate {
        log::info!("Recalibration requested, ignoring stored baseline");
    } else {
        adopt_stored_baseline(&mut engine, &baseline_path);
    }

    let mut history = (config.history.enabled && constants::is_history_enabled())
        .then(|| HistoryLog::new(&config.history));

    // Alert delivery
    let (bus, rx) = EventBus::channel();
    let notifier = thread::Builder::new()
        .name("notifier".into())
        .spawn(move || -> std::io::Result<u64> {
            let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
            let (_, delivered) = runtime.block_on(run_notifier(rx, LogNotifier::default()));
            Ok(delivered)
        })?;

    // Frame source
    let queue = Arc::new(FrameQueue::default());
    let reader = {
        let queue = Arc::clone(&queue);
        let input = args.input.clone();
        thread::Builder::new().name("reader".into()).spawn(move || {
            let result = read_frames(&input, &queue);
            queue.close();
            result
        })?
    };

    let mut faults = 0u64;
    while let Some(frame) = queue.pop() {
        let outcome = engine.tick(&frame);
        if outcome.fault.is_some() {
            faults += 1;
        }
        for notice in &outcome.notices {
            if let EngineError::CalibrationIncomplete { reason } = notice {
                log::warn!("Calibration incomplete: {}", reason);
            }
        }
        if let Some(history) = history.as_mut() {
            history.record_tick(&outcome.snapshot, &outcome.events);
        }
        for event in outcome.events {
            bus.emit_alert(event);
        }
    }

    match reader.join() {
        Ok(Ok(read)) => log::info!("Replayed {} frames ({} dropped, {} rejected)", read, queue.dropped(), faults),
        Ok(Err(e)) => log::error!("Frame reader failed: {}", e),
        Err(_) => log::error!("Frame reader panicked"),
    }

    engine.stop();

    if engine.baseline().is_calibrated() {
        match save_baseline(engine.baseline(), &baseline_path) {
            Ok(()) => log::info!("Baseline saved to {:?}", baseline_path),
            Err(e) => log::error!("Failed to save baseline: {}", e),
        }
    }

    let summary = engine.daily_summary();
    if let Some(history) = history.as_ref() {
        match history.write_summary(&summary) {
            Ok(path) => log::info!("Daily summary written to {:?} ({} records logged)", path, history.records_written()),
            Err(e) => log::error!("Failed to write daily summary: {}", e),
        }
    }
    bus.emit_summary(summary);
    bus.emit_stopped();

    match notifier.join() {
        Ok(Ok(delivered)) => log::info!("{} alerts delivered", delivered),
        Ok(Err(e)) => log::error!("Notifier runtime failed: {}", e),
        Err(_) => log::error!("Notifier panicked"),
    }
    Ok(())
}

fn adopt_stored_baseline(engine: &mut HealthMonitorEngine, path: &Path) {
    match load_baseline_if_present(path) {
        Ok(Some(baseline)) => {
            if let Err(e) = engine.adopt_baseline(baseline) {
                log::warn!("Stored baseline rejected ({}), calibrating", e);
            }
        }
        Ok(None) => log::info!("No stored baseline, calibrating on first frames"),
        Err(e) => log::warn!("Stored baseline unusable ({}), calibrating", e),
    }
}

/// Parse the replay file into the queue. Returns the number of frames read.
fn read_frames(path: &Path, queue: &FrameQueue) -> std::io::Result<u64> {
    let reader = BufReader::new(File::open(path)?);
    let mut read = 0;
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: LandmarkFrame = match serde_json::from_str(&line) {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("Line {}: unreadable frame: {}", i + 1, e);
                continue;
            }
        };
        match queue.push_wait(frame) {
            Ok(()) => read += 1,
            Err(e) => log::warn!("Line {}: {}", i + 1, e),
        }
    }
    Ok(read)
}
