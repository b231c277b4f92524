//! Event Bus - Alert delivery off the tick loop
//!
//! The engine thread emits; a tokio task drains the channel and hands each
//! alert to a notifier (desktop toast, sound, log). Delivery never blocks a
//! tick.

use tokio::sync::mpsc;

use crate::logic::alert::{AlertEvent, Severity};
use crate::logic::history::DailySummary;

/// Event names (log targets / downstream routing keys)
pub mod names {
    pub const ALERT_FIRED: &str = "alert:fired";
    pub const DAILY_SUMMARY: &str = "session:summary";
    pub const STOPPED: &str = "engine:stopped";
}

#[derive(Debug, Clone)]
pub enum MonitorEvent {
    Alert(AlertEvent),
    Summary(DailySummary),
    Stopped,
}

impl MonitorEvent {
    pub fn name(&self) -> &'static str {
        match self {
            MonitorEvent::Alert(_) => names::ALERT_FIRED,
            MonitorEvent::Summary(_) => names::DAILY_SUMMARY,
            MonitorEvent::Stopped => names::STOPPED,
        }
    }
}

/// Sending half, owned by the engine loop
#[derive(Clone)]
pub struct EventBus {
    tx: mpsc::UnboundedSender<MonitorEvent>,
}

impl EventBus {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<MonitorEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn emit(&self, event: MonitorEvent) -> Result<(), String> {
        let name = event.name();
        self.tx
            .send(event)
            .map_err(|_| format!("Emit error: '{}' receiver closed", name))
    }

    pub fn emit_alert(&self, alert: AlertEvent) {
        if let Err(e) = self.emit(MonitorEvent::Alert(alert)) {
            log::error!("Failed to emit alert: {}", e);
        }
    }

    pub fn emit_summary(&self, summary: DailySummary) {
        if let Err(e) = self.emit(MonitorEvent::Summary(summary)) {
            log::error!("Failed to emit summary: {}", e);
        }
    }

    pub fn emit_stopped(&self) {
        if let Err(e) = self.emit(MonitorEvent::Stopped) {
            log::warn!("Failed to emit stop: {}", e);
        }
    }
}

/// Receives delivered events
pub trait Notifier: Send {
    fn notify(&mut self, alert: &AlertEvent);

    fn summary(&mut self, _summary: &DailySummary) {}
}

/// Writes alerts to the log at a level matching their severity
#[derive(Debug, Default)]
pub struct LogNotifier {
    pub delivered: u64,
}

impl Notifier for LogNotifier {
    fn notify(&mut self, alert: &AlertEvent) {
        self.delivered += 1;
        let mut line = format!("[{}] {} - {} ({})", alert.kind, alert.title, alert.message, alert.recommendation);
        if alert.escalation_level > 0 {
            line.push_str(&format!(" [unacknowledged x{}]", alert.escalation_level));
        }
        if alert.severity == Severity::Critical || alert.escalation_level > 0 {
            log::warn!(target: names::ALERT_FIRED, "{}", line);
        } else {
            log::info!(target: names::ALERT_FIRED, "{}", line);
        }
    }

    fn summary(&mut self, summary: &DailySummary) {
        log::info!(
            target: names::DAILY_SUMMARY,
            "{} - {:.1}h on screen, {} sessions, {} breaks ({:.0}% on time), {} alerts",
            summary.date,
            summary.total_hours,
            summary.sessions,
            summary.breaks_taken,
            summary.break_compliance_rate,
            summary.alerts_fired
        );
        for rec in &summary.recommendations {
            log::info!(target: names::DAILY_SUMMARY, "  - {}", rec);
        }
    }
}

/// Drain the channel until `Stopped` or every sender is gone.
/// Returns the notifier and the number of alerts delivered.
pub async fn run_notifier<N: Notifier>(
    mut rx: mpsc::UnboundedReceiver<MonitorEvent>,
    mut notifier: N,
) -> (N, u64) {
    let mut delivered = 0;
    while let Some(event) = rx.recv().await {
        match event {
            MonitorEvent::Alert(alert) => {
                notifier.notify(&alert);
                delivered += 1;
            }
            MonitorEvent::Summary(summary) => notifier.summary(&summary),
            MonitorEvent::Stopped => break,
        }
    }
    log::debug!("Notifier finished after {} alerts", delivered);
    (notifier, delivered)
}
