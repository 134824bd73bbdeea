//! The price poll loop.
//!
//! Each cycle: fetch → extract → compare → journal → notify (on change).
//! Between cycles the loop sleeps for the configured interval, or, in debug
//! mode, in 100 equal slices while drawing a countdown.

use std::io::Write;
use std::time::Duration;
use tracing::{debug, info};

use crate::journal::{EntryStatus, PriceJournal};
use crate::notify::{Notifier, PriceAlert};
use crate::scrape::{PageSource, PriceExtractor};
use crate::types::{CycleOutcome, MonitorState, PriceReading};

/// Number of countdown slices the debug wait is split into.
pub const COUNTDOWN_STEPS: u32 = 100;

pub struct PriceMonitor {
    source: Box<dyn PageSource>,
    extractor: PriceExtractor,
    journal: PriceJournal,
    notifiers: Vec<Box<dyn Notifier>>,
    title: String,
    state: MonitorState,
}

impl PriceMonitor {
    pub fn new(
        source: Box<dyn PageSource>,
        extractor: PriceExtractor,
        journal: PriceJournal,
        notifiers: Vec<Box<dyn Notifier>>,
        title: impl Into<String>,
        state: MonitorState,
    ) -> Self {
        Self {
            source,
            extractor,
            journal,
            notifiers,
            title: title.into(),
            state,
        }
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    /// Fetch the page and extract the price. Any failure is a missed reading.
    pub async fn read_price(&self) -> Option<PriceReading> {
        let html = match self.source.fetch_page().await {
            Ok(html) => html,
            Err(e) => {
                debug!(url = %self.source.url(), error = %e, "Page fetch failed");
                return None;
            }
        };

        match self.extractor.extract(&html) {
            Ok(price) => {
                debug!(price = %price, "Price retrieved");
                Some(price)
            }
            Err(e) => {
                debug!(error = %e, "Price extraction failed");
                None
            }
        }
    }

    /// Run one fetch→compare→journal→notify cycle.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        debug!(cycle = self.state.cycles + 1, "Starting price check");

        let reading = self.read_price().await;
        let outcome = self.state.classify(reading);

        match &outcome {
            CycleOutcome::NoReading => {
                debug!(outcome = %outcome, "No price reading this cycle");
            }
            CycleOutcome::Steady(price) => {
                self.write_journal(EntryStatus::Unchanged, price);
                info!(outcome = %outcome, price = %price, "Price unchanged");
            }
            CycleOutcome::Changed { previous, current } => {
                self.write_journal(EntryStatus::Changed, current);
                info!(
                    outcome = %outcome,
                    price = %current,
                    previous = previous.as_ref().map(|p| p.as_str()).unwrap_or("-"),
                    "Price changed"
                );
                let alert = PriceAlert::new(self.title.clone(), previous.clone(), current.clone());
                self.dispatch(&alert).await;
            }
        }

        // Last known price moves only after every notifier has been tried.
        self.state.record(&outcome);
        outcome
    }

    fn write_journal(&self, status: EntryStatus, price: &PriceReading) {
        if let Err(e) = self.journal.append(status, price) {
            debug!(path = %self.journal.path().display(), error = %e, "Journal write failed");
        }
    }

    /// Try every notifier once; one failing does not stop the others.
    async fn dispatch(&self, alert: &PriceAlert) {
        for notifier in &self.notifiers {
            match notifier.notify(alert).await {
                Ok(()) => debug!(channel = notifier.channel(), "Notification delivered"),
                Err(e) => debug!(channel = notifier.channel(), error = %e, "Notification failed"),
            }
        }
    }

    /// Sleep until the next cycle.
    pub async fn wait(&self) {
        let interval = self.state.interval;
        if !self.state.debug_enabled {
            tokio::time::sleep(interval).await;
            return;
        }

        debug!(minutes = interval.as_secs() / 60, "Waiting for next check");
        let mut stderr = std::io::stderr();
        for (step, (remaining, slice)) in countdown(interval).enumerate() {
            let _ = write!(stderr, "\r{}", format_progress(step as u32, remaining));
            let _ = stderr.flush();
            tokio::time::sleep(slice).await;
        }
        let _ = writeln!(stderr, "\r{}", format_progress(COUNTDOWN_STEPS, Duration::ZERO));
    }

    /// Poll forever.
    pub async fn run(&mut self) {
        info!(
            url = %self.source.url(),
            interval_secs = self.state.interval.as_secs(),
            notifiers = self.notifiers.len(),
            "Price monitor running"
        );
        loop {
            self.run_cycle().await;
            self.wait().await;
        }
    }
}

/// Split `interval` into [`COUNTDOWN_STEPS`] equal slices, yielding the time
/// remaining before each slice and the slice length.
pub fn countdown(interval: Duration) -> impl Iterator<Item = (Duration, Duration)> {
    let slice = interval / COUNTDOWN_STEPS;
    (0..COUNTDOWN_STEPS).map(move |i| (interval.saturating_sub(slice * i), slice))
}

/// Width of the countdown bar in characters.
const PROGRESS_WIDTH: u32 = 40;

/// Countdown line for `step` of [`COUNTDOWN_STEPS`]:
/// ` 50%|████      | 15:00 remaining`
pub fn format_progress(step: u32, remaining: Duration) -> String {
    let step = step.min(COUNTDOWN_STEPS);
    let pct = step * 100 / COUNTDOWN_STEPS;
    let filled = (step * PROGRESS_WIDTH / COUNTDOWN_STEPS) as usize;
    let empty = PROGRESS_WIDTH as usize - filled;
    format!(
        "{pct:>3}%|{}{}| {}",
        "█".repeat(filled),
        " ".repeat(empty),
        format_remaining(remaining)
    )
}

/// `MM:SS remaining`
pub fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{:02}:{:02} remaining", secs / 60, secs % 60)
}
