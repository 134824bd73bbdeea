//! Shared types for the PRICEWATCH monitor.
//!
//! The poll loop, the scraper, the journal and the notifiers all speak
//! in terms of these types, so they live in one place with no
//! dependencies on the other modules.

use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Price reading
// ---------------------------------------------------------------------------

/// A normalized price string as shown on the product page, e.g. `"1299.00"`
/// or `"1.299,00"`.
///
/// Currency symbols and whitespace have already been stripped. Two readings
/// are the same price only if their strings match exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PriceReading(String);

impl PriceReading {
    /// Wrap an already-normalized price string.
    pub fn new(normalized: impl Into<String>) -> Self {
        Self(normalized.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interpret the reading as a number.
    ///
    /// Accepts European (`1.299,00`) and English (`1,299.00`, `1299.00`)
    /// grouping. Returns `None` when the text is not a plain amount, such
    /// as the `"1.299.00"` produced for a thousands-grouped price without a
    /// fraction.
    pub fn as_decimal(&self) -> Option<Decimal> {
        let s = self.0.trim();
        let canonical = match (s.rfind(','), s.rfind('.')) {
            // Comma is the decimal separator, dots group thousands.
            (Some(c), Some(d)) if c > d => s.replace('.', "").replace(',', "."),
            (Some(c), None) => {
                if s.matches(',').count() > 1 {
                    return None;
                }
                let mut out = s.to_string();
                out.replace_range(c..=c, ".");
                out
            }
            // Dot is the decimal separator, commas group thousands.
            (Some(_), Some(_)) => s.replace(',', ""),
            (None, Some(_)) => {
                if s.matches('.').count() > 1 {
                    return None;
                }
                s.to_string()
            }
            (None, None) => s.to_string(),
        };
        Decimal::from_str(&canonical).ok()
    }
}

impl fmt::Display for PriceReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Cycle outcome
// ---------------------------------------------------------------------------

/// What a single poll cycle observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The price differs from the last known one (or is the first reading).
    Changed {
        previous: Option<PriceReading>,
        current: PriceReading,
    },
    /// The price equals the last known one.
    Steady(PriceReading),
    /// Fetch or extraction failed; nothing was logged or notified.
    NoReading,
}

impl CycleOutcome {
    pub fn is_change(&self) -> bool {
        matches!(self, CycleOutcome::Changed { .. })
    }
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleOutcome::Changed { current, .. } => write!(f, "CHANGED ({current}€)"),
            CycleOutcome::Steady(p) => write!(f, "STEADY ({p}€)"),
            CycleOutcome::NoReading => write!(f, "NO READING"),
        }
    }
}

// ---------------------------------------------------------------------------
// Monitor state
// ---------------------------------------------------------------------------

/// Process-lifetime state of the poll loop. Never persisted.
#[derive(Debug, Clone)]
pub struct MonitorState {
    /// Most recent successfully extracted price.
    pub last_known_price: Option<PriceReading>,
    pub interval: Duration,
    pub debug_enabled: bool,
    pub cycles: u64,
    pub changes: u64,
    pub steady: u64,
    pub misses: u64,
}

impl MonitorState {
    pub fn new(interval: Duration, debug_enabled: bool) -> Self {
        Self {
            last_known_price: None,
            interval,
            debug_enabled,
            cycles: 0,
            changes: 0,
            steady: 0,
            misses: 0,
        }
    }

    /// Classify a fresh reading against the last known price.
    /// Does not mutate state.
    pub fn classify(&self, reading: Option<PriceReading>) -> CycleOutcome {
        match reading {
            None => CycleOutcome::NoReading,
            Some(current) => match &self.last_known_price {
                Some(last) if *last == current => CycleOutcome::Steady(current),
                previous => CycleOutcome::Changed {
                    previous: previous.clone(),
                    current,
                },
            },
        }
    }

    /// Fold a cycle outcome into the counters and the last known price.
    pub fn record(&mut self, outcome: &CycleOutcome) {
        self.cycles += 1;
        match outcome {
            CycleOutcome::Changed { current, .. } => {
                self.changes += 1;
                self.last_known_price = Some(current.clone());
            }
            CycleOutcome::Steady(_) => self.steady += 1,
            CycleOutcome::NoReading => self.misses += 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Failures the monitor can hit. None of them stop the loop.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Server responded with status {0}")]
    Status(u16),

    #[error("Price element not found: {0}")]
    Markup(String),

    #[error("Notification error ({channel}): {message}")]
    Notify { channel: String, message: String },

    #[error("Price log write failed: {0}")]
    Journal(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
