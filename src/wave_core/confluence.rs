//! Multi-timeframe confluence summary

use serde::Serialize;

use super::signals::{Action, Signal};

/// Timeframes that must agree for a strong signal
pub const CONFLUENCE_THRESHOLD: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateSummary {
    pub total_signals: usize,
    pub buy_signals: usize,
    pub sell_signals: usize,
    pub strong_signal: Option<Action>,
}

impl AggregateSummary {
    /// Tally the actions of all signals; BUY wins a tie at the threshold
    pub fn from_signals<'a>(signals: impl IntoIterator<Item = &'a Signal>) -> Self {
        let mut summary = Self::default();
        for action in signals.into_iter().filter_map(|s| s.action) {
            summary.total_signals += 1;
            match action {
                Action::Buy => summary.buy_signals += 1,
                Action::Sell => summary.sell_signals += 1,
            }
        }

        summary.strong_signal = if summary.buy_signals >= CONFLUENCE_THRESHOLD {
            Some(Action::Buy)
        } else if summary.sell_signals >= CONFLUENCE_THRESHOLD {
            Some(Action::Sell)
        } else {
            None
        };
        summary
    }
}
