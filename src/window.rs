//! Series windowing: select the visible slice of a sorted series

use chrono::Days;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::Series;

/// How much of a series to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowMode {
    /// The final `n` records
    LastN(usize),
    /// Every record within `n` calendar days ending at the latest record
    CalendarDays(u32),
    /// The whole series
    All,
}

impl Default for WindowMode {
    fn default() -> Self {
        WindowMode::LastN(60)
    }
}

/// Slice a sorted series.
///
/// `CalendarDays` works on date arithmetic, not record counts: a day with no
/// record contributes nothing. The window is `[anchor - (n - 1), anchor]`
/// inclusive, where `anchor` is the latest record. Bounds are UTC calendar
/// days, not instants: a record on the first day is kept even when its time
/// of day is earlier than the anchor's. Date-only payloads behave the same
/// either way. A zero-day window is empty.
pub fn window(series: &Series, mode: WindowMode) -> Series {
    let records = series.records();

    let selected = match mode {
        WindowMode::All => records.to_vec(),
        WindowMode::LastN(n) => {
            let start = records.len().saturating_sub(n);
            records[start..].to_vec()
        }
        WindowMode::CalendarDays(days) => match series.latest() {
            Some(anchor) if days > 0 => {
                let end = anchor.day();
                // Dates this early cannot be represented; everything qualifies
                let start = end.checked_sub_days(Days::new(u64::from(days - 1)));
                records
                    .iter()
                    .filter(|r| {
                        let day = r.day();
                        day <= end && start.map_or(true, |s| day >= s)
                    })
                    .cloned()
                    .collect()
            }
            _ => Vec::new(),
        },
    };

    debug!(
        mode = ?mode,
        input = records.len(),
        output = selected.len(),
        "Windowed series"
    );

    Series::from_sorted(selected)
}
