//! Restaurant metrics assembly
//!
//! The db layer returns raw per-day (or per-month) aggregates keyed by true
//! calendar values; everything here is pure so that re-running a query over
//! the same rows always yields the same response.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use shared::models::{DailyReceipt, DayOrdersAmount, MonthOrdersAmount, MonthReceipt};

/// Display format of a day at the response boundary
const DAY_LABEL_FORMAT: &str = "%d/%m";

/// Round to 2 decimal places
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `(current / previous) * 100 - 100`, rounded to 2 decimals.
///
/// No baseline (`previous == 0`) counts as no change.
pub fn percent_change(current: i64, previous: i64) -> f64 {
    if previous == 0 {
        return 0.0;
    }
    round2((current as f64 / previous as f64) * 100.0 - 100.0)
}

/// Build the daily receipt series: merge rows per date, drop days whose sum
/// is below one cent, order chronologically, then format as `DD/MM`.
pub fn daily_receipts(rows: impl IntoIterator<Item = (NaiveDate, i64)>) -> Vec<DailyReceipt> {
    let mut by_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for (date, receipt) in rows {
        *by_day.entry(date).or_default() += receipt;
    }

    by_day
        .into_iter()
        .filter(|(_, receipt)| *receipt >= 1)
        .map(|(date, receipt)| DailyReceipt {
            date: date.format(DAY_LABEL_FORMAT).to_string(),
            receipt,
        })
        .collect()
}

/// Today's order count and its change against yesterday.
///
/// `counts` holds `(epoch_day, count)` pairs; days other than `today_key`
/// and `today_key - 1` are ignored.
pub fn day_orders_amount(
    counts: impl IntoIterator<Item = (i64, i64)>,
    today_key: i64,
) -> DayOrdersAmount {
    let (mut today, mut yesterday) = (0, 0);
    for (day, count) in counts {
        if day == today_key {
            today += count;
        } else if day == today_key - 1 {
            yesterday += count;
        }
    }

    DayOrdersAmount {
        amount: today,
        diff_from_yesterday: percent_change(today, yesterday),
    }
}

pub fn month_receipt(current: i64, previous: i64) -> MonthReceipt {
    MonthReceipt {
        receipt: current,
        diff_from_last_month: percent_change(current, previous),
    }
}

pub fn month_orders_amount(current: i64, previous: i64) -> MonthOrdersAmount {
    MonthOrdersAmount {
        amount: current,
        diff_from_last_month: percent_change(current, previous),
    }
}
