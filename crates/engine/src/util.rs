//! Internal helpers for model validation, date arithmetic and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and calendar logic so the engine enforces consistent invariants.

use chrono::{Datelike, Months, NaiveDate};
use unicode_normalization::UnicodeNormalization;

use crate::{EngineError, MoneyCents, ResultEngine};

/// Trim a required text field, rejecting empty values.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

/// A strictly positive amount within [`MoneyCents::MAX_AMOUNT`].
pub(crate) fn positive_amount(amount: MoneyCents, label: &str) -> ResultEngine<MoneyCents> {
    if !amount.is_positive() {
        return Err(EngineError::InvalidAmount(format!("{label} must be > 0")));
    }
    amount.within_limit()
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Comparison key for names: NFKC, lowercase, inner whitespace collapsed.
pub(crate) fn normalize_name_key(value: &str) -> String {
    let folded: String = value.nfkc().collect::<String>().to_lowercase();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First day of the month containing `date`.
pub(crate) fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Last day of the month containing `date`.
pub(crate) fn month_end(date: NaiveDate) -> NaiveDate {
    let start = month_start(date);
    start
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(start)
}

/// Add (or subtract, when negative) whole calendar months.
///
/// Day-of-month is clamped to the target month length (Jan 31 + 1 month is
/// Feb 28/29).
pub(crate) fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(months.unsigned_abs()))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    };
    shifted.unwrap_or(date)
}

/// First day of `year`/`month`, rejecting invalid months.
pub(crate) fn first_of_month(year: i32, month: u32) -> ResultEngine<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| EngineError::InvalidDate(format!("invalid month {year}-{month:02}")))
}

/// Round a float to `digits` decimal places.
pub(crate) fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_bounds() {
        assert_eq!(month_start(date(2026, 2, 17)), date(2026, 2, 1));
        assert_eq!(month_end(date(2026, 2, 17)), date(2026, 2, 28));
        assert_eq!(month_end(date(2028, 2, 1)), date(2028, 2, 29));
        assert_eq!(month_end(date(2026, 12, 31)), date(2026, 12, 31));
    }

    #[test]
    fn add_months_clamps_day() {
        assert_eq!(add_months(date(2026, 1, 31), 1), date(2026, 2, 28));
        assert_eq!(add_months(date(2026, 3, 15), -3), date(2025, 12, 15));
        assert_eq!(add_months(date(2026, 3, 15), 0), date(2026, 3, 15));
    }

    #[test]
    fn name_key_folds_case_and_spaces() {
        assert_eq!(normalize_name_key("  Ajuste   DE Saldo "), "ajuste de saldo");
        assert_eq!(normalize_name_key("ＡＪＵＳＴＥ de saldo"), "ajuste de saldo");
    }

    #[test]
    fn invalid_month_is_rejected() {
        assert!(first_of_month(2026, 13).is_err());
        assert_eq!(first_of_month(2026, 3).unwrap(), date(2026, 3, 1));
    }
}
