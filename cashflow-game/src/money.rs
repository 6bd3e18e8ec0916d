//! Money helpers centralizing cent arithmetic and safe numeric casts.
//!
//! All monetary quantities in the engine are integer cents (`i64`); floats
//! only appear transiently for rate math and are rounded back immediately.

use num_traits::cast::cast;

/// Round a f64 amount and clamp it to the i64 range, returning 0 for
/// non-finite values.
#[must_use]
pub fn round_f64_to_cents(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    let min = cast::<i64, f64>(i64::MIN).unwrap_or(f64::MIN);
    let max = cast::<i64, f64>(i64::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).round();
    cast::<f64, i64>(clamped).unwrap_or(0)
}

/// Convert i64 cents to f64 while allowing precision loss in a single
/// location.
#[must_use]
pub fn cents_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Monthly payment on a financed remainder at a fixed annual rate.
#[must_use]
pub fn monthly_loan_payment_cents(loan_cents: i64, annual_rate: f64) -> i64 {
    if loan_cents <= 0 {
        return 0;
    }
    round_f64_to_cents(cents_to_f64(loan_cents) * annual_rate / 12.0)
}

/// Render cents as a plain decimal amount, e.g. `123456` -> `"1234.56"`.
#[must_use]
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}
