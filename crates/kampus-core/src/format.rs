//! Display formatting for payload values.
//!
//! Clock times are rendered as zero-padded `HH:MM`; scores follow the
//! `%.3g` convention (three significant digits, trailing zeros dropped,
//! exponent form for very large or very small magnitudes).

/// Render minutes since midnight as `HH:MM`. Values past 24h wrap.
pub fn minutes_to_clock(minutes: u32) -> String {
    let minutes = minutes % (24 * 60);
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Render a meeting span as `HH:MM - HH:MM`.
pub fn clock_span(start_minute: u32, end_minute: u32) -> String {
    format!(
        "{} - {}",
        minutes_to_clock(start_minute),
        minutes_to_clock(end_minute)
    )
}

/// Format a number with `digits` significant digits, `%g` style.
///
/// # Algorithm
///
/// 1. Round to `digits` significant digits via scientific formatting, which
///    also yields the decimal exponent after rounding (99.96 → `1.00e2`).
/// 2. Exponent below -4 or at least `digits` → exponent form, mantissa
///    trimmed, exponent signed and at least two digits (`1e+03`).
/// 3. Otherwise fixed notation with `digits - 1 - exp` decimals, trailing
///    zeros and a dangling point removed.
pub fn format_significant(value: f64, digits: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let digits = digits.max(1);
    let sci = format!("{:.*e}", digits - 1, value);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m.to_string(), e.parse::<i32>().unwrap_or(0)),
        None => (sci.clone(), 0),
    };

    if exp < -4 || exp >= digits as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", trim_fraction(&mantissa), sign, exp.abs());
    }

    let decimals = (digits as i32 - 1 - exp).max(0) as usize;
    trim_fraction(&format!("{:.*}", decimals, value)).to_string()
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
