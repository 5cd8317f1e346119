//! Human-readable sizes and percentages. Display only: never compare on these strings.

const BYTE_UNITS: [&str; 9] = ["B", "kB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Formats a (possibly negative) byte count with 1000-based units and at most
/// three fractional digits, e.g. `1536 -> "1.536 kB"`.
pub fn format_bytes(value: i64) -> String {
    let sign = if value < 0 { "-" } else { "" };
    let mut number = value.unsigned_abs() as f64;

    let mut exponent = 0;
    while number >= 1000.0 && exponent < BYTE_UNITS.len() - 1 {
        number /= 1000.0;
        exponent += 1;
    }

    format!(
        "{sign}{} {}",
        trim_fraction(&format!("{number:.3}")),
        BYTE_UNITS[exponent]
    )
}

/// Converts a stored size to a signed byte count, saturating at `i64::MAX`.
pub fn signed_size(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Formats a fractional change (`0.5` = 50%) as a percentage.
///
/// Small fractions keep more decimals so that tiny changes do not collapse
/// to `0%`; the result carries at most three significant digits.
pub fn format_percent(fraction: f64) -> String {
    let decimals = if fraction.abs() < 0.001 {
        4
    } else if fraction.abs() < 0.01 {
        3
    } else {
        2
    };

    let percent = round_to(fraction, decimals) * 100.0;
    if percent == 0.0 {
        return "0%".to_string();
    }

    format!("{}%", to_significant(percent, 3))
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

fn to_significant(value: f64, digits: i32) -> String {
    let magnitude = value.abs().log10().floor() as i32;
    let shift = digits - 1 - magnitude;
    let rounded = round_to(value, shift);
    let decimals = shift.max(0) as usize;

    group_thousands(&trim_fraction(&format!("{rounded:.decimals$}")))
}

fn trim_fraction(s: &str) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s.to_string()
    }
}

fn group_thousands(s: &str) -> String {
    let (sign, unsigned) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let bytes = int_part.as_bytes();
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, &b) in bytes.iter().enumerate() {
        if i > 0 && (bytes.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(b as char);
    }

    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}
