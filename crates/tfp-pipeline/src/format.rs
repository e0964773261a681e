//! Fixed-precision text rendering used in artifact names and tables.

/// Scientific notation with `significant` digits and a signed exponent of at least two digits,
/// e.g. `1.234567890e-05`.
pub fn scientific(value: f64, significant: usize) -> String {
    if value.is_nan() {
        return "nan".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_owned();
    }
    let precision = significant.saturating_sub(1);
    let rendered = format!("{value:.precision$e}");
    let Some((mantissa, exponent)) = rendered.split_once('e') else {
        return rendered;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs())
}

/// One decimal place with an explicit `+` for non-negative values.
pub fn signed_one_decimal(value: f64) -> String {
    // -0.0 is treated as zero
    let value = value + 0.0;
    let rendered = format!("{value:.1}");
    if value >= 0.0 {
        format!("+{rendered}")
    } else {
        rendered
    }
}

/// Rounded to an integer and zero padded to three digits.
pub fn redshift_tag(z: f64) -> String {
    let z = z + 0.0;
    format!("{z:03.0}")
}
