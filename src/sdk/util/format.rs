/// Formats `value` with `digits` decimals, rounding halves away from zero.
///
/// `format!("{:.N}")` rounds ties to even, which renders 12.5 as "12";
/// dashboard figures round 12.5 up to "13".
pub fn fixed(value: f64, digits: usize) -> String {
    let scale = 10f64.powi(digits as i32);
    format!("{:.*}", digits, (value * scale).round() / scale)
}
