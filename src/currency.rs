/// Formats an amount as US dollars with thousands separators,
/// e.g. `-1234.5` -> `-$1,234.50`.
pub fn format_as_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return amount.to_string();
    }

    let cents = format!("{:.2}", amount.abs());
    let (whole, frac) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    // -0.001 rounds to zero and should not print a sign
    let sign = if amount < 0. && cents.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    format!("{}${}.{}", sign, grouped, frac)
}
