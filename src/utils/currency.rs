//! Colombian peso formatting (es-CO, COP, no fraction digits).

/// Formats an amount as `$ 1.234.567`, rounding to whole pesos.
///
/// The gap after `$` is an ASCII space; browsers' es-CO formatter emits a
/// no-break space (U+00A0) there instead.
pub fn format_currency(amount: f64) -> String {
    let rounded = amount.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-$ {}", grouped)
    } else {
        format!("$ {}", grouped)
    }
}

/// Parses amounts such as `$ 45.000`, `$1,234,567`, `$45000.00` or
/// `$ 45.000,50`.
///
/// The last `.` or `,` is the decimal separator when one or two digits follow
/// it; every other separator groups thousands. Other symbols are ignored.
/// Returns `None` when no digit is present.
pub fn parse_currency(text: &str) -> Option<f64> {
    let negative = text.trim_start().starts_with('-');
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();

    let (integer, fraction) = match kept.rfind(|c| c == '.' || c == ',') {
        Some(pos) if (1..=2).contains(&(kept.len() - pos - 1)) => {
            (&kept[..pos], &kept[pos + 1..])
        }
        _ => (kept.as_str(), ""),
    };

    let mut number: String = integer.chars().filter(char::is_ascii_digit).collect();
    if number.is_empty() && fraction.is_empty() {
        return None;
    }
    if number.is_empty() {
        number.push('0');
    }
    if !fraction.is_empty() {
        number.push('.');
        number.push_str(fraction);
    }

    let value: f64 = number.parse().ok()?;
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "$ 0");
        assert_eq!(format_currency(950.0), "$ 950");
        assert_eq!(format_currency(45_000.0), "$ 45.000");
        assert_eq!(format_currency(1_234_567.4), "$ 1.234.567");
        assert_eq!(format_currency(8_549.5), "$ 8.550");
        assert_eq!(format_currency(-2_500.0), "-$ 2.500");
    }

    #[test]
    fn test_parse_currency() {
        assert_eq!(parse_currency("$ 45.000"), Some(45_000.0));
        assert_eq!(parse_currency("$1,234,567"), Some(1_234_567.0));
        assert_eq!(parse_currency("-$ 2.500"), Some(-2_500.0));
        assert_eq!(parse_currency("gratis"), None);
    }

    #[test]
    fn test_parse_currency_keeps_decimal_part() {
        assert_eq!(parse_currency("$45000.00"), Some(45_000.0));
        assert_eq!(parse_currency("$ 45.000,50"), Some(45_000.5));
        assert_eq!(parse_currency("$ 1.5"), Some(1.5));
        assert_eq!(parse_currency("$1,234,567.89"), Some(1_234_567.89));
        assert_eq!(parse_currency("-$ 2.500,25"), Some(-2_500.25));
    }
}
