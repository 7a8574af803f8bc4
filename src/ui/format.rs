use num_format::{Locale, ToFormattedString};

/// `1234.5` → `$1,234.50`.
pub fn currency(value: f64, symbol: &str) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!(
        "{sign}{symbol}{}.{:02}",
        (cents / 100).to_formatted_string(&Locale::en),
        cents % 100
    )
}

/// Average order value; an empty view has none.
pub fn optional_currency(value: Option<f64>, symbol: &str) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| currency(v, symbol))
}

pub fn count(n: usize) -> String {
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(currency(1234567.891, "$"), "$1,234,567.89");
        assert_eq!(currency(0.0, "$"), "$0.00");
        assert_eq!(currency(-12.5, "€"), "-€12.50");
        assert_eq!(currency(f64::NAN, "$"), "n/a");
    }

    #[test]
    fn undefined_average_is_placeholder() {
        assert_eq!(optional_currency(None, "$"), "n/a");
        assert_eq!(optional_currency(Some(20.0), "$"), "$20.00");
    }

    #[test]
    fn counts_group_thousands() {
        assert_eq!(count(1_250_000), "1,250,000");
    }
}
