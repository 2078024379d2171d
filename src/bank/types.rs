//! Types used throughout the banking system.

/// Decimal precision for monetary values.
/// This is used to convert floating-point values to fixed-point representation.
pub const DECIMAL_PRECISION: f64 = 10000.0;

/// Integer form of [`DECIMAL_PRECISION`].
pub const SCALE: i64 = 10_000;

/// Account number type, the unique key of an account in the registry.
pub type AccountNumber = String;

/// Money type, representing a fixed-point monetary value in ten-thousandths.
pub type Money = i64;

/// Annual interest rate in percent, on the same fixed-point scale as [`Money`].
pub type Rate = i64;

/// Converts a floating-point amount to fixed-point, rounding to the nearest unit.
/// Returns `None` for NaN, infinities and values outside the representable range.
pub fn to_money(value: f64) -> Option<Money> {
    let scaled = (value * DECIMAL_PRECISION).round();
    if scaled.is_finite() && scaled >= i64::MIN as f64 && scaled < i64::MAX as f64 {
        Some(scaled as Money)
    } else {
        None
    }
}

/// Converts a fixed-point amount back to floating point, for serialization.
pub fn to_f64(money: Money) -> f64 {
    money as f64 / DECIMAL_PRECISION
}

/// Serializes a fixed-point amount as a decimal number.
pub(crate) fn serialize_money<S>(money: &Money, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serde::Serialize::serialize(&to_f64(*money), serializer)
}

/// Divides `numerator` by a positive `denominator`, rounding half away from zero.
pub(crate) fn div_round(numerator: i128, denominator: i128) -> i128 {
    let half = denominator / 2;
    if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    }
}

/// Formats a fixed-point amount with two decimal places.
pub fn format_money(money: Money) -> String {
    let cents = div_round(money as i128, (SCALE / 100) as i128);
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{sign}{}.{:02}", cents / 100, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_money_rounds() {
        assert_eq!(to_money(5000.0), Some(50_000_000));
        assert_eq!(to_money(10.41666), Some(104_167));
        assert_eq!(to_money(-12.34), Some(-123_400));
        assert_eq!(to_money(f64::NAN), None);
        assert_eq!(to_money(f64::INFINITY), None);
        assert_eq!(to_money(1e300), None);
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(0), "0.00");
        assert_eq!(format_money(50_104_167), "5010.42");
        assert_eq!(format_money(104_167), "10.42");
        assert_eq!(format_money(-2_500_000), "-250.00");
        assert_eq!(format_money(50), "0.01");
        assert_eq!(format_money(-49), "0.00");
        assert_eq!(format_money(-50), "-0.01");
    }

    #[test]
    fn test_div_round() {
        assert_eq!(div_round(5, 2), 3);
        assert_eq!(div_round(-5, 2), -3);
        assert_eq!(div_round(4, 3), 1);
        assert_eq!(div_round(1_250_000_000_000, 12_000_000), 104_167);
    }
}
