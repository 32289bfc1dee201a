use rust_decimal::Decimal;

/// Standard VAT rate (15%).
pub fn vat_rate() -> Decimal {
    Decimal::new(15, 2)
}

pub fn round2(value: Decimal) -> Decimal {
    value.round_dp(2)
}

/// VAT portion of an amount, rounded to 2 decimals.
pub fn vat_amount(amount: Decimal) -> Decimal {
    round2(amount * vat_rate())
}

/// Tax value at an arbitrary percentage rate (vouchers carry their own rate).
pub fn tax_at_rate(amount: Decimal, rate_percent: Decimal) -> Decimal {
    round2(amount * rate_percent / Decimal::from(100))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn vat_is_fifteen_percent_rounded() {
        assert_eq!(vat_amount(dec("100")), dec("15.00"));
        assert_eq!(vat_amount(dec("33.33")), dec("5.00")); // 4.9995 rounds up
        assert_eq!(vat_amount(dec("0.01")), dec("0.00"));
    }

    #[test]
    fn tax_at_arbitrary_rate() {
        assert_eq!(tax_at_rate(dec("200"), dec("5")), dec("10.00"));
        assert_eq!(tax_at_rate(dec("149.99"), dec("15")), dec("22.50"));
        assert_eq!(tax_at_rate(dec("80"), dec("0")), dec("0.00"));
    }
}
