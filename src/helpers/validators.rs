//! Field rules that the `validator` derive has no built-in for.

use std::borrow::Cow;

use chrono::NaiveTime;
use rust_decimal::Decimal;
use validator::ValidationError;

fn rule(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

pub fn positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_positive() && !amount.is_zero() {
        Ok(())
    } else {
        Err(rule("positive_amount", "Amount must be greater than zero"))
    }
}

pub fn non_negative_rate(rate: &Decimal) -> Result<(), ValidationError> {
    if rate.is_sign_negative() && !rate.is_zero() {
        Err(rule("non_negative_rate", "Exchange rate cannot be negative"))
    } else {
        Ok(())
    }
}

/// `HH:MM` on a 24-hour clock.
pub fn valid_time_of_day(value: &str) -> Result<(), ValidationError> {
    match NaiveTime::parse_from_str(value, "%H:%M") {
        Ok(_) if value.len() == 5 => Ok(()),
        _ => Err(rule("time_of_day", "Time of day must use the HH:MM format")),
    }
}

/// Three-letter ISO 4217 code known to `rusty_money`, in any case.
pub fn iso_currency_code(code: &str) -> Result<(), ValidationError> {
    match rusty_money::iso::find(&code.trim().to_ascii_uppercase()) {
        Some(_) => Ok(()),
        None => Err(rule("iso_currency_code", "Currency code must be a valid ISO 4217 code")),
    }
}

/// Upper-cased ISO code and its default symbol, if the code is known.
pub fn currency_defaults(code: &str) -> (String, Option<&'static str>) {
    let code = code.trim().to_ascii_uppercase();
    let symbol = rusty_money::iso::find(&code).map(|currency| currency.symbol);
    (code, symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_amount() {
        assert!(positive_amount(&Decimal::new(1, 2)).is_ok());
        assert!(positive_amount(&Decimal::ZERO).is_err());
        assert!(positive_amount(&Decimal::new(-5, 0)).is_err());
    }

    #[test]
    fn test_time_of_day() {
        assert!(valid_time_of_day("09:30").is_ok());
        assert!(valid_time_of_day("23:59").is_ok());
        assert!(valid_time_of_day("24:00").is_err());
        assert!(valid_time_of_day("9:30").is_err());
        assert!(valid_time_of_day("noon").is_err());
    }

    #[test]
    fn test_currency_codes() {
        assert!(iso_currency_code("usd").is_ok());
        assert!(iso_currency_code("EUR").is_ok());
        assert!(iso_currency_code("XYZ").is_err());

        let (code, symbol) = currency_defaults(" eur ");
        assert_eq!(code, "EUR");
        assert_eq!(symbol, Some("€"));
    }
}
