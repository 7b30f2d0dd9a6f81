//! Exchange domain logic: currency lookup, rate conversion, amount
//! validation and the random tokens used for payment matching and
//! referral links.

use rand::distr::Alphanumeric;
use rand::Rng;

use crate::core::config::exchange::{Currency, CURRENCIES};

/// Number of fractional digits kept in computed crypto amounts.
const CRYPTO_PRECISION: u32 = 8;

/// Length of the payment-matching comment token.
const COMMENT_LEN: usize = 10;

/// Length of the random part of a referral code (after the `ref_` prefix).
const REFERRAL_CODE_LEN: usize = 8;

/// Finds a supported currency by its ticker code.
pub fn find_currency(code: &str) -> Option<&'static Currency> {
    CURRENCIES.iter().find(|c| c.code == code)
}

/// Converts a RUB amount into the target currency at a fixed rate,
/// rounded to 8 fractional digits.
pub fn convert_to_crypto(amount_rub: f64, rate: f64) -> f64 {
    let factor = 10f64.powi(CRYPTO_PRECISION as i32);
    (amount_rub / rate * factor).round() / factor
}

/// Outcome of validating a user-entered RUB amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AmountCheck {
    /// Not a number
    Invalid,
    /// Parsed but below the configured minimum
    BelowMin,
    /// Accepted amount
    Ok(f64),
}

/// Validates free-form amount input. Accepts a decimal comma as well as
/// a decimal point.
pub fn check_amount(text: &str, min_amount: f64) -> AmountCheck {
    let normalized = text.trim().replace(',', ".");
    match normalized.parse::<f64>() {
        Ok(amount) if amount.is_finite() => {
            if amount < min_amount {
                AmountCheck::BelowMin
            } else {
                AmountCheck::Ok(amount)
            }
        }
        _ => AmountCheck::Invalid,
    }
}

fn random_alphanumeric(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len).map(|_| rng.sample(Alphanumeric) as char).collect()
}

/// Generates the random comment a user must attach to their payment so
/// the administrator can match it to an order.
pub fn generate_comment() -> String {
    random_alphanumeric(COMMENT_LEN)
}

/// Generates a new referral code: `ref_` + 8 random alphanumerics.
pub fn generate_referral_code() -> String {
    format!("ref_{}", random_alphanumeric(REFERRAL_CODE_LEN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::exchange::MIN_AMOUNT_RUB;
    use std::collections::HashSet;

    #[test]
    fn converts_at_fixed_rate_rounded_to_8_places() {
        // 5000 RUB at the USDT rate of 90.0
        assert_eq!(convert_to_crypto(5000.0, 90.0), 55.55555556);
        assert_eq!(format!("{:.8}", convert_to_crypto(5000.0, 90.0)), "55.55555556");
    }

    #[test]
    fn conversion_holds_for_all_catalog_currencies() {
        for currency in CURRENCIES {
            let amount = 12_345.0;
            let expected = (amount / currency.rate * 1e8).round() / 1e8;
            assert_eq!(convert_to_crypto(amount, currency.rate), expected);
        }
    }

    #[test]
    fn finds_catalog_currencies_by_code() {
        let usdt = find_currency("USDT").unwrap();
        assert_eq!(usdt.rate, 90.0);
        assert_eq!(usdt.name, "USDT (Tether)");

        assert!(find_currency("DOGE").is_none());
    }

    #[test]
    fn amount_below_minimum_is_rejected() {
        assert_eq!(check_amount("2999", MIN_AMOUNT_RUB), AmountCheck::BelowMin);
        assert_eq!(check_amount("3000", MIN_AMOUNT_RUB), AmountCheck::Ok(3000.0));
    }

    #[test]
    fn amount_accepts_decimal_comma() {
        assert_eq!(check_amount("5000,50", MIN_AMOUNT_RUB), AmountCheck::Ok(5000.5));
        assert_eq!(check_amount(" 5000.50 ", MIN_AMOUNT_RUB), AmountCheck::Ok(5000.5));
    }

    #[test]
    fn non_numeric_amount_is_invalid() {
        assert_eq!(check_amount("abc", MIN_AMOUNT_RUB), AmountCheck::Invalid);
        assert_eq!(check_amount("", MIN_AMOUNT_RUB), AmountCheck::Invalid);
        assert_eq!(check_amount("nan", MIN_AMOUNT_RUB), AmountCheck::Invalid);
    }

    #[test]
    fn negative_amount_is_below_minimum() {
        assert_eq!(check_amount("-5000", MIN_AMOUNT_RUB), AmountCheck::BelowMin);
    }

    #[test]
    fn comment_is_10_alphanumeric_chars() {
        let comment = generate_comment();
        assert_eq!(comment.len(), 10);
        assert!(comment.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn referral_code_has_prefix_and_8_random_chars() {
        let code = generate_referral_code();
        assert!(code.starts_with("ref_"));
        assert_eq!(code.len(), 12);
        assert!(code["ref_".len()..].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn generated_codes_do_not_collide() {
        let codes: HashSet<String> = (0..1000).map(|_| generate_referral_code()).collect();
        assert_eq!(codes.len(), 1000);
    }
}
