use once_cell::sync::Lazy;
use std::env;

/// Configuration constants for the bot
/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Database file path
/// Read from DATABASE_PATH environment variable
/// Default: exchange_bot.db
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "exchange_bot.db".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: app.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "app.log".to_string()));

/// Directory where uploaded payment receipts are stored
/// Read from RECEIPTS_DIR environment variable
/// Default: receipts
pub static RECEIPTS_DIR: Lazy<String> =
    Lazy::new(|| env::var("RECEIPTS_DIR").unwrap_or_else(|_| "receipts".to_string()));

/// Network configuration
pub mod network {
    use std::time::Duration;

    /// Request timeout for Telegram API calls (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Admin configuration
pub mod admin {
    use once_cell::sync::Lazy;
    use std::env;

    fn parse_admin_ids(raw: &str) -> Vec<i64> {
        raw.split([',', ' ', '\n', '\t'])
            .filter_map(|part| part.trim().parse::<i64>().ok())
            .collect()
    }

    /// Admin user IDs (comma-separated)
    /// Read from ADMIN_IDS environment variable
    /// Only these users can open the admin panel, read statistics and
    /// create referral links.
    pub static ADMIN_IDS: Lazy<Vec<i64>> = Lazy::new(|| {
        env::var("ADMIN_IDS")
            .ok()
            .map(|raw| parse_admin_ids(&raw))
            .unwrap_or_default()
    });

    /// Checks membership in the fixed privileged-id set.
    pub fn is_admin(user_id: i64) -> bool {
        ADMIN_IDS.contains(&user_id)
    }

    #[cfg(test)]
    mod tests {
        use super::parse_admin_ids;

        #[test]
        fn parses_comma_separated_ids() {
            assert_eq!(parse_admin_ids("1,2,3"), vec![1, 2, 3]);
            assert_eq!(parse_admin_ids("8327116123"), vec![8327116123]);
        }

        #[test]
        fn skips_garbage_entries() {
            assert_eq!(parse_admin_ids("1, x, 3"), vec![1, 3]);
            assert_eq!(parse_admin_ids(""), Vec::<i64>::new());
        }
    }
}

/// Exchange configuration: currency catalog, rates, limits, payment routing
pub mod exchange {
    use once_cell::sync::Lazy;
    use std::env;

    /// A purchasable currency with its fixed RUB exchange rate.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Currency {
        /// Ticker code used in callback data and order rows
        pub code: &'static str,
        /// Human-readable button label
        pub name: &'static str,
        /// Fixed RUB-per-unit rate
        pub rate: f64,
    }

    /// Supported currencies. Rates are static and updated with a deploy.
    pub const CURRENCIES: &[Currency] = &[
        Currency {
            code: "BTC",
            name: "BTC (Bitcoin)",
            rate: 3_500_000.0,
        },
        Currency {
            code: "ETH",
            name: "ETH (Ethereum)",
            rate: 250_000.0,
        },
        Currency {
            code: "LTC",
            name: "LTC (Litecoin)",
            rate: 8_000.0,
        },
        Currency {
            code: "USDT",
            name: "USDT (Tether)",
            rate: 90.0,
        },
    ];

    /// Minimum order amount in RUB
    pub const MIN_AMOUNT_RUB: f64 = 3000.0;

    /// SBP phone number shown in payment details
    /// Read from PAYMENT_PHONE environment variable
    pub static PAYMENT_PHONE: Lazy<String> =
        Lazy::new(|| env::var("PAYMENT_PHONE").unwrap_or_else(|_| "5354 5102 0453 5214".to_string()));

    /// Bank name shown in payment details
    /// Read from PAYMENT_BANK environment variable
    pub static PAYMENT_BANK: Lazy<String> =
        Lazy::new(|| env::var("PAYMENT_BANK").unwrap_or_else(|_| "-".to_string()));
}
