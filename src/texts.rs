//! Typed message layer over the fluent catalog.
//!
//! Every parametrised message gets one constructor here, so the set of
//! required placeables is checked at the call site instead of failing
//! silently at render time. Rendering itself stays fail-open: an
//! unknown key comes back as the key, a missing placeable leaves the
//! template unrendered (see `i18n`).

use fluent_templates::fluent_bundle::FluentArgs;

use crate::i18n::{t, t_args};
use crate::storage::db::{AdminStats, LinkStats};

/// Groups an unsigned digit string with `,` every three digits.
fn group_digits(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    let offset = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - offset) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Formats a RUB amount as `1,234,567.89`.
pub fn format_rub(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, group_digits(int_part), frac_part)
}

/// Formats a whole RUB limit as `3,000`.
pub fn format_rub_whole(amount: f64) -> String {
    format!("{}{}", if amount < 0.0 { "-" } else { "" }, group_digits(&format!("{:.0}", amount.abs())))
}

/// Formats a crypto amount with 8 fractional digits.
pub fn format_crypto(amount: f64) -> String {
    format!("{:.8}", amount)
}

// ==================== Главное меню ====================

pub fn start_message(welcome_text: &str) -> String {
    let mut args = FluentArgs::new();
    args.set("welcome_text", welcome_text);
    t_args("start.message", &args)
}

pub fn admin_welcome() -> String {
    t("start.admin_welcome")
}

pub fn user_welcome() -> String {
    t("start.user_welcome")
}

pub fn support() -> String {
    t("support.text")
}

// ==================== Админ-панель ====================

pub fn admin_panel() -> String {
    t("admin.panel")
}

pub fn admin_stats(stats: &AdminStats) -> String {
    let mut args = FluentArgs::new();
    args.set("total_orders", stats.total_orders);
    args.set("completed_orders", stats.completed_orders);
    args.set("waiting_orders", stats.waiting_orders);
    args.set("processing_orders", stats.processing_orders);
    args.set("total_amount", format_rub(stats.total_amount));
    args.set("total_referrals", stats.total_referrals);
    t_args("admin.stats", &args)
}

pub fn link_stats(name: &str, stats: &LinkStats, referral_link: &str) -> String {
    let mut args = FluentArgs::new();
    args.set("name", name);
    args.set("referrals_count", stats.referrals_count);
    args.set("orders_count", stats.orders_count);
    args.set("total_amount", format_rub(stats.total_amount));
    args.set("referral_link", referral_link);
    t_args("admin.link_stats", &args)
}

pub fn links_list(links_list: &str) -> String {
    let mut args = FluentArgs::new();
    args.set("links_list", links_list);
    t_args("admin.links_list", &args)
}

pub fn no_links() -> String {
    t("admin.no_links")
}

pub fn create_referral_prompt() -> String {
    t("admin.create_prompt")
}

pub fn empty_link_name() -> String {
    t("admin.empty_name")
}

pub fn referral_created(name: &str, referral_link: &str) -> String {
    let mut args = FluentArgs::new();
    args.set("name", name);
    args.set("referral_link", referral_link);
    t_args("admin.link_created", &args)
}

pub fn create_link_failed() -> String {
    t("admin.create_failed")
}

pub fn stats_failed() -> String {
    t("admin.stats_failed")
}

pub fn access_denied() -> String {
    t("admin.access_denied")
}

// ==================== Обмен ====================

pub fn select_crypto() -> String {
    t("exchange.select_crypto")
}

pub fn enter_amount(crypto_name: &str, min_amount: f64) -> String {
    let mut args = FluentArgs::new();
    args.set("crypto_name", crypto_name);
    args.set("min_amount", format_rub_whole(min_amount));
    t_args("exchange.enter_amount", &args)
}

pub fn enter_wallet(amount_rub: f64, crypto_amount: f64, crypto_type: &str) -> String {
    let mut args = FluentArgs::new();
    args.set("amount", format_rub(amount_rub));
    args.set("crypto_amount", format_crypto(crypto_amount));
    args.set("crypto_type", crypto_type);
    t_args("exchange.enter_wallet", &args)
}

pub fn payment_details(phone: &str, bank: &str, comment: &str) -> String {
    let mut args = FluentArgs::new();
    args.set("phone", phone);
    args.set("bank", bank);
    args.set("comment", comment);
    t_args("exchange.payment_details", &args)
}

pub fn order_details(
    amount_rub: f64,
    crypto_amount: f64,
    crypto_type: &str,
    wallet_address: &str,
    payment_details: &str,
) -> String {
    let mut args = FluentArgs::new();
    args.set("amount_rub", format_rub(amount_rub));
    args.set("crypto_amount", format_crypto(crypto_amount));
    args.set("crypto_type", crypto_type);
    args.set("wallet_address", wallet_address);
    args.set("payment_details", payment_details);
    t_args("exchange.order_details", &args)
}

#[allow(clippy::too_many_arguments)]
pub fn awaiting_payment(
    order_id: i64,
    amount_rub: f64,
    crypto_amount: f64,
    crypto_type: &str,
    comment: &str,
    phone: &str,
    bank: &str,
) -> String {
    let mut args = FluentArgs::new();
    args.set("order_id", order_id);
    args.set("amount_rub", format_rub(amount_rub));
    args.set("crypto_amount", format_crypto(crypto_amount));
    args.set("crypto_type", crypto_type);
    args.set("comment", comment);
    args.set("phone", phone);
    args.set("bank", bank);
    t_args("exchange.awaiting_payment", &args)
}

pub fn order_cancelled() -> String {
    t("exchange.order_cancelled")
}

pub fn order_failed() -> String {
    t("exchange.order_failed")
}

pub fn invalid_amount() -> String {
    t("exchange.invalid_amount")
}

pub fn min_amount_error(min_amount: f64) -> String {
    let mut args = FluentArgs::new();
    args.set("min_amount", format_rub_whole(min_amount));
    t_args("exchange.min_amount_error", &args)
}

// ==================== Чеки ====================

pub fn receipt_saved() -> String {
    t("receipt.saved")
}

pub fn receipt_no_pending() -> String {
    t("receipt.no_pending")
}

pub fn receipt_save_failed() -> String {
    t("receipt.save_failed")
}

// ==================== Кнопки ====================

pub fn btn_exchange() -> String {
    t("buttons.exchange")
}

pub fn btn_admin() -> String {
    t("buttons.admin")
}

pub fn btn_support() -> String {
    t("buttons.support")
}

pub fn btn_back() -> String {
    t("buttons.back")
}

pub fn btn_main_menu() -> String {
    t("buttons.main_menu")
}

pub fn btn_confirm() -> String {
    t("buttons.confirm")
}

pub fn btn_cancel() -> String {
    t("buttons.cancel")
}

pub fn btn_stats() -> String {
    t("buttons.stats")
}

pub fn btn_links() -> String {
    t("buttons.links")
}

pub fn btn_create_link() -> String {
    t("buttons.create_link")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn groups_rub_amounts() {
        assert_eq!(format_rub(5000.0), "5,000.00");
        assert_eq!(format_rub(1_234_567.891), "1,234,567.89");
        assert_eq!(format_rub(999.0), "999.00");
        assert_eq!(format_rub(-5000.5), "-5,000.50");
    }

    #[test]
    fn groups_whole_rub_limits() {
        assert_eq!(format_rub_whole(3000.0), "3,000");
        assert_eq!(format_rub_whole(500.0), "500");
    }

    #[test]
    fn crypto_amounts_keep_8_places() {
        assert_eq!(format_crypto(55.55555556), "55.55555556");
        assert_eq!(format_crypto(0.00142857), "0.00142857");
    }

    #[test]
    fn enter_amount_renders_minimum() {
        let text = enter_amount("USDT (Tether)", 3000.0);
        assert!(text.contains("USDT (Tether)"));
        assert!(text.contains("3,000 RUB"));
    }

    #[test]
    fn min_amount_error_renders_grouped_limit() {
        assert_eq!(min_amount_error(3000.0), "❌ Минимальная сумма: 3,000 RUB");
    }

    #[test]
    fn order_details_embeds_payment_block() {
        let details = payment_details("5354 5102 0453 5214", "-", "a1b2c3d4e5");
        let text = order_details(5000.0, 55.55555556, "USDT", "TWallet", &details);

        assert!(text.contains("5,000.00 RUB"));
        assert!(text.contains("55.55555556 USDT"));
        assert!(text.contains("TWallet"));
        assert!(text.contains("a1b2c3d4e5"));
        assert!(text.contains("Обязательно укажите комментарий"));
    }

    #[test]
    fn awaiting_payment_mentions_order_number() {
        let text = awaiting_payment(7, 5000.0, 55.55555556, "USDT", "a1b2c3d4e5", "phone", "bank");
        assert!(text.contains("#7"));
        assert!(text.contains("Платеж не обнаружен"));
    }

    #[test]
    fn start_message_injects_role_welcome() {
        let admin = start_message(&admin_welcome());
        assert!(admin.contains("Супер-Администратор"));

        let user = start_message(&user_welcome());
        assert!(user.contains("нажмите <b>♻️ Обменять</b>"));
    }
}
