use std::collections::HashMap;

use fluent_templates::{
    fluent_bundle::{FluentArgs, FluentValue},
    static_loader, Loader,
};
use once_cell::sync::Lazy;
use unic_langid::LanguageIdentifier;

static_loader! {
    static LOCALES = {
        locales: "./locales",
        fallback_language: "ru",
        customise: |bundle| bundle.set_use_isolating(false),
    };
}

/// The bot speaks Russian; the fluent layer is the extension point for
/// further locales.
static DEFAULT_LANG: Lazy<LanguageIdentifier> = Lazy::new(|| "ru".parse().unwrap());

/// Returns a localized string for the given key.
/// Unknown keys render as the key itself so a missing translation never
/// breaks a handler.
/// Converts literal `\n` sequences to actual newlines for proper Telegram formatting.
pub fn t(key: &str) -> String {
    let text = LOCALES.lookup(&DEFAULT_LANG, key).unwrap_or_else(|| {
        log::warn!("Unknown text key: {}", key);
        key.to_string()
    });
    text.replace("\\n", "\n")
}

/// Returns a localized string with arguments for interpolation.
/// Converts literal `\n` sequences to actual newlines for proper Telegram formatting.
pub fn t_args(key: &str, args: &FluentArgs) -> String {
    let args_map: HashMap<String, FluentValue> = args.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();

    let text = LOCALES.lookup_with_args(&DEFAULT_LANG, key, &args_map).unwrap_or_else(|| {
        log::warn!("Unknown text key: {}", key);
        key.to_string()
    });
    text.replace("\\n", "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_known_translation() {
        assert_eq!(t("exchange.select_crypto"), "💰 <b>Выберите криптовалюту:</b>");
    }

    #[test]
    fn unknown_key_falls_open_to_the_key_itself() {
        assert_eq!(t("no.such_key"), "no.such_key");
    }

    #[test]
    fn converts_newlines() {
        let text = t("support.text");

        // Should contain actual newlines, not literal \n
        assert!(text.contains('\n'));
        assert!(!text.contains("\\n"));
    }

    #[test]
    fn interpolates_arguments() {
        let mut args = FluentArgs::new();
        args.set("min_amount", "3,000");
        let text = t_args("exchange.min_amount_error", &args);
        assert_eq!(text, "❌ Минимальная сумма: 3,000 RUB");
    }
}
