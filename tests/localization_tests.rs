//! # Localization Tests
//!
//! Message retrieval, argument formatting and language fallback of the
//! bundled Russian and English translations.

use euroservice::localization::{
    all_labels, detect_language, is_language_supported, t_args_lang, t_lang, LocalizationManager,
};
use std::collections::{BTreeSet, HashMap};

const RU_SOURCE: &str = include_str!("../locales/ru/main.ftl");
const EN_SOURCE: &str = include_str!("../locales/en/main.ftl");

/// Message ids defined at the start of a line, ignoring comments and continuations
fn message_ids(source: &str) -> BTreeSet<&str> {
    source
        .lines()
        .filter(|line| line.starts_with(|c: char| c.is_ascii_lowercase()))
        .filter_map(|line| line.split_once(" =").map(|(id, _)| id.trim()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_localization() -> LocalizationManager {
        LocalizationManager::new().expect("Failed to create localization manager")
    }

    #[test]
    fn test_both_languages_define_the_same_keys() {
        let ru = message_ids(RU_SOURCE);
        let en = message_ids(EN_SOURCE);

        assert!(ru.len() > 100);
        let only_ru: Vec<_> = ru.difference(&en).collect();
        let only_en: Vec<_> = en.difference(&ru).collect();
        assert!(only_ru.is_empty(), "missing in en: {only_ru:?}");
        assert!(only_en.is_empty(), "missing in ru: {only_en:?}");
    }

    #[test]
    fn test_get_message_existing_key() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("menu-funeral", "ru", None);
        assert_eq!(message, "🏛️ Организация похорон");

        let message = manager.get_message_in_language("menu-funeral", "en", None);
        assert_eq!(message, "🏛️ Funeral arrangement");
    }

    #[test]
    fn test_get_message_nonexistent_key() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("nonexistent-key", "en", None);
        assert_eq!(message, "Missing translation: nonexistent-key");
    }

    #[test]
    fn test_unsupported_language_falls_back_to_russian() {
        let manager = setup_localization();

        let fallback = manager.get_message_in_language("button-cancel", "de", None);
        let russian = manager.get_message_in_language("button-cancel", "ru", None);
        assert_eq!(fallback, russian);
        assert_eq!(russian, "❌ Отмена");
    }

    #[test]
    fn test_get_message_with_args() {
        let manager = setup_localization();

        let message = manager.get_message_with_args("memory-candle-lit", "en", &[("count", "3")]);
        assert!(message.contains("Candles in total: 3"));

        let mut args = HashMap::new();
        args.insert("name", "Венок еловый");
        args.insert("id", "11");
        let message = manager.get_message_in_language("product-added", "ru", Some(&args));
        assert!(message.contains("Венок еловый"));
        assert!(message.contains("11"));
    }

    #[test]
    fn test_get_message_missing_args() {
        let manager = setup_localization();

        // Unresolved placeables are rendered, never a panic
        let message = manager.get_message_in_language("memory-candle-lit", "en", None);
        assert!(message.starts_with("🕯️"));
    }

    #[test]
    fn test_no_bidi_isolation_marks() {
        let message = t_args_lang("shop-selected", &[("name", "Крест"), ("price", "5 000")], Some("en"));
        assert!(!message.contains('\u{2068}'));
        assert!(!message.contains('\u{2069}'));
        assert!(message.contains("«Крест»"));
    }

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language(Some("en")), "en");
        assert_eq!(detect_language(Some("en-US")), "en");
        assert_eq!(detect_language(Some("ru")), "ru");
        assert_eq!(detect_language(Some("uk")), "ru");
        assert_eq!(detect_language(None), "ru");

        assert!(is_language_supported("ru"));
        assert!(is_language_supported("en"));
        assert!(!is_language_supported("fr"));
    }

    #[test]
    fn test_t_lang_uses_telegram_language_code() {
        assert_eq!(t_lang("button-skip", Some("en-GB")), "⏭️ Skip");
        assert_eq!(t_lang("button-skip", None), "⏭️ Пропустить");
    }

    #[test]
    fn test_all_labels_lists_every_language() {
        let labels = all_labels("button-cancel");
        assert_eq!(labels.len(), 2);
        assert!(labels.contains(&"❌ Отмена".to_string()));
        assert!(labels.contains(&"❌ Cancel".to_string()));
    }
}
