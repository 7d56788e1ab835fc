//! Placeholder token handling for translated text.
//!
//! Template values are delimited by a literal `[` and the next `]` (e.g.
//! `"Hi [name]!"`). They must survive translation byte-for-byte. Extraction
//! is non-recursive: a token's captured text runs only to the first `]`, so
//! `"[a[b]"` yields the single token `a[b`. That quirk is part of the
//! observed contract and is preserved deliberately.

use regex::Regex;
use std::sync::OnceLock;

static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

fn placeholder_regex() -> &'static Regex {
    PLACEHOLDER_REGEX.get_or_init(|| Regex::new(r"\[([^\]]+)\]").unwrap())
}

/// Extract every placeholder token from `text`, in order of appearance.
///
/// Returned values are the token interiors, without the brackets.
pub fn extract_placeholders(text: &str) -> Vec<String> {
    placeholder_regex()
        .captures_iter(text)
        .filter_map(|captures| captures.get(1))
        .map(|token| token.as_str().to_string())
        .collect()
}

/// Bracketed tokens currently present in `text`, brackets included.
fn bracketed_tokens(text: &str) -> Vec<String> {
    placeholder_regex()
        .find_iter(text)
        .map(|token| token.as_str().to_string())
        .collect()
}

/// Best-effort restoration of the original placeholder tokens in a
/// translated string.
///
/// For each token extracted from `original`, in order: if the literal
/// bracketed token survived in `translated`, leave it alone. Otherwise
/// replace the bracketed token at the same ordinal position in the
/// translated text, once. When the translated text has fewer bracketed
/// tokens than the original had placeholders, the excess originals are
/// silently dropped. This is a repair, not a guarantee.
pub fn restore_placeholders(original: &str, translated: &str) -> String {
    let placeholders = extract_placeholders(original);
    if placeholders.is_empty() {
        return translated.to_string();
    }

    let mut result = translated.to_string();
    for (position, value) in placeholders.iter().enumerate() {
        let placeholder = format!("[{}]", value);
        if result.contains(&placeholder) {
            continue;
        }

        // Re-scan on every repair: earlier replacements shift what the
        // translated text contains.
        let present = bracketed_tokens(&result);
        if let Some(mangled) = present.get(position) {
            result = result.replacen(mangled.as_str(), &placeholder, 1);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Extraction Tests ====================

    #[test]
    fn test_extract_single_placeholder() {
        assert_eq!(extract_placeholders("Hi [name]!"), vec!["name"]);
    }

    #[test]
    fn test_extract_multiple_placeholders_in_order() {
        assert_eq!(
            extract_placeholders("[greeting], [name]! You have [count] items."),
            vec!["greeting", "name", "count"]
        );
    }

    #[test]
    fn test_extract_none() {
        assert!(extract_placeholders("Plain text, no tokens.").is_empty());
        assert!(extract_placeholders("").is_empty());
    }

    #[test]
    fn test_extract_stops_at_first_closing_bracket() {
        // Non-recursive scan: the token runs to the first `]`
        assert_eq!(extract_placeholders("[a[b]"), vec!["a[b"]);
        assert_eq!(extract_placeholders("x [outer [inner] rest"), vec!["outer [inner"]);
    }

    #[test]
    fn test_extract_ignores_empty_brackets() {
        assert!(extract_placeholders("empty [] brackets").is_empty());
    }

    #[test]
    fn test_extract_unclosed_bracket() {
        assert!(extract_placeholders("dangling [token").is_empty());
    }

    // ==================== Restoration Tests ====================

    #[test]
    fn test_restore_leaves_intact_tokens_alone() {
        let restored = restore_placeholders("Hi [name]!", "¡Hola [name]!");
        assert_eq!(restored, "¡Hola [name]!");
    }

    #[test]
    fn test_restore_repairs_translated_token_by_position() {
        // Engine translated the token interior; positional repair restores it
        let restored = restore_placeholders("Hi [name]!", "¡Hola [nombre]!");
        assert_eq!(restored, "¡Hola [name]!");
    }

    #[test]
    fn test_restore_repairs_multiple_positions() {
        let restored = restore_placeholders(
            "[greeting], you have [count] new messages",
            "[saludo], tienes [cantidad] mensajes nuevos",
        );
        assert_eq!(restored, "[greeting], tienes [count] mensajes nuevos");
    }

    #[test]
    fn test_restore_mixed_intact_and_mangled() {
        let restored = restore_placeholders(
            "[greeting] [name]",
            "[saludo] [name]",
        );
        // Position 0 repaired; [name] survived and stays put
        assert_eq!(restored, "[greeting] [name]");
    }

    #[test]
    fn test_restore_drops_excess_placeholders_silently() {
        // Translation lost a bracketed token entirely: nothing to repair at
        // that position, the original token is not reinserted
        let restored = restore_placeholders("Hi [first] [second]!", "¡Hola [primero]!");
        assert_eq!(restored, "¡Hola [first]!");
        assert!(!restored.contains("[second]"));
    }

    #[test]
    fn test_restore_no_placeholders_returns_translation_unchanged() {
        let restored = restore_placeholders("Hello world", "Hola mundo [extra]");
        assert_eq!(restored, "Hola mundo [extra]");
    }

    #[test]
    fn test_restore_output_always_contains_original_token_when_one_survives() {
        // Whatever the engine did around it, "[name]" comes back as long
        // as some bracketed token exists at its position
        for engine_output in [
            "¡Hola [name]!",
            "¡Hola [nombre]!",
            "[nombre] dice hola",
            "prefix [x] suffix",
        ] {
            let restored = restore_placeholders("Hi [name]!", engine_output);
            assert!(
                restored.contains("[name]"),
                "expected [name] in {:?}",
                restored
            );
        }
    }

    #[test]
    fn test_restore_replaces_first_occurrence_of_mangled_token() {
        // Repair rewrites the first textual occurrence of the positional
        // token, once
        let restored = restore_placeholders("[a] [b]", "[x] [x]");
        assert_eq!(restored, "[a] [b]");
    }
}
