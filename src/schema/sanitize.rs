use unicode_general_category::{get_general_category, GeneralCategory};

/// Reduce an arbitrary string to a well-formed SQL identifier.
///
/// The first character must be a letter or underscore and is replaced with
/// `_` otherwise. Later characters are kept when they are letters, digits,
/// marks, connector punctuation or format characters; a space makes the
/// next kept character uppercase; anything else is dropped. The function is
/// idempotent.
pub(crate) fn sanitize_identifier(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => out.push(first),
        _ => out.push('_'),
    }

    let mut capitalize_next = false;

    for c in chars {
        if c == ' ' {
            capitalize_next = true;
        } else if is_kept(c) {
            if capitalize_next {
                out.extend(c.to_uppercase());
                capitalize_next = false;
            } else {
                out.push(c);
            }
        }
        // every other character is dropped
    }

    out
}

// Letters and digits, plus the Mark, Connector_Punctuation and Format
// general categories; combining diacritics and joiners inside a name
// survive, so distinct names stay distinct.
fn is_kept(c: char) -> bool {
    if c.is_alphanumeric() || c == '_' {
        return true;
    }

    matches!(
        get_general_category(c),
        GeneralCategory::NonspacingMark
            | GeneralCategory::SpacingMark
            | GeneralCategory::EnclosingMark
            | GeneralCategory::ConnectorPunctuation
            | GeneralCategory::Format
    )
}

/// Quote an identifier for SQL text: `"…"` with doubled inner quotes.
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_character_is_letter_or_underscore() {
        assert_eq!(sanitize_identifier("name"), "name");
        assert_eq!(sanitize_identifier("_name"), "_name");
        assert_eq!(sanitize_identifier("1name"), "_name");
        assert_eq!(sanitize_identifier(""), "_");
    }

    #[test]
    fn spaces_capitalize_the_next_character() {
        assert_eq!(sanitize_identifier("first name"), "firstName");
        assert_eq!(sanitize_identifier("a  b"), "aB");
        assert_eq!(sanitize_identifier("order  by col"), "orderByCol");
    }

    #[test]
    fn punctuation_is_dropped() {
        assert_eq!(sanitize_identifier("user-id"), "userid");
        assert_eq!(sanitize_identifier("a.b.c"), "abc");
        assert_eq!(sanitize_identifier("tag(1)"), "tag1");
    }

    #[test]
    fn marks_joiners_and_connectors_are_kept() {
        // combining acute accent (Mn)
        assert_eq!(sanitize_identifier("re\u{0301}sume"), "re\u{0301}sume");

        // zero-width joiner (Cf)
        assert_eq!(sanitize_identifier("a\u{200D}b"), "a\u{200D}b");

        // undertie (Pc)
        assert_eq!(sanitize_identifier("a\u{203F}b"), "a\u{203F}b");

        // names differing only in such characters stay distinct
        assert_ne!(sanitize_identifier("a\u{200D}b"), sanitize_identifier("ab"));
        assert_ne!(sanitize_identifier("re\u{0301}sume"), sanitize_identifier("resume"));
    }

    #[test]
    fn sanitize_is_idempotent() {
        for raw in [
            "first name",
            "1name",
            "user-id",
            "tag(1)",
            "Ω mega",
            "a  b",
            "re\u{0301}sume",
            "a\u{200D}b",
        ] {
            let once = sanitize_identifier(raw);
            assert_eq!(sanitize_identifier(&once), once, "{raw:?}");
        }
    }

    #[test]
    fn quoting_doubles_inner_quotes() {
        assert_eq!(quote_identifier("plain"), "\"plain\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }
}
