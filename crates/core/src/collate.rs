//! String collation for sort keys and group labels.
//!
//! Orders by base letters first, so accented labels sit next to their
//! unaccented forms (`"E" < "é" < "f"`), then by accents, then by case.

use std::cmp::Ordering;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lowercased base letters: canonical decomposition with combining marks
/// dropped.
fn base_letters(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

/// Lowercased composed form; unaccented letters sort before accented ones.
fn folded_case(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfc().flat_map(char::to_lowercase)
}

/// Compare two strings ignoring case. Strings that differ only in case are
/// equal, which lets a stable sort keep their input order.
pub fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(base_letters(b))
        .then_with(|| folded_case(a).cmp(folded_case(b)))
}

/// Total order for display labels.
///
/// Case-insensitive first; on a case-only difference the lowercase form
/// sorts first (`"a" < "A" < "b"`), then raw code points break any
/// remaining tie.
pub fn compare_locale(a: &str, b: &str) -> Ordering {
    compare_ignore_case(a, b)
        .then_with(|| {
            a.nfc()
                .map(char::is_uppercase)
                .cmp(b.nfc().map(char::is_uppercase))
        })
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted<'a>(mut labels: Vec<&'a str>) -> Vec<&'a str> {
        labels.sort_by(|a, b| compare_locale(a, b));
        labels
    }

    #[test]
    fn ignore_case_treats_case_variants_as_equal() {
        assert_eq!(compare_ignore_case("Finance", "finance"), Ordering::Equal);
        assert_eq!(compare_ignore_case("ÉTUDES", "études"), Ordering::Equal);
        assert_eq!(compare_ignore_case("apple", "Banana"), Ordering::Less);
        assert_eq!(compare_ignore_case("Zeta", "alpha"), Ordering::Greater);
    }

    #[test]
    fn locale_orders_lowercase_before_uppercase() {
        assert_eq!(
            sorted(vec!["b", "B", "A", "a", "Unassigned", "HR"]),
            vec!["a", "A", "b", "B", "HR", "Unassigned"]
        );
    }

    #[test]
    fn locale_orders_numbers_as_text() {
        assert_eq!(sorted(vec!["2024", "10", "9"]), vec!["10", "2024", "9"]);
    }

    #[test]
    fn accented_labels_sort_with_their_base_letter() {
        assert_eq!(
            sorted(vec!["", "Unassigned", "é", "f", "E"]),
            vec!["", "E", "é", "f", "Unassigned"]
        );
        assert_eq!(
            sorted(vec!["Zoë", "Études", "Emile", "Émile", "Finance"]),
            vec!["Emile", "Émile", "Études", "Finance", "Zoë"]
        );
    }

    #[test]
    fn decomposed_and_composed_forms_compare_equal_ignoring_case() {
        // "é" precomposed vs "e" + combining acute.
        assert_eq!(compare_ignore_case("\u{e9}cole", "e\u{301}cole"), Ordering::Equal);
    }

    #[test]
    fn locale_is_total_for_distinct_strings() {
        assert_ne!(compare_locale("Ab", "aB"), Ordering::Equal);
        assert_ne!(compare_locale("\u{e9}", "e\u{301}"), Ordering::Equal);
    }
}
