use serde::{Deserialize, Serialize};

/// Normalize a category label so that differently-typed spellings of the same
/// label land in one group.
///
/// Surrounding whitespace is trimmed, inner runs of whitespace collapse to a
/// single space, and each word is title-cased: the first letter after any
/// non-letter is upper-cased, every other letter is lower-cased.
/// Accents are kept, so `"SAÚDE"` and `"saúde"` both become `"Saúde"`.
pub fn canonical_category(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_is_letter = false;

    for word in raw.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
            prev_is_letter = false;
        }
        for ch in word.chars() {
            if ch.is_alphabetic() {
                if prev_is_letter {
                    out.extend(ch.to_lowercase());
                } else {
                    out.extend(ch.to_uppercase());
                }
                prev_is_letter = true;
            } else {
                out.push(ch);
                prev_is_letter = false;
            }
        }
    }

    out
}

/// Which categories a comparison looks at.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "category")]
pub enum CategoryFilter {
    #[default]
    All,
    /// Holds the canonical form of the selected category.
    Only(String),
}

impl CategoryFilter {
    /// Build a filter from operator input. `None`, an empty string, `all` and
    /// `todos` select every category.
    pub fn from_input(input: Option<&str>) -> Self {
        match input.map(str::trim) {
            None | Some("") => CategoryFilter::All,
            Some(s) if s.eq_ignore_ascii_case("all") || s.eq_ignore_ascii_case("todos") => {
                CategoryFilter::All
            }
            Some(s) => CategoryFilter::Only(canonical_category(s)),
        }
    }

    /// Check a record's raw category against the filter.
    pub fn matches(&self, raw_category: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(canonical) => canonical_category(raw_category) == *canonical,
        }
    }
}

impl std::fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CategoryFilter::All => write!(f, "all"),
            CategoryFilter::Only(category) => write!(f, "{}", category),
        }
    }
}
