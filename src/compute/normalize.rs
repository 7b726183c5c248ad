//! Normalization of raw source names into key fragments.
//!
//! The coordinate and population datasets spell the same town differently
//! ("St Ouen" vs "Saint-Ouen", "L'Haÿ-les-Roses" vs "l hay les roses"). Each
//! dataset gets its own normalizer so both converge on one fragment. Both
//! functions are total and deterministic.

use deunicode::deunicode;

/// Normalize a name from the coordinate dataset.
///
/// Lowercases, expands the abbreviations `st` and `ste` to `saint` and
/// `sainte` when they stand as a word followed by another word, and joins
/// the whitespace-separated tokens with `-`.
///
/// # Examples
///
/// ```rust
/// use cityindex::compute::normalize::normalize_geo_name;
///
/// assert_eq!(normalize_geo_name("st ouen"), "saint-ouen");
/// assert_eq!(normalize_geo_name("Saint Ouen"), "saint-ouen");
/// assert_eq!(normalize_geo_name("ouest"), "ouest");
/// ```
pub fn normalize_geo_name(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let tokens: Vec<&str> = lowered.split_whitespace().collect();
    let last = tokens.len().saturating_sub(1);

    tokens
        .iter()
        .enumerate()
        .map(|(i, token)| match *token {
            "st" if i < last => "saint",
            "ste" if i < last => "sainte",
            other => other,
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Normalize a town name from the population dataset.
///
/// Folds accents to ASCII, lowercases, turns apostrophes into word breaks and
/// joins the whitespace-separated tokens with `-`.
///
/// # Examples
///
/// ```rust
/// use cityindex::compute::normalize::normalize_population_name;
///
/// assert_eq!(normalize_population_name("L'Haÿ-les-Roses"), "l-hay-les-roses");
/// assert_eq!(normalize_population_name("Évry Courcouronnes"), "evry-courcouronnes");
/// ```
pub fn normalize_population_name(raw: &str) -> String {
    let folded = deunicode(&raw.replace('\'', " ")).to_lowercase();
    // Typographic apostrophes only become ASCII after folding.
    let folded = folded.replace('\'', " ");
    folded.split_whitespace().collect::<Vec<_>>().join("-")
}
