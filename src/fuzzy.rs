//! Approximate name matching
//!
//! Scores how well a query (the scraped item name) is contained in a
//! candidate (a listing title). 0.0 is a perfect match, 1.0 shares nothing.

use strsim::normalized_levenshtein;

/// Fuzzy score of `candidate` against `query` in `[0.0, 1.0]`.
///
/// Each query token is paired with its closest candidate token by
/// normalised Levenshtein similarity; similarities are averaged, weighted
/// by query token length. Candidate tokens with no counterpart in the query
/// cost nothing, so `"Laphroaig 10"` scores 0.0 against
/// `"Laphroaig 10 Year Old"`.
///
/// Short tokens carry little weight, so names that differ only in an age
/// statement still match: `"Laphroaig 10 Year"` scores about 0.13 against
/// `"Laphroaig 25 Year"`.
pub fn score(query: &str, candidate: &str) -> f64 {
    let query_tokens = tokenize(query);
    let candidate_tokens = tokenize(candidate);
    if query_tokens.is_empty() || candidate_tokens.is_empty() {
        return 1.0;
    }

    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    for token in &query_tokens {
        let best = candidate_tokens
            .iter()
            .map(|other| normalized_levenshtein(token, other))
            .fold(0.0_f64, f64::max);
        let weight = token.chars().count() as f64;
        weighted += best * weight;
        total_weight += weight;
    }

    (1.0 - weighted / total_weight).clamp(0.0, 1.0)
}

/// Lower-case alphanumeric tokens, split where digits meet letters.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for word in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let mut current = String::new();
        let mut current_is_digit = None;
        for c in word.chars() {
            let is_digit = c.is_ascii_digit();
            if current_is_digit.is_some_and(|d| d != is_digit) {
                tokens.push(std::mem::take(&mut current));
            }
            current.push(c);
            current_is_digit = Some(is_digit);
        }
        if !current.is_empty() {
            tokens.push(current);
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("Laphroaig 10YO, Single-Malt"), vec!["laphroaig", "10", "yo", "single", "malt"]);
        assert_eq!(tokenize("  "), Vec::<String>::new());
    }

    #[test]
    fn test_identical_and_contained_names_score_zero() {
        assert_eq!(score("Laphroaig 10 Year", "Laphroaig 10 Year"), 0.0);
        assert_eq!(score("Laphroaig 10 Year", "laphroaig 10 year old"), 0.0);
        assert_eq!(score("10 Year Laphroaig", "Laphroaig 10 Year"), 0.0);
    }

    #[test]
    fn test_minor_variations_stay_below_threshold() {
        assert!(score("Laphroaig 10 Year", "Laphroaig 10YO Single Malt") < 0.4);
        assert!(score("Lagavulin 16", "Lagavullin 16 Year Old") < 0.4);
    }

    #[test]
    fn test_age_statement_alone_barely_moves_score() {
        let age = score("Laphroaig 10 Year", "Laphroaig 25 Year");
        assert!((age - 2.0 / 15.0).abs() < 1e-9);
        assert!(score("Glenfiddich 12 Year", "Glenfiddich 18 Year") < 0.1);
    }

    #[test]
    fn test_unrelated_names_score_high() {
        assert!(score("Laphroaig 10 Year", "Glenfiddich 12") >= 0.4);
        assert!(score("Glenlivet 12", "Glenfiddich 12") >= 0.4);
    }

    #[test]
    fn test_empty_inputs_score_one() {
        assert_eq!(score("", "Laphroaig"), 1.0);
        assert_eq!(score("Laphroaig", "---"), 1.0);
    }

    #[test]
    fn test_score_is_bounded() {
        for (a, b) in [("a", "zzzz"), ("Ardbeg", "Ardbeg"), ("1", "2")] {
            let s = score(a, b);
            assert!((0.0..=1.0).contains(&s), "{a} vs {b} scored {s}");
        }
    }
}
