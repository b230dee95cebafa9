//! Suggestions for error messages

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

const MAX_SUGGESTIONS: usize = 3;

/// Known names that look like `attempted`, best match first.
///
/// Used for "did you mean?" hints when a name reference cannot be resolved.
#[must_use]
pub fn suggest_similar_names<'a>(
    attempted: &str,
    known: impl IntoIterator<Item = &'a str>,
) -> Vec<String> {
    let matcher = SkimMatcherV2::default().ignore_case();
    let mut scored: Vec<(i64, &str)> = known
        .into_iter()
        .filter(|candidate| !candidate.eq_ignore_ascii_case(attempted))
        .filter_map(|candidate| {
            matcher
                .fuzzy_match(candidate, attempted)
                .filter(|score| *score > 0)
                .map(|score| (score, candidate))
        })
        .collect();

    // Highest score first; ties broken alphabetically so output is stable
    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, name)| name.to_string())
        .collect()
}

/// Generate suggestions for invalid setting values
#[must_use]
pub fn suggest_valid_values(key: &str, valid_values: &[&str]) -> String {
    let values = valid_values
        .iter()
        .map(|v| format!("'{v}'"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("Valid values for '{key}' are: {values}")
}

/// Generate suggestions for network errors
#[must_use]
pub fn suggest_network_fix(url: &str, error: &str) -> String {
    match () {
        () if error.contains("dns") || error.contains("resolve") => {
            format!("Check that the host in '{url}' is reachable and the URL is correct")
        }
        () if error.contains("timed out") || error.contains("timeout") => {
            "Increase 'timeout_secs' in pdp.toml or check your network connection".to_string()
        }
        () if error.contains("refused") => {
            format!("The server at '{url}' refused the connection. Check if the service is running")
        }
        () => "Check your network connection and try again".to_string(),
    }
}
