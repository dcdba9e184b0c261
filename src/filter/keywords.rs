use std::collections::HashSet;

/// Returns every word of `reason` that is a keyword, in order of appearance
///
/// Words are whitespace-delimited and compared exactly, so `ice` does not
/// match `icing`. A keyword appearing twice is returned twice.
pub fn keyword_hits<'a>(reason: Option<&'a str>, keywords: &HashSet<String>) -> Vec<&'a str> {
    let Some(reason) = reason else {
        return Vec::new();
    };

    reason
        .split_whitespace()
        .filter(|word| keywords.contains(*word))
        .collect()
}
