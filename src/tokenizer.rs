//! Field-specific splitting. Every splitter lowercases its output.

/// Split a URL on every run of non-word characters. Word characters are ASCII
/// letters, digits and `_`; anything else separates tokens.
pub fn split_url(url: &str) -> Vec<String> {
    url.chars()
        .fold(vec![String::new()], |mut tokens, c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                if let Some(last) = tokens.last_mut() {
                    last.push(c.to_ascii_lowercase());
                }
            } else if tokens.last().map_or(false, |s| !s.is_empty()) {
                tokens.push(String::new());
            }
            tokens
        })
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect()
}

/// Split title, header or anchor text on whitespace
pub fn split_text(text: &str) -> Vec<String> {
    text.split_whitespace().map(|t| t.to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_url() {
        let tokens = split_url("http://www.Stanford.edu/class/cs_276/index.html");
        assert_eq!(
            tokens,
            vec!["http", "www", "stanford", "edu", "class", "cs_276", "index", "html"]
        );
    }

    #[test]
    fn test_split_url_non_ascii_separates() {
        assert_eq!(split_url("http://Café.fr/naïve"), vec!["http", "caf", "fr", "na", "ve"]);
    }

    #[test]
    fn test_split_text() {
        assert_eq!(split_text("  Stanford\tUniversity  Home "), vec!["stanford", "university", "home"]);
        assert!(split_text("").is_empty());
    }
}
