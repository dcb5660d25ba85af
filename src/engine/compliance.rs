/// Case-insensitive title denylist. Titles that are empty fail closed.
#[derive(Debug, Clone)]
pub struct ComplianceFilter {
    keywords: Vec<String>,
}

impl ComplianceFilter {
    pub fn new(keywords: &[String]) -> Self {
        let keywords = keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        Self { keywords }
    }

    pub fn is_excluded(&self, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() {
            return true;
        }

        let title_lower = title.to_lowercase();
        self.keywords.iter().any(|k| title_lower.contains(k.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> ComplianceFilter {
        ComplianceFilter::new(&["Taiwan".to_string(), "台灣".to_string()])
    }

    #[test]
    fn test_case_insensitive_substring() {
        let filter = filter();
        assert!(filter.is_excluded("Will China blockade TAIWAN in 2026?"));
        assert!(filter.is_excluded("taiwanese election turnout"));
        assert!(filter.is_excluded("台灣大選"));
        assert!(!filter.is_excluded("Will the Fed cut rates?"));
    }

    #[test]
    fn test_empty_title_fails_closed() {
        let filter = filter();
        assert!(filter.is_excluded(""));
        assert!(filter.is_excluded("   "));
    }

    #[test]
    fn test_blank_keywords_are_ignored() {
        let filter = ComplianceFilter::new(&["".to_string(), "  ".to_string()]);
        assert!(!filter.is_excluded("Anything goes"));
    }
}
