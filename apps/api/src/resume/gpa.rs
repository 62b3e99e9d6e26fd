//! Regex fast path for GPA.

use std::sync::LazyLock;

use regex::Regex;

static GPA_LABELLED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bGPA\b[^0-9]{0,20}([0-4]\.\d{1,2})").unwrap());

static GPA_OUT_OF_FOUR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-4]\.\d{1,2})\s*/\s*4\.0").unwrap());

/// Finds a GPA in resume text: first a value shortly after the word "GPA",
/// then any `X.XX / 4.0`.
pub fn find_gpa(text: &str) -> Option<String> {
    GPA_LABELLED
        .captures(text)
        .or_else(|| GPA_OUT_OF_FOUR.captures(text))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Whether a field question is unambiguously asking for a GPA.
pub fn asks_for_gpa(question: &str) -> bool {
    let q = question.to_lowercase();
    q.contains("grade point")
        || q
            .split(|c: char| !c.is_ascii_alphanumeric())
            .any(|word| word == "gpa")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labelled_gpa() {
        assert_eq!(find_gpa("B.S. Computer Science, GPA: 3.85").as_deref(), Some("3.85"));
        assert_eq!(find_gpa("Cumulative gpa of 3.9").as_deref(), Some("3.9"));
    }

    #[test]
    fn test_out_of_four() {
        assert_eq!(find_gpa("Graduated with 3.72 / 4.0").as_deref(), Some("3.72"));
        assert_eq!(find_gpa("3.5/4.0 overall").as_deref(), Some("3.5"));
    }

    #[test]
    fn test_labelled_wins_over_out_of_four() {
        assert_eq!(
            find_gpa("Major 3.95/4.0; overall GPA 3.61").as_deref(),
            Some("3.61")
        );
    }

    #[test]
    fn test_no_gpa() {
        assert_eq!(find_gpa("Led a team of 5 engineers over 3 years"), None);
        assert_eq!(find_gpa("GPA withheld at the request of the candidate 12"), None);
    }

    #[test]
    fn test_asks_for_gpa() {
        assert!(asks_for_gpa("What is your GPA?"));
        assert!(asks_for_gpa("Cumulative Grade Point Average"));
        assert!(asks_for_gpa("undergrad_gpa"));
        assert!(!asks_for_gpa("Are you a GPAX member"));
        assert!(!asks_for_gpa("Email"));
    }
}
