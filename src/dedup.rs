use std::collections::HashSet;

use crate::models::CandidateRecord;

/// Keeps candidates whose title is not already in the store. Exact
/// string comparison, no normalization: a re-published listing with a
/// slightly different title counts as new.
pub fn filter_new(
    candidates: Vec<CandidateRecord>,
    existing_titles: &HashSet<String>,
) -> Vec<CandidateRecord> {
    candidates
        .into_iter()
        .filter(|candidate| !existing_titles.contains(&candidate.title))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(title: &str) -> CandidateRecord {
        CandidateRecord {
            title: title.to_string(),
            url: format!("https://example.com/{}", title),
            max_monthly: 0,
            captured_on: "2026/08/30".to_string(),
        }
    }

    #[test]
    fn drops_known_titles_only() {
        let existing: HashSet<String> = ["A".to_string()].into_iter().collect();
        let fresh = filter_new(vec![candidate("A"), candidate("B")], &existing);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].title, "B");
    }

    #[test]
    fn comparison_is_exact() {
        let existing: HashSet<String> = ["Backend Engineer".to_string()].into_iter().collect();
        let fresh = filter_new(vec![candidate("backend engineer")], &existing);
        assert_eq!(fresh.len(), 1);
    }

    #[test]
    fn filtering_twice_changes_nothing() {
        let existing: HashSet<String> = ["A".to_string(), "C".to_string()].into_iter().collect();
        let once = filter_new(vec![candidate("A"), candidate("B"), candidate("C")], &existing);
        let titles: Vec<String> = once.iter().map(|c| c.title.clone()).collect();
        let twice = filter_new(once, &existing);
        let titles_again: Vec<String> = twice.iter().map(|c| c.title.clone()).collect();
        assert_eq!(titles, titles_again);
    }
}
