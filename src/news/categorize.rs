/// Category assigned when no keyword matches.
pub const GENERAL: &str = "General";

/// Ordered keyword table; the first category with any matching keyword wins.
pub const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Drug Launch",
        &[
            "launch",
            "launched",
            "approved",
            "approval",
            "fda approved",
            "new drug",
            "marketed",
            "clearance",
            "nda",
            "bla",
        ],
    ),
    (
        "Innovation",
        &[
            "discovery",
            "breakthrough",
            "innovation",
            "research",
            "clinical trial",
            "phase 1",
            "phase 2",
            "phase 3",
            "study",
            "data",
            "results",
        ],
    ),
    (
        "Events",
        &[
            "conference",
            "event",
            "summit",
            "webinar",
            "meeting",
            "symposium",
            "congress",
            "asco",
            "aha",
            "esc",
        ],
    ),
    (
        "Acquisition",
        &[
            "acquisition",
            "acquires",
            "merger",
            "deal",
            "partnership",
            "collaboration",
            "agreement",
            "license",
        ],
    ),
    (
        "Earnings",
        &[
            "earnings",
            "revenue",
            "quarterly",
            "financial results",
            "q1",
            "q2",
            "q3",
            "q4",
            "guidance",
        ],
    ),
];

/// Pick a category by plain substring match over lowercased title and summary.
pub fn categorize(title: &str, summary: &str) -> &'static str {
    let text = format!("{} {}", title, summary).to_lowercase();

    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| text.contains(kw)))
        .map(|(category, _)| *category)
        .unwrap_or(GENERAL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_by_title() {
        assert_eq!(categorize("FDA approves new drug", ""), "Drug Launch");
        assert_eq!(categorize("Amgen to present at summit", ""), "Events");
        assert_eq!(categorize("Bayer acquires biotech", ""), "Acquisition");
        assert_eq!(categorize("Roche beats Q3 estimates", ""), "Earnings");
    }

    #[test]
    fn test_categorize_uses_summary() {
        assert_eq!(
            categorize("Sanofi update", "Phase 3 trial meets endpoint"),
            "Innovation"
        );
    }

    #[test]
    fn test_table_order_wins() {
        // Matches both "Drug Launch" (approval) and "Earnings" (revenue).
        assert_eq!(
            categorize("Approval lifts revenue outlook", ""),
            "Drug Launch"
        );
    }

    #[test]
    fn test_substring_matching_is_not_word_bound() {
        // "esc" inside "escalates" still counts, as a plain substring.
        assert_eq!(categorize("Dispute escalates", ""), "Events");
    }

    #[test]
    fn test_general_fallback() {
        assert_eq!(categorize("CEO comments on weather", ""), GENERAL);
    }
}
