//! Response quality assessment (§4.8.3, §4.8.4). A pure function of the
//! response text: same input always yields the same [`QualityAssessment`].

use scheduler_kernel::task::{ExtractedInfo, QualityAssessment, QualityFlags};

const SUBSTANTIAL_LENGTH_THRESHOLD: usize = 240;

const ACKNOWLEDGMENT_PHRASES: &[&str] = &[
    "i acknowledge",
    "got it",
    "understood",
    "i've noted",
    "i have noted",
    "noted",
    "sure thing",
    "i understand",
];

const SUPPORTIVE_PHRASES: &[&str] = &["i'm here to help", "im here to help", "let's", "lets", "we can"];

/// Scores an Agent response and extracts the structured record consumed by
/// dispatch/UX layers.
pub fn assess(response: &str) -> QualityAssessment {
    let lower = response.to_lowercase();

    let has_acknowledgment = ACKNOWLEDGMENT_PHRASES.iter().any(|p| lower.contains(p));
    let has_actions = has_imperative_or_numbered_step(&lower);
    let is_structured = has_numbered_list(response) || has_bulleted_list(response);
    let has_encouragement = SUPPORTIVE_PHRASES.iter().any(|p| lower.contains(p));
    let response_length = response.chars().count();
    let has_summary = lower.contains("summary") || lower.contains("to summarize") || lower.contains("in summary");

    let flags = QualityFlags {
        acknowledgment: has_acknowledgment,
        actionable_advice: has_actions,
        structured_format: is_structured,
        supportive_tone: has_encouragement,
        substantial_response: response_length >= SUBSTANTIAL_LENGTH_THRESHOLD,
    };

    let extracted = ExtractedInfo {
        has_acknowledgment,
        has_actions,
        has_summary,
        has_encouragement,
        is_structured,
        response_length,
    };

    QualityAssessment { flags, extracted }
}

fn has_numbered_list(text: &str) -> bool {
    text.lines().any(|line| {
        let trimmed = line.trim_start();
        let mut chars = trimmed.chars();
        let mut saw_digit = false;
        for c in chars.by_ref() {
            if c.is_ascii_digit() {
                saw_digit = true;
            } else {
                return saw_digit && (c == '.' || c == ')');
            }
        }
        false
    })
}

fn has_bulleted_list(text: &str) -> bool {
    text.lines().any(|line| {
        let trimmed = line.trim_start();
        trimmed.starts_with("- ") || trimmed.starts_with("* ") || trimmed.starts_with("• ")
    })
}

fn has_imperative_or_numbered_step(lower: &str) -> bool {
    const IMPERATIVE_VERBS: &[&str] = &[
        "try ", "consider", "make sure", "remember to", "schedule ", "prepare ", "send ", "call ",
        "check ", "review ", "follow up",
    ];
    IMPERATIVE_VERBS.iter().any(|v| lower.contains(v)) || has_numbered_list(lower) || has_bulleted_list(lower)
}
