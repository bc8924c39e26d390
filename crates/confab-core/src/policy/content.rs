//! Content policy screening for outgoing user text.
//!
//! A case-insensitive substring match against a fixed denylist. The engine
//! applies this to authenticated senders only: guest traffic is bounded by
//! the quota gate instead. That asymmetry is a recorded policy decision,
//! not an accident -- see DESIGN.md before changing it.

/// Terms that block a message outright.
const BANNED_TERMS: [&str; 5] = ["kill", "suicide", "bomb", "terrorist", "hate speech"];

/// Outcome of screening one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screening {
    Allowed,
    /// The denylist term that matched.
    Blocked { term: &'static str },
}

impl Screening {
    pub fn allowed(&self) -> bool {
        matches!(self, Screening::Allowed)
    }
}

/// Case-insensitive substring matcher over the fixed denylist.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentFilter;

impl ContentFilter {
    /// Screen one outgoing message. No side effects on either outcome;
    /// reporting a blocked message is the caller's job.
    pub fn screen(&self, text: &str) -> Screening {
        let lower = text.to_lowercase();
        for term in BANNED_TERMS {
            if lower.contains(term) {
                return Screening::Blocked { term };
            }
        }
        Screening::Allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_allowed() {
        let filter = ContentFilter;
        assert_eq!(filter.screen("what's the weather like"), Screening::Allowed);
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let filter = ContentFilter;
        assert_eq!(
            filter.screen("how to build a BoMb"),
            Screening::Blocked { term: "bomb" }
        );
    }

    #[test]
    fn test_substring_inside_word_matches() {
        // Substring semantics, same as the stored-history policy: "skill"
        // contains "kill" and is blocked.
        let filter = ContentFilter;
        assert_eq!(
            filter.screen("teach me a new skill"),
            Screening::Blocked { term: "kill" }
        );
    }

    #[test]
    fn test_multiword_term_matches_as_phrase() {
        let filter = ContentFilter;
        assert_eq!(
            filter.screen("that sounds like Hate Speech to me"),
            Screening::Blocked { term: "hate speech" }
        );
        assert!(filter.screen("I hate giving speeches").allowed());
    }
}
