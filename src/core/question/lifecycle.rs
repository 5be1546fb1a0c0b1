//! Transcript consolidation and text normalization for the question
//! lifecycle.

use super::state::CurrentQuestion;
use crate::core::audio::AudioSource;

/// Why a finalize was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeReason {
    /// Sustained silence on one audio source.
    Silence(AudioSource),
    /// Explicit user action (question click, answer shortcut).
    UserAction,
    /// Capture was toggled off with a question still open.
    CaptureStopped,
}

impl std::fmt::Display for FinalizeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinalizeReason::Silence(source) => write!(f, "silence ({source})"),
            FinalizeReason::UserAction => write!(f, "user action"),
            FinalizeReason::CaptureStopped => write!(f, "capture stopped"),
        }
    }
}

/// Normalize text for duplicate comparison: lowercase, terminal
/// punctuation and newlines stripped, whitespace collapsed.
pub fn normalize_for_compare(text: &str) -> String {
    let stripped: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '?' | '!' | '.' | '\n' | '\r'))
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove standalone filler tokens ("uh", "um", ...) from a fragment.
pub fn strip_fillers(text: &str) -> String {
    const FILLERS: &[&str] = &["uh", "um", "uhm", "hmm", "mmm", "erm"];
    text.split_whitespace()
        .filter(|word| {
            let bare = word.trim_matches(|c: char| c.is_ascii_punctuation());
            !FILLERS.contains(&bare.to_lowercase().as_str())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Final formatting applied to a question at promotion time.
pub fn finalize_text(text: &str) -> String {
    text.trim().to_string()
}

/// Fold one cleaned fragment into the current question.
///
/// Interim fragments replace the provisional tail; final fragments empty it
/// and append to the confirmed text. The consolidated `text` is confirmed
/// text plus any pending interim tail.
pub fn consolidate(question: &mut CurrentQuestion, cleaned: &str, is_interim: bool) {
    if is_interim {
        question.interim_text = cleaned.to_string();
    } else {
        question.interim_text.clear();
        if !question.final_text.is_empty() {
            question.final_text.push(' ');
        }
        question.final_text.push_str(cleaned);
    }

    let confirmed = question.final_text.trim();
    question.text = if question.interim_text.is_empty() {
        confirmed.to_string()
    } else {
        format!("{confirmed} {}", question.interim_text)
            .trim()
            .to_string()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_punctuation_case_and_extra_whitespace() {
        assert_eq!(
            normalize_for_compare("What is  Polymorphism?!\n"),
            "what is polymorphism"
        );
        assert_eq!(normalize_for_compare(""), "");
        assert_eq!(
            normalize_for_compare("Same text."),
            normalize_for_compare("same TEXT")
        );
    }

    #[test]
    fn normalize_keeps_inner_punctuation_characters_out() {
        assert_eq!(normalize_for_compare("a.b c"), "ab c");
    }

    #[test]
    fn strip_fillers_removes_standalone_tokens_only() {
        assert_eq!(strip_fillers("um what is uh rust"), "what is rust");
        assert_eq!(strip_fillers("Hmm, tell me more"), "tell me more");
        // Words containing a filler substring survive.
        assert_eq!(strip_fillers("umbrella summer"), "umbrella summer");
    }

    #[test]
    fn consolidate_interim_replaces_previous_interim() {
        let mut q = CurrentQuestion::default();
        consolidate(&mut q, "what is", true);
        assert_eq!(q.text, "what is");
        consolidate(&mut q, "what is rust", true);
        assert_eq!(q.text, "what is rust");
        assert_eq!(q.final_text, "");
    }

    #[test]
    fn consolidate_final_appends_and_clears_interim() {
        let mut q = CurrentQuestion::default();
        consolidate(&mut q, "what is rust", true);
        consolidate(&mut q, "what is rust", false);
        assert_eq!(q.final_text, "what is rust");
        assert_eq!(q.interim_text, "");
        assert_eq!(q.text, "what is rust");

        consolidate(&mut q, "and why", false);
        assert_eq!(q.text, "what is rust and why");
    }

    #[test]
    fn consolidate_combines_confirmed_and_interim_tail() {
        let mut q = CurrentQuestion::default();
        consolidate(&mut q, "what is rust", false);
        consolidate(&mut q, "and why", true);
        assert_eq!(q.text, "what is rust and why");
        assert_eq!(q.final_text, "what is rust");
        assert_eq!(q.interim_text, "and why");
    }

    #[test]
    fn finalize_text_trims() {
        assert_eq!(finalize_text("  what is rust  "), "what is rust");
    }
}
