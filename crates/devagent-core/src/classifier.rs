//! Command classification.
//!
//! The tag decides how the agent process treats a command, and agents key
//! their prompts off it, so the precedence below must stay exactly as is:
//! a command mentioning both phrases is always `pseudo_code`, and any
//! command that merely contains "explain" is `explain`.

use devagent_models::CommandType;

const PSEUDO_CODE_PHRASE: &str = "pseudo code";
const EXPLAIN_PHRASE: &str = "explain";

/// Classify a raw command.
///
/// Case-insensitive substring match, first match wins:
/// 1. `"pseudo code"` → [`CommandType::PseudoCode`]
/// 2. `"explain"` → [`CommandType::Explain`]
/// 3. anything else → [`CommandType::Custom`]
pub fn classify(command: &str) -> CommandType {
    let lower = command.to_lowercase();

    if lower.contains(PSEUDO_CODE_PHRASE) {
        CommandType::PseudoCode
    } else if lower.contains(EXPLAIN_PHRASE) {
        CommandType::Explain
    } else {
        CommandType::Custom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pseudo_code_any_case() {
        assert_eq!(classify("give me PSEUDO CODE please"), CommandType::PseudoCode);
        assert_eq!(classify("Pseudo Code"), CommandType::PseudoCode);
    }

    #[test]
    fn test_explain() {
        assert_eq!(classify("can you explain this?"), CommandType::Explain);
        assert_eq!(classify("EXPLAIN"), CommandType::Explain);
    }

    #[test]
    fn test_custom() {
        assert_eq!(classify("summarize this file"), CommandType::Custom);
        assert_eq!(classify(""), CommandType::Custom);
    }

    #[test]
    fn test_pseudo_code_wins_over_explain() {
        assert_eq!(classify("explain the pseudo code"), CommandType::PseudoCode);
    }

    #[test]
    fn test_substring_match_is_coarse() {
        // Any mention counts, even inside another word or a negation.
        assert_eq!(classify("don't explain, just refactor"), CommandType::Explain);
        assert_eq!(classify("unexplained behaviour"), CommandType::Explain);
        // The phrase needs the space.
        assert_eq!(classify("pseudocode please"), CommandType::Custom);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let input = "Explain the flow";
        let first = classify(input);
        for _ in 0..10 {
            assert_eq!(classify(input), first);
        }
    }
}
