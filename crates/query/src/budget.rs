//! Token estimation and truncation for budgeted views.
//!
//! Uses a fixed ~4 characters per token heuristic. Exact BPE counts depend
//! on the consumer's tokenizer; the views promise an approximate budget, and
//! a deterministic estimate keeps truncation reproducible.

const CHARS_PER_TOKEN: usize = 4;

/// Estimated token count for `text`.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Truncate `text` so it fits in `max_tokens`, marking the cut with an
/// ellipsis. Returns the input unchanged when it already fits.
pub fn truncate_to_tokens(text: &str, max_tokens: usize) -> String {
    if estimate_tokens(text) <= max_tokens {
        return text.to_string();
    }
    let max_chars = max_tokens.saturating_mul(CHARS_PER_TOKEN).saturating_sub(3);
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{truncated}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_zero_tokens() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn short_text_passes_through() {
        assert_eq!(truncate_to_tokens("Edited api handler", 50), "Edited api handler");
    }

    #[test]
    fn long_text_is_cut_to_budget() {
        let long = "word ".repeat(200);
        let cut = truncate_to_tokens(&long, 50);
        assert!(estimate_tokens(&cut) <= 50);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn truncation_is_deterministic() {
        let long = "lorem ipsum dolor sit amet ".repeat(40);
        assert_eq!(truncate_to_tokens(&long, 30), truncate_to_tokens(&long, 30));
    }
}
