//! Token-budgeted prompt assembly.
//!
//! The prompt is a fixed header carrying the question, followed by one
//! bullet per retrieved fragment in retrieval order. Fragments are added
//! whole while they fit; the first one that does not fit is cut to the
//! remaining budget on a token boundary and everything after it is dropped.
//!
//! The finished prompt is re-counted as a whole before it is returned.
//! BPE merges across the bullet boundaries can make the whole differ from
//! the sum of its parts, so if the re-count is over budget the last
//! fragment is shortened further until the prompt fits.

use crate::rag::tokenizer::Tokenizer;
use crate::types::{AppError, Result};
use std::sync::Arc;
use tracing::debug;

/// Build the fixed part of the prompt.
pub fn prompt_header(question: &str) -> String {
    format!(
        "Answer the question based on the context below. Be detailed but concise.\n\n\
         Question: {}\n\n\
         Context:\n",
        question
    )
}

fn bullet(fragment: &str) -> String {
    format!("- {}\n", fragment)
}

/// A prompt that fits its token budget.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetedPrompt {
    pub text: String,
    /// Token count of `text` as measured by the budgeter's tokenizer.
    pub tokens: usize,
    /// Number of context fragments that made it into the prompt (whole or cut).
    pub fragments_used: usize,
    /// Whether the last included fragment was cut short.
    pub truncated: bool,
}

struct Entry<'a> {
    original: &'a str,
    tokens: Vec<u32>,
    kept: usize,
}

impl Entry<'_> {
    fn is_whole(&self) -> bool {
        self.kept == self.tokens.len()
    }
}

/// Assembles prompts under a hard token ceiling.
#[derive(Clone)]
pub struct PromptBudgeter {
    tokenizer: Arc<dyn Tokenizer>,
}

impl PromptBudgeter {
    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self { tokenizer }
    }

    /// Assemble a prompt for `question` from `context` (closest first)
    /// whose token count never exceeds `max_tokens`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BudgetExceeded` if the header alone is larger than
    /// `max_tokens`.
    pub fn format_prompt<S: AsRef<str>>(
        &self,
        question: &str,
        context: &[S],
        max_tokens: usize,
    ) -> Result<BudgetedPrompt> {
        let header = prompt_header(question);
        let header_tokens = self.tokenizer.count(&header);
        if header_tokens > max_tokens {
            return Err(AppError::BudgetExceeded {
                header_tokens,
                max_tokens,
            });
        }

        let mut remaining = max_tokens - header_tokens;
        let mut entries: Vec<Entry<'_>> = Vec::new();

        for fragment in context {
            if remaining == 0 {
                break;
            }
            let fragment = fragment.as_ref();
            if fragment.is_empty() {
                continue;
            }

            let tokens = self.tokenizer.encode(fragment);
            let cost = self.tokenizer.count(&bullet(fragment));

            if cost <= remaining {
                remaining -= cost;
                entries.push(Entry {
                    original: fragment,
                    kept: tokens.len(),
                    tokens,
                });
            } else {
                let decoration = cost.saturating_sub(tokens.len());
                let kept = remaining.saturating_sub(decoration);
                if kept > 0 {
                    entries.push(Entry {
                        original: fragment,
                        tokens,
                        kept,
                    });
                }
                remaining = 0;
            }
        }

        loop {
            let text = self.render(&header, &entries);
            let tokens = self.tokenizer.count(&text);
            if tokens <= max_tokens {
                let truncated = entries.last().map(|e| !e.is_whole()).unwrap_or(false);
                debug!(
                    tokens,
                    max_tokens,
                    fragments = entries.len(),
                    truncated,
                    "Assembled prompt"
                );
                return Ok(BudgetedPrompt {
                    text,
                    tokens,
                    fragments_used: entries.len(),
                    truncated,
                });
            }

            // The header fits on its own, so there is always an entry to shrink.
            let excess = tokens - max_tokens;
            match entries.last_mut() {
                Some(last) => {
                    last.kept = last.kept.saturating_sub(excess.max(1));
                    if last.kept == 0 {
                        entries.pop();
                    }
                }
                None => {
                    return Err(AppError::BudgetExceeded {
                        header_tokens: tokens,
                        max_tokens,
                    })
                }
            }
        }
    }

    fn render(&self, header: &str, entries: &[Entry<'_>]) -> String {
        let mut text = header.to_string();
        for entry in entries {
            if entry.is_whole() {
                text.push_str(&bullet(entry.original));
            } else {
                text.push_str(&bullet(&self.tokenizer.decode(&entry.tokens[..entry.kept])));
            }
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::tokenizer::TiktokenTokenizer;

    fn budgeter() -> (PromptBudgeter, Arc<dyn Tokenizer>) {
        let tokenizer: Arc<dyn Tokenizer> = Arc::new(TiktokenTokenizer::cl100k().unwrap());
        (PromptBudgeter::new(tokenizer.clone()), tokenizer)
    }

    #[test]
    fn test_header_only_when_no_context() {
        let (budgeter, tokenizer) = budgeter();
        let prompt = budgeter
            .format_prompt::<&str>("What happened?", &[], 3500)
            .unwrap();
        assert_eq!(prompt.text, prompt_header("What happened?"));
        assert_eq!(prompt.tokens, tokenizer.count(&prompt.text));
        assert_eq!(prompt.fragments_used, 0);
        assert!(!prompt.truncated);
    }

    #[test]
    fn test_header_exceeding_budget_fails() {
        let (budgeter, _) = budgeter();
        let err = budgeter
            .format_prompt("What happened to gas fees?", &["ctx"], 5)
            .unwrap_err();
        assert!(matches!(err, AppError::BudgetExceeded { max_tokens: 5, .. }));
    }

    #[test]
    fn test_fragments_appended_in_order() {
        let (budgeter, _) = budgeter();
        let prompt = budgeter
            .format_prompt("Q?", &["Ethereum gas fees dropped.", "Bitcoin price rose today."], 3500)
            .unwrap();
        let eth = prompt.text.find("- Ethereum gas fees dropped.\n").unwrap();
        let btc = prompt.text.find("- Bitcoin price rose today.\n").unwrap();
        assert!(eth < btc);
        assert_eq!(prompt.fragments_used, 2);
    }

    #[test]
    fn test_oversized_fragment_is_cut_and_rest_dropped() {
        let (budgeter, tokenizer) = budgeter();
        let header_tokens = tokenizer.count(&prompt_header("Q?"));
        let long = "alpha ".repeat(500);
        let prompt = budgeter
            .format_prompt("Q?", &[long.as_str(), "never included"], header_tokens + 50)
            .unwrap();

        assert!(prompt.tokens <= header_tokens + 50);
        assert!(prompt.truncated);
        assert_eq!(prompt.fragments_used, 1);
        assert!(!prompt.text.contains("never included"));
        assert!(prompt.text.contains("- alpha alpha"));
    }

    #[test]
    fn test_every_budget_is_respected() {
        let (budgeter, tokenizer) = budgeter();
        let fragments = ["one two three", "four five six", "seven eight nine"];
        let full = budgeter.format_prompt("Q?", &fragments, 10_000).unwrap();
        assert_eq!(full.fragments_used, 3);
        assert!(!full.truncated);

        for budget in tokenizer.count(&prompt_header("Q?"))..full.tokens {
            let prompt = budgeter.format_prompt("Q?", &fragments, budget).unwrap();
            assert!(prompt.tokens <= budget);
            assert_eq!(prompt.tokens, tokenizer.count(&prompt.text));
        }
    }
}
