// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
use iris_actions::{extract_calls, parse_call, parse_code_block};

/// One format requirement on a raw model response.
///
/// Checkers run in a fixed order; the first failure aborts the chain and its
/// feedback is sent back to the model on the retry turn.
pub trait FormatChecker: Send + Sync {
    fn check(&self, response: &str) -> Result<(), String>;
}

/// The response must contain a fenced code block with exactly one
/// `agent.<verb>(…)` call.
pub struct SingleCallChecker;

impl FormatChecker for SingleCallChecker {
    fn check(&self, response: &str) -> Result<(), String> {
        let code = parse_code_block(response).ok_or_else(|| {
            "the response contains no fenced code block; put the agent call inside ```…```"
                .to_string()
        })?;
        match extract_calls(&code).len() {
            1 => Ok(()),
            0 => Err("the code block contains no agent.<verb>(...) call".to_string()),
            n => Err(format!(
                "the code block contains {n} agent calls; emit exactly one action per turn"
            )),
        }
    }
}

/// The single call must parse: known verb, well-formed arguments.
pub struct ParsesChecker;

impl FormatChecker for ParsesChecker {
    fn check(&self, response: &str) -> Result<(), String> {
        let code = parse_code_block(response).ok_or("no code block")?;
        let calls = extract_calls(&code);
        let call = calls.first().ok_or("no agent call")?;
        parse_call(call).map(|_| ()).map_err(|e| e.feedback())
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_call_passes() {
        let r = "I will finish.\n```python\nagent.done()\n```";
        assert!(SingleCallChecker.check(r).is_ok());
        assert!(ParsesChecker.check(r).is_ok());
    }

    #[test]
    fn missing_code_block_fails_with_feedback() {
        let err = SingleCallChecker.check("agent.done()").unwrap_err();
        assert!(err.contains("code block"));
    }

    #[test]
    fn two_calls_fail() {
        let r = "```python\nagent.wait(1)\nagent.done()\n```";
        let err = SingleCallChecker.check(r).unwrap_err();
        assert!(err.contains("2"));
    }

    #[test]
    fn unknown_verb_fails_parse_checker() {
        let r = "```python\nagent.teleport(\"away\")\n```";
        assert!(SingleCallChecker.check(r).is_ok());
        let err = ParsesChecker.check(r).unwrap_err();
        assert!(err.contains("teleport"));
    }

    #[test]
    fn bad_argument_feedback_names_the_argument() {
        let r = "```python\nagent.click(\"x\", num_clicks=0)\n```";
        let err = ParsesChecker.check(r).unwrap_err();
        assert!(err.contains("num_clicks"));
    }
}
