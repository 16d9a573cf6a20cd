// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

/// Why a model-emitted call could not be turned into an [`AgentAction`].
///
/// Every variant renders to a short feedback message suitable for appending
/// to the planner conversation on a retry turn.
///
/// [`AgentAction`]: crate::AgentAction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown agent verb `{verb}`; use only the documented agent.* actions")]
    UnknownVerb { verb: String },

    #[error("malformed call: {detail}")]
    MalformedCall { detail: String },

    #[error("bad argument `{arg}` for agent.{verb}: {detail}")]
    BadArgument {
        verb: &'static str,
        arg: &'static str,
        detail: String,
    },

    #[error("agent.{verb} is missing required argument `{arg}`")]
    MissingRequired {
        verb: &'static str,
        arg: &'static str,
    },
}

impl ParseError {
    /// Feedback line shown to the model on a format-retry turn.
    pub fn feedback(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_verb_feedback_is_non_empty_and_names_the_verb() {
        let e = ParseError::UnknownVerb { verb: "fly".into() };
        let fb = e.feedback();
        assert!(!fb.is_empty());
        assert!(fb.contains("fly"));
    }

    #[test]
    fn missing_required_names_verb_and_arg() {
        let e = ParseError::MissingRequired { verb: "click", arg: "description" };
        let fb = e.feedback();
        assert!(fb.contains("click"));
        assert!(fb.contains("description"));
    }
}
