//! Pattern syntaxes for common oracle query languages.

use crate::candidate::Candidate;
use crate::error::EncodeError;
use crate::oracle::QuerySyntax;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// SQL `LIKE` patterns: `%` matches any run, `_` any single character, `\` escapes.
#[derive(Debug, Clone, Copy, Default)]
pub struct LikeSyntax;

impl LikeSyntax {
    pub const ESCAPE: char = '\\';
    pub const ANY_RUN: char = '%';
    pub const ANY_ONE: char = '_';
}

impl QuerySyntax for LikeSyntax {
    fn encode(&self, candidate: &Candidate) -> Result<String, EncodeError> {
        let text = candidate.as_str();
        let mut encoded = String::with_capacity(text.len() + 4);
        for ch in text.chars() {
            match ch {
                '\0' => {
                    return Err(EncodeError::Unencodable {
                        candidate: text.to_string(),
                        ch,
                    })
                }
                Self::ESCAPE | Self::ANY_RUN | Self::ANY_ONE => {
                    encoded.push(Self::ESCAPE);
                    encoded.push(ch);
                }
                _ => encoded.push(ch),
            }
        }
        Ok(encoded)
    }

    fn open_suffix(&self) -> &str {
        "%"
    }
}

/// Candidates passed through untouched, with a configurable open suffix.
#[derive(Debug, Clone)]
pub struct LiteralSyntax {
    open_suffix: String,
}

impl LiteralSyntax {
    pub fn new(open_suffix: impl Into<String>) -> Self {
        Self {
            open_suffix: open_suffix.into(),
        }
    }
}

impl QuerySyntax for LiteralSyntax {
    fn encode(&self, candidate: &Candidate) -> Result<String, EncodeError> {
        Ok(candidate.as_str().to_string())
    }

    fn open_suffix(&self) -> &str {
        &self.open_suffix
    }
}

/// Syntax selection in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SyntaxConfig {
    Like,
    Literal { open_suffix: String },
}

impl Default for SyntaxConfig {
    fn default() -> Self {
        SyntaxConfig::Like
    }
}

impl SyntaxConfig {
    pub fn build(&self) -> Arc<dyn QuerySyntax> {
        match self {
            SyntaxConfig::Like => Arc::new(LikeSyntax),
            SyntaxConfig::Literal { open_suffix } => Arc::new(LiteralSyntax::new(open_suffix)),
        }
    }
}
