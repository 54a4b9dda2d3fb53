//! Oracle Port
//!
//! The discovery core talks to the outside world through two capabilities:
//!
//! - [`Oracle`]: answers whether any secret matches a pattern. Patterns ending in the
//!   syntax's open suffix ask "is this a prefix of some secret"; bare patterns ask "is
//!   this exactly a secret".
//! - [`QuerySyntax`]: turns a raw candidate into a pattern that is safe for the oracle's
//!   query language, and supplies the open suffix.
//!
//! Transport failures are reported as [`OracleError`] and are never folded into a
//! pass or fail answer.

use crate::candidate::Candidate;
use crate::error::{EncodeError, OracleError};
use async_trait::async_trait;

pub mod http;
pub mod memory;
pub mod syntax;

pub use http::{HttpMethod, HttpOracle, HttpOracleConfig, PassRule};
pub use memory::SecretSetOracle;
pub use syntax::{LikeSyntax, LiteralSyntax, SyntaxConfig};

/// Boolean oracle over an unknown set of secrets.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Returns true iff some secret matches `pattern`.
    async fn test(&self, pattern: &str) -> Result<bool, OracleError>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

/// Encoding capability for the oracle's pattern language.
pub trait QuerySyntax: Send + Sync {
    /// Escape `candidate` so that every character matches literally.
    ///
    /// Distinct candidates over the active alphabet must encode to distinct patterns.
    fn encode(&self, candidate: &Candidate) -> Result<String, EncodeError>;

    /// Suffix meaning "followed by anything, possibly nothing".
    fn open_suffix(&self) -> &str;

    /// Pattern for the open-prefix test.
    fn open_pattern(&self, candidate: &Candidate) -> Result<String, EncodeError> {
        let mut pattern = self.encode(candidate)?;
        pattern.push_str(self.open_suffix());
        Ok(pattern)
    }

    /// Pattern for the exact test.
    fn exact_pattern(&self, candidate: &Candidate) -> Result<String, EncodeError> {
        self.encode(candidate)
    }
}
