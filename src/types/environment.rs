// ABOUTME: Target environment for a stack: account and region.
// ABOUTME: Deploys require a fully resolved environment before any remote call.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A resolved deployment target: one account, one region.
///
/// Descriptors carry `Option<Environment>`; the orchestrator refuses to
/// touch the control plane until the environment is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Environment {
    pub account: String,
    pub region: String,
}

impl Environment {
    pub fn new(account: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            region: region.into(),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "aws://{}/{}", self.account, self.region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_uri_form() {
        let env = Environment::new("123456789012", "eu-west-1");
        assert_eq!(env.to_string(), "aws://123456789012/eu-west-1");
    }
}
