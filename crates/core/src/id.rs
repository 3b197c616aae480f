//! Opaque identifiers for accounts and assets
//!
//! Both are uppercase handles. The empty handle is the null identifier;
//! it parses to an error but is available as a constant so callers can
//! check against it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum handle length
pub const MAX_ID_LEN: usize = 64;

/// Errors that can occur when parsing identifiers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("Empty identifier")]
    Empty,

    #[error("Identifier too long (max {MAX_ID_LEN} chars): {0}")]
    TooLong(String),

    #[error("Invalid identifier format: {0}")]
    InvalidFormat(String),
}

fn normalize(s: &str) -> Result<String, IdError> {
    let s = s.trim().to_uppercase();

    if s.is_empty() {
        return Err(IdError::Empty);
    }

    if s.len() > MAX_ID_LEN {
        return Err(IdError::TooLong(s));
    }

    if !s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(IdError::InvalidFormat(s));
    }

    Ok(s)
}

macro_rules! handle_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// The null identifier
            pub const NULL: $name = $name(String::new());

            /// Parse and normalize an identifier
            pub fn new(s: &str) -> Result<Self, IdError> {
                normalize(s).map(Self)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_null(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_null() {
                    write!(f, "<null>")
                } else {
                    write!(f, "{}", self.0)
                }
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::NULL
            }
        }
    };
}

handle_type!(
    /// Account identifier (user, liquidator, engine custody account)
    ///
    /// # Examples
    /// ```
    /// use stablemint_core::AccountId;
    ///
    /// let alice: AccountId = "alice".parse().unwrap();
    /// assert_eq!(alice.as_str(), "ALICE");
    /// assert!(!alice.is_null());
    /// assert!(AccountId::NULL.is_null());
    /// ```
    AccountId
);

handle_type!(
    /// Asset identifier (a collateral type or the liability token)
    AssetId
);
