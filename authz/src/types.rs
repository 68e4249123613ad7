//! Core request-side types: the verdict, principal claims and endpoint identifiers.
//!
//! # Security Considerations
//!
//! ## Principal claims
//! - Claims reach the engine already authenticated; nothing here verifies them
//! - Claim values are untrusted text: an unparsable id resolves to the nil id,
//!   never to an error
//! - A nil account-kind id has no name, so it matches no role predicate
//!
//! ## Endpoint identity
//! - The whitelist is keyed by controller and operation name
//! - Names are compile-time constants ([`Endpoint`]) so renaming a handler
//!   cannot silently change its whitelist key
//! - Matching is exact and case-sensitive

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Claim carrying the subject id.
pub const SUBJECT_ID_CLAIM: &str = "sub";

/// Claim carrying the account-kind id.
pub const ACCOUNT_KIND_CLAIM: &str = "account_type_id";

/// Tri-state outcome of an access decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    #[default]
    Undecided,
    Allowed,
    Denied,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Undecided => write!(f, "undecided"),
            Verdict::Allowed => write!(f, "allowed"),
            Verdict::Denied => write!(f, "denied"),
        }
    }
}

/// Read access to an authenticated principal's claims.
pub trait ClaimsSource: Send + Sync + fmt::Debug {
    /// Returns the raw value of the named claim, if present.
    fn claim(&self, name: &str) -> Option<&str>;
}

/// A flat claim set as produced by the authentication layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(HashMap<String, String>);

impl Claims {
    /// Creates an empty claim set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the claim set for a subject of the given account kind.
    pub fn for_subject(subject_id: Uuid, account_kind_id: Uuid) -> Self {
        Self::new()
            .with(SUBJECT_ID_CLAIM, subject_id.to_string())
            .with(ACCOUNT_KIND_CLAIM, account_kind_id.to_string())
    }

    /// Adds or replaces a claim.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }
}

impl ClaimsSource for Claims {
    fn claim(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

/// Parses a claim value into an id, falling back to the nil id.
pub(crate) fn parse_id(raw: Option<&str>) -> Uuid {
    raw.and_then(|value| Uuid::parse_str(value).ok())
        .unwrap_or_else(Uuid::nil)
}

/// A controller operation as named in the whitelist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub controller: &'static str,
    pub operation: &'static str,
}

impl Endpoint {
    pub const fn new(controller: &'static str, operation: &'static str) -> Self {
        Self {
            controller,
            operation,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.controller, self.operation)
    }
}

/// Every endpoint the API exposes.
pub mod endpoints {
    use super::Endpoint;

    pub mod books {
        use super::Endpoint;

        pub const CONTROLLER: &str = "Books";
        pub const GET_BOOKS: Endpoint = Endpoint::new(CONTROLLER, "GetBooksAsync");
        pub const GET_BOOK: Endpoint = Endpoint::new(CONTROLLER, "GetBookAsync");
        pub const ADD_BOOK: Endpoint = Endpoint::new(CONTROLLER, "AddBookAsync");
        pub const UPDATE_BOOK: Endpoint = Endpoint::new(CONTROLLER, "UpdateBookAsync");
        pub const DELETE_BOOK: Endpoint = Endpoint::new(CONTROLLER, "DeleteBookAsync");
    }

    pub mod publishers {
        use super::Endpoint;

        pub const CONTROLLER: &str = "Publishers";
        pub const GET_PUBLISHERS: Endpoint = Endpoint::new(CONTROLLER, "GetPublishersAsync");
        pub const GET_PUBLISHER: Endpoint = Endpoint::new(CONTROLLER, "GetPublisherAsync");
        pub const CREATE_PUBLISHER: Endpoint = Endpoint::new(CONTROLLER, "CreatePublisherAsync");
        pub const UPDATE_PUBLISHER: Endpoint = Endpoint::new(CONTROLLER, "UpdatePublisherAsync");
    }

    pub mod health {
        use super::Endpoint;

        pub const CONTROLLER: &str = "Health";
        pub const GET_HEALTH: Endpoint = Endpoint::new(CONTROLLER, "GetHealthAsync");
    }

    pub const ALL: &[Endpoint] = &[
        books::GET_BOOKS,
        books::GET_BOOK,
        books::ADD_BOOK,
        books::UPDATE_BOOK,
        books::DELETE_BOOK,
        publishers::GET_PUBLISHERS,
        publishers::GET_PUBLISHER,
        publishers::CREATE_PUBLISHER,
        publishers::UPDATE_PUBLISHER,
        health::GET_HEALTH,
    ];
}
