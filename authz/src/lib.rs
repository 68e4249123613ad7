//! Access-decision engine for the Bookshelf API.
//!
//! Every API operation asks one question before touching data: may this
//! calling application, acting for this subject (or for nobody), run this
//! operation? The answer combines two independently configured policies:
//!
//! - an **application whitelist**: which controller operations each
//!   registered application may call at all
//! - a **role/ownership policy**: which account kinds, and optionally which
//!   owner, may perform the operation
//!
//! # Architecture Overview
//!
//! 1. **Request arrives** at the API layer with an `AppId` header and,
//!    after authentication, the principal's claims
//! 2. **DecisionFactory** builds a fresh [`AccessDecision`] for the request
//! 3. **Combinators** are chained: one whitelist gate, then role predicates
//! 4. **try_verify** turns the verdict into `Ok(())` or a [`Denial`], which
//!    the HTTP layer renders as 401
//!
//! # Verdict Rules
//!
//! - A denial is sticky: nothing moves a decision out of `Denied`
//! - The whitelist gate only denies; some role predicate must allow
//! - Role predicates are OR-combined: the first one that allows wins and
//!   later ones are skipped, including the storage-backed ownership check
//! - An `Undecided` decision is denied by `try_verify`
//!
//! # Security Architecture
//!
//! - Authentication happens upstream; claims arrive already verified
//! - Untrusted input (empty names, unparsable ids) denies silently, it
//!   never panics or errors
//! - Every failure collapses into the same [`Denial`]; the specific reason
//!   is logged, never returned
//! - A failed ownership lookup denies (fail closed)

pub mod account_kind;
pub mod decision;
pub mod error;
pub mod factory;
pub mod legacy;
pub mod policy;
pub mod types;
pub mod whitelist;

pub use account_kind::{AccountKind, AccountKindOracle, StaticAccountKinds};
pub use decision::AccessDecision;
pub use error::{
    AuthzError, Denial, DenialReason, Result, UNAUTHORIZED_PROBLEM_TYPE, UNAUTHORIZED_TITLE,
};
pub use factory::DecisionFactory;
pub use legacy::LegacyWhitelistGate;
pub use policy::{OwnershipLookup, Rule};
pub use types::{endpoints, Claims, ClaimsSource, Endpoint, Verdict};
pub use whitelist::{AppWhitelistEntry, WhitelistConfiguration};
