//! Account-kind lookup.
//!
//! The table is small and fixed; the engine only ever asks for a name.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// The coarse role of a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountKind {
    User,
    Publisher,
    Operator,
    Suspended,
}

impl AccountKind {
    pub const ALL: [AccountKind; 4] = [
        AccountKind::User,
        AccountKind::Publisher,
        AccountKind::Operator,
        AccountKind::Suspended,
    ];

    /// Well-known id of this kind.
    pub const fn id(self) -> Uuid {
        match self {
            AccountKind::User => Uuid::from_u128(0x7a1d6f3e_2c4b_4e8a_9f10_3b5c6d7e8f01),
            AccountKind::Publisher => Uuid::from_u128(0x7a1d6f3e_2c4b_4e8a_9f10_3b5c6d7e8f02),
            AccountKind::Operator => Uuid::from_u128(0x7a1d6f3e_2c4b_4e8a_9f10_3b5c6d7e8f03),
            AccountKind::Suspended => Uuid::from_u128(0x7a1d6f3e_2c4b_4e8a_9f10_3b5c6d7e8f04),
        }
    }

    /// Canonical name, as stored in the lookup table.
    pub const fn name(self) -> &'static str {
        match self {
            AccountKind::User => "User",
            AccountKind::Publisher => "Publisher",
            AccountKind::Operator => "Operator",
            AccountKind::Suspended => "Suspended",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Maps an account-kind id to its canonical name.
///
/// Implementations must be pure: the same id always yields the same name.
pub trait AccountKindOracle: Send + Sync + fmt::Debug {
    /// Canonical name for `id`, or `None` for an unknown id.
    fn name_of(&self, id: Uuid) -> Option<&str>;

    fn is_kind(&self, id: Uuid, kind: AccountKind) -> bool {
        self.name_of(id) == Some(kind.name())
    }

    fn is_user(&self, id: Uuid) -> bool {
        self.is_kind(id, AccountKind::User)
    }

    fn is_publisher(&self, id: Uuid) -> bool {
        self.is_kind(id, AccountKind::Publisher)
    }

    fn is_operator(&self, id: Uuid) -> bool {
        self.is_kind(id, AccountKind::Operator)
    }
}

/// The default in-memory table seeded with every [`AccountKind`].
#[derive(Debug, Clone)]
pub struct StaticAccountKinds {
    names: HashMap<Uuid, String>,
}

impl StaticAccountKinds {
    pub fn new() -> Self {
        let names = AccountKind::ALL
            .iter()
            .map(|kind| (kind.id(), kind.name().to_string()))
            .collect();
        Self { names }
    }

    /// Registers an extra id under an existing or new name.
    pub fn with_kind(mut self, id: Uuid, name: impl Into<String>) -> Self {
        self.names.insert(id, name.into());
        self
    }
}

impl Default for StaticAccountKinds {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountKindOracle for StaticAccountKinds {
    fn name_of(&self, id: Uuid) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }
}
