use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role attached to an account by the identity provider.
///
/// Store accounts are the regulated accounts a DTI regulator looks up by
/// proximity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    Customer,
    Store,
    Dti,
    Admin,
}

impl AccountRole {
    pub const ALL: [AccountRole; 4] = [
        AccountRole::Customer,
        AccountRole::Store,
        AccountRole::Dti,
        AccountRole::Admin,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::Customer => "customer",
            AccountRole::Store => "store",
            AccountRole::Dti => "dti",
            AccountRole::Admin => "admin",
        }
    }

    /// Roles whose accounts are subject to regulator oversight.
    #[must_use]
    pub fn is_regulated(&self) -> bool {
        matches!(self, AccountRole::Store)
    }

    /// Every role for which [`AccountRole::is_regulated`] holds.
    #[must_use]
    pub fn regulated() -> Vec<AccountRole> {
        Self::ALL.into_iter().filter(AccountRole::is_regulated).collect()
    }
}

impl std::fmt::Display for AccountRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" | "user" => Ok(AccountRole::Customer),
            "store" => Ok(AccountRole::Store),
            "dti" => Ok(AccountRole::Dti),
            "admin" => Ok(AccountRole::Admin),
            other => Err(format!("unknown account role: '{other}'")),
        }
    }
}
