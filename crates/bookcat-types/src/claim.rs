use std::{collections::HashSet, fmt, str::FromStr, time::SystemTime};

use serde::{Deserialize, Serialize};

/// Role carried in API tokens. Roles are flat, not hierarchical -
/// a token holds every role it is entitled to.
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    Reader,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Reader => "reader",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "editor" => Ok(Role::Editor),
            "reader" => Ok(Role::Reader),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

pub trait TimeLimited {
    fn set_validity(&mut self, until: SystemTime);
    fn check_validity(&self) -> bool;
}

pub trait Authorization {
    fn has_role(&self, role: Role) -> bool;

    fn has_any_role<I>(&self, roles: I) -> bool
    where
        I: IntoIterator<Item = Role>,
    {
        roles.into_iter().any(|role| self.has_role(role))
    }

    fn has_all_roles<I>(&self, roles: I) -> bool
    where
        I: IntoIterator<Item = Role>,
    {
        roles.into_iter().all(|role| self.has_role(role))
    }
}

/// Claims of an API access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiClaim {
    pub sub: String,
    pub exp: u64,
    pub roles: HashSet<Role>,
}

impl ApiClaim {
    /// New claim with expiration unset - the token manager fills it on issue.
    pub fn new<I>(sub: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = Role>,
    {
        Self {
            sub: sub.into(),
            exp: 0,
            roles: roles.into_iter().collect(),
        }
    }
}

impl Authorization for ApiClaim {
    fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

impl TimeLimited for ApiClaim {
    fn set_validity(&mut self, until: SystemTime) {
        self.exp = until
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
    }

    fn check_validity(&self) -> bool {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.exp > now
    }
}
