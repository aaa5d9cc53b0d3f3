use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Authorization role carried in session tokens
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    /// Case-insensitive, surrounding whitespace ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("USER") {
            Ok(Role::User)
        } else if trimmed.eq_ignore_ascii_case("ADMIN") {
            Ok(Role::Admin)
        } else {
            Err(format!("unknown role '{}'", trimmed))
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u32,
    /// Unique, compared exactly
    pub email: String,
    /// Argon2id PHC string
    pub password_hash: String,
    pub role: Role,
    pub merit: u32,
    pub foul_count: u32,
    /// Bumped on every mutation
    pub version: u64,
}

impl User {
    pub fn new(id: u32, email: String, password_hash: String, role: Role) -> Self {
        Self {
            id,
            email,
            password_hash,
            role,
            merit: 0,
            foul_count: 0,
            version: 0,
        }
    }

    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
            merit: self.merit,
            foul_count: self.foul_count,
        }
    }
}

/// Public projection of a user, without credentials
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: u32,
    pub email: String,
    pub role: Role,
    pub merit: u32,
    pub foul_count: u32,
}
