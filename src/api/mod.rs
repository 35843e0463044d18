//! User service layer: wire types, the fixed role catalog, and the
//! `UserService` seam the rest of the crate talks to.
//!
pub mod client;

use std::fmt::{Display, Formatter};

use async_trait::async_trait;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub use client::HttpUserService;

/// A user record as served by the remote API.
///
/// The client never owns the authoritative copy; this is the last known
/// server state. `password` is whatever the server returns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub password: String,
}

/// Body of a create request. The server assigns the id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub role: Role,
    pub password: String,
}

/// Body of an update request. Only the id and username are sent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UserUpdate {
    pub id: u64,
    pub username: String,
}

/// Roles known to the client. Anything else the server reports is kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Developer,
    Manager,
    SeniorDev,
    JuniorDev,
    DevOpsEngineer,
    Other(String),
}

impl Role {
    pub fn name(&self) -> &str {
        match self {
            Role::Developer => "Developer",
            Role::Manager => "Manager",
            Role::SeniorDev => "Senior Dev",
            Role::JuniorDev => "Junior Dev",
            Role::DevOpsEngineer => "DevOps Engineer",
            Role::Other(name) => name,
        }
    }

    /// Catalog entry for this role, if it is one of the known roles.
    pub fn tag(&self) -> Option<&'static RoleTag> {
        ROLE_TAGS.iter().find(|t| &t.role() == self)
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Developer" => Role::Developer,
            "Manager" => Role::Manager,
            "Senior Dev" => Role::SeniorDev,
            "Junior Dev" => Role::JuniorDev,
            "DevOps Engineer" => Role::DevOpsEngineer,
            _ => Role::Other(s),
        }
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        Role::from(s.to_string())
    }
}

impl From<Role> for String {
    fn from(r: Role) -> Self {
        match r {
            Role::Other(name) => name,
            known => known.name().to_string(),
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A role name paired with its chip color.
#[derive(Clone, Copy, Debug)]
pub struct RoleTag {
    pub name: &'static str,
    pub color: &'static str,
}

impl RoleTag {
    pub fn role(&self) -> Role {
        Role::from(self.name)
    }

    /// Chip color as a terminal color; the catalog only holds `#RRGGBB` values.
    pub fn rgb(&self) -> Color {
        crate::app::Theme::parse_color(self.color).unwrap_or(Color::Reset)
    }
}

/// The fixed role catalog, in display order.
pub static ROLE_TAGS: [RoleTag; 5] = [
    RoleTag { name: "Developer", color: "#FFB3BA" },
    RoleTag { name: "Manager", color: "#FFDFBA" },
    RoleTag { name: "Senior Dev", color: "#FFFFBA" },
    RoleTag { name: "Junior Dev", color: "#BAFFC9" },
    RoleTag { name: "DevOps Engineer", color: "#BAE1FF" },
];

/// Operations offered by the remote user service.
///
/// Each method is a single round trip with no retry.
#[async_trait]
pub trait UserService: Send + Sync {
    async fn list_all(&self) -> Result<Vec<User>, ApiError>;

    async fn find_by_id(&self, id: u64) -> Result<User, ApiError>;

    /// Usernames of every user holding `role`.
    async fn find_by_role(&self, role: &Role) -> Result<Vec<String>, ApiError>;

    async fn create(&self, user: &NewUser) -> Result<(), ApiError>;

    async fn update(&self, update: &UserUpdate) -> Result<(), ApiError>;

    async fn delete_by_id(&self, id: u64) -> Result<(), ApiError>;
}
