use serde::Serialize;

use crate::auth::repo_types::Role;

/// Role-specific area a user is routed to once authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Landing {
    Admin,
    Teacher,
    Student,
}

impl Landing {
    /// The only place roles are mapped to areas; the index page, login and
    /// the dashboard guards all go through here.
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Administrator => Landing::Admin,
            Role::Teacher => Landing::Teacher,
            Role::Student => Landing::Student,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Landing::Admin => "/admin",
            Landing::Teacher => "/teacher",
            Landing::Student => "/student",
        }
    }
}
