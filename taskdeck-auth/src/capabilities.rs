//! Role-based capabilities
//!
//! A single resolution function maps a role to the actions the front end may
//! offer. Capabilities only gate affordances; the resource API still rejects
//! every mutation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use taskdeck_core::{Role, UserProfile};

/// A named action the front end may offer
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Capability {
    /// Browse workspaces, spaces, lists, and tasks
    ViewResources,
    CreateSpace,
    CreateList,
    CreateTask,
    EditTask,
    DeleteTask,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Capability::ViewResources,
        Capability::CreateSpace,
        Capability::CreateList,
        Capability::CreateTask,
        Capability::EditTask,
        Capability::DeleteTask,
    ];
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::ViewResources => write!(f, "view_resources"),
            Capability::CreateSpace => write!(f, "create_space"),
            Capability::CreateList => write!(f, "create_list"),
            Capability::CreateTask => write!(f, "create_task"),
            Capability::EditTask => write!(f, "edit_task"),
            Capability::DeleteTask => write!(f, "delete_task"),
        }
    }
}

impl std::str::FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "view_resources" => Ok(Capability::ViewResources),
            "create_space" => Ok(Capability::CreateSpace),
            "create_list" => Ok(Capability::CreateList),
            "create_task" => Ok(Capability::CreateTask),
            "edit_task" => Ok(Capability::EditTask),
            "delete_task" => Ok(Capability::DeleteTask),
            _ => Err(format!("Unknown capability: {}", s)),
        }
    }
}

/// Capabilities granted to a role
pub fn role_capabilities(role: Role) -> BTreeSet<Capability> {
    use Capability::*;

    match role {
        Role::Admin => [
            ViewResources,
            CreateSpace,
            CreateList,
            CreateTask,
            EditTask,
            DeleteTask,
        ]
        .into_iter()
        .collect(),
        Role::Editor => [ViewResources, CreateSpace, CreateList, CreateTask, EditTask]
            .into_iter()
            .collect(),
        Role::Viewer => [ViewResources].into_iter().collect(),
    }
}

/// Capabilities for the current session.
///
/// `authenticated` without a recovered profile grants browsing only.
pub fn capabilities_for(authenticated: bool, profile: Option<&UserProfile>) -> BTreeSet<Capability> {
    match (authenticated, profile) {
        (false, _) => BTreeSet::new(),
        (true, Some(profile)) => role_capabilities(profile.role),
        (true, None) => [Capability::ViewResources].into_iter().collect(),
    }
}

/// Whether `role` may perform `capability`
pub fn can(role: Role, capability: Capability) -> bool {
    role_capabilities(role).contains(&capability)
}
