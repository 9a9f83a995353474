use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Functional areas of the dashboard subject to access control.
///
/// The set is closed: anything coming from the outside that does not map to
/// one of these variants is dropped at the parse boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Dashboard,
    Equipment,
    Endmills,
    Inventory,
    CamSheets,
    ToolChanges,
    EndmillDisposals,
    Reports,
    Settings,
    Users,
    AiInsights,
    /// Matches every resource, but only in combination with `manage`.
    #[serde(rename = "*")]
    Wildcard,
}

impl Resource {
    /// Every concrete resource, wildcard excluded.
    pub const ALL: &'static [Resource] = &[
        Resource::Dashboard,
        Resource::Equipment,
        Resource::Endmills,
        Resource::Inventory,
        Resource::CamSheets,
        Resource::ToolChanges,
        Resource::EndmillDisposals,
        Resource::Reports,
        Resource::Settings,
        Resource::Users,
        Resource::AiInsights,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Dashboard => "dashboard",
            Resource::Equipment => "equipment",
            Resource::Endmills => "endmills",
            Resource::Inventory => "inventory",
            Resource::CamSheets => "cam_sheets",
            Resource::ToolChanges => "tool_changes",
            Resource::EndmillDisposals => "endmill_disposals",
            Resource::Reports => "reports",
            Resource::Settings => "settings",
            Resource::Users => "users",
            Resource::AiInsights => "ai_insights",
            Resource::Wildcard => "*",
        }
    }

    pub fn parse(value: &str) -> Option<Resource> {
        match value {
            "dashboard" => Some(Resource::Dashboard),
            "equipment" => Some(Resource::Equipment),
            "endmills" => Some(Resource::Endmills),
            "inventory" => Some(Resource::Inventory),
            "cam_sheets" => Some(Resource::CamSheets),
            "tool_changes" => Some(Resource::ToolChanges),
            "endmill_disposals" => Some(Resource::EndmillDisposals),
            "reports" => Some(Resource::Reports),
            "settings" => Some(Resource::Settings),
            "users" => Some(Resource::Users),
            "ai_insights" => Some(Resource::AiInsights),
            "*" => Some(Resource::Wildcard),
            _ => None,
        }
    }
}

/// Operation kinds performable on a resource.
///
/// `manage` subsumes every other action on the same resource; no other
/// implicit subsumption exists (`update` does not imply `read`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    Manage,
    Use,
}

impl Action {
    pub const ALL: &'static [Action] = &[
        Action::Create,
        Action::Read,
        Action::Update,
        Action::Delete,
        Action::Manage,
        Action::Use,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Manage => "manage",
            Action::Use => "use",
        }
    }

    pub fn parse(value: &str) -> Option<Action> {
        match value {
            "create" => Some(Action::Create),
            "read" => Some(Action::Read),
            "update" => Some(Action::Update),
            "delete" => Some(Action::Delete),
            "manage" => Some(Action::Manage),
            "use" => Some(Action::Use),
            _ => None,
        }
    }
}

/// Fixed caller classes. Exactly one is attached to a profile at decision time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    SystemAdmin,
    Admin,
    User,
}

impl RoleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleKind::SystemAdmin => "system_admin",
            RoleKind::Admin => "admin",
            RoleKind::User => "user",
        }
    }

    pub fn parse(value: &str) -> Option<RoleKind> {
        match value {
            "system_admin" => Some(RoleKind::SystemAdmin),
            "admin" => Some(RoleKind::Admin),
            "user" => Some(RoleKind::User),
            _ => None,
        }
    }

    /// Total order over role kinds, for "can manage a lower-privileged user"
    /// style checks.
    pub fn level(&self) -> u8 {
        match self {
            RoleKind::User => 1,
            RoleKind::Admin => 2,
            RoleKind::SystemAdmin => 3,
        }
    }
}

pub fn has_higher_role(a: RoleKind, b: RoleKind) -> bool {
    a.level() > b.level()
}
