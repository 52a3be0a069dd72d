use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Enforcement user role controlling case operations.
///
/// - `Officer`: works own assigned cases; may self-assign from the
///   unassigned pool. Cannot close, reopen, or assign others.
/// - `Supervisor`: assigns, closes, and reopens cases across the service.
/// - `Manager`: full access (superset of supervisor).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Officer,
    Supervisor,
    Manager,
}

impl UserRole {
    /// Parse from a JWT `role` claim. Unknown values are rejected rather
    /// than silently downgraded.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "officer" => Some(UserRole::Officer),
            "supervisor" => Some(UserRole::Supervisor),
            "manager" => Some(UserRole::Manager),
            _ => None,
        }
    }

    /// Lowercase string for JWT / wire storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Officer => "officer",
            UserRole::Supervisor => "supervisor",
            UserRole::Manager => "manager",
        }
    }

    /// Supervisors and managers share the elevated permission set.
    pub fn is_supervisor_or_above(&self) -> bool {
        matches!(self, UserRole::Supervisor | UserRole::Manager)
    }
}

/// Team type controlling which case-type sections a member may write.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum TeamType {
    Enforcement,
    EnvironmentalCrimes,
    WasteManagement,
}

impl TeamType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "enforcement" => Some(TeamType::Enforcement),
            "environmental_crimes" => Some(TeamType::EnvironmentalCrimes),
            "waste_management" => Some(TeamType::WasteManagement),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TeamType::Enforcement => "enforcement",
            TeamType::EnvironmentalCrimes => "environmental_crimes",
            TeamType::WasteManagement => "waste_management",
        }
    }
}

/// The minimal actor shape the workflow engine consumes. Produced by the
/// auth extractor from JWT claims; no directory query on the hot path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub role: UserRole,
    #[serde(default)]
    pub team_types: Vec<TeamType>,
}

impl UserSummary {
    pub fn has_team(&self, team: TeamType) -> bool {
        self.team_types.contains(&team)
    }
}
