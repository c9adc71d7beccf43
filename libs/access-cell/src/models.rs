use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use shared_models::auth::Identity;
use shared_models::role::Role;

pub const SIGN_IN_PATH: &str = "/sign-in";
pub const ONBOARDING_PATH: &str = "/complete-profile";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";
pub const RESTRICTED_NOTICE: &str = "You do not have permission to view this page.";

/// Set of roles allowed on a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoleSet(u8);

impl RoleSet {
    pub const EMPTY: RoleSet = RoleSet(0);

    pub fn all() -> Self {
        Self::of(&Role::ALL)
    }

    pub fn of(roles: &[Role]) -> Self {
        roles.iter().fold(Self::EMPTY, |set, role| set.with(*role))
    }

    fn bit(role: Role) -> u8 {
        match role {
            Role::Patient => 1 << 0,
            Role::Doctor => 1 << 1,
            Role::Admin => 1 << 2,
            Role::Caretaker => 1 << 3,
            Role::LabReporter => 1 << 4,
            Role::Nurse => 1 << 5,
        }
    }

    pub fn with(self, role: Role) -> Self {
        RoleSet(self.0 | Self::bit(role))
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0 & Self::bit(role) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn roles(&self) -> Vec<Role> {
        Role::ALL.into_iter().filter(|r| self.contains(*r)).collect()
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.roles().iter().map(Role::as_str).collect();
        f.write_str(&names.join(", "))
    }
}

impl Serialize for RoleSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.roles().serialize(serializer)
    }
}

/// What the gate knows about the caller before looking at the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerState {
    Unauthenticated,
    /// Signed in, but with no profile or an incomplete one.
    Onboarding,
    Active(Role),
}

impl CallerState {
    pub fn role(&self) -> Option<Role> {
        match self {
            CallerState::Active(role) => Some(*role),
            CallerState::Unauthenticated | CallerState::Onboarding => None,
        }
    }
}

/// Resolved caller, attached to request extensions once the gate lets a
/// request through.
#[derive(Debug, Clone)]
pub struct Caller {
    pub identity: Option<Identity>,
    pub state: CallerState,
}

impl Caller {
    pub fn anonymous() -> Self {
        Self {
            identity: None,
            state: CallerState::Unauthenticated,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Proceed,
    RedirectToSignIn,
    RedirectToOnboarding,
    Deny { required: RoleSet },
}

impl AccessDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessDecision::Proceed => "proceed",
            AccessDecision::RedirectToSignIn => "redirect_to_sign_in",
            AccessDecision::RedirectToOnboarding => "redirect_to_onboarding",
            AccessDecision::Deny { .. } => "deny",
        }
    }

    /// How a page should render this decision.
    pub fn present(&self, mode: DenialMode) -> Presentation {
        match (self, mode) {
            (AccessDecision::Proceed, _) => Presentation::default(),
            (AccessDecision::RedirectToSignIn, _) => Presentation {
                redirect_to: Some(SIGN_IN_PATH),
                notice: None,
            },
            (AccessDecision::RedirectToOnboarding, _) => Presentation {
                redirect_to: Some(ONBOARDING_PATH),
                notice: None,
            },
            (AccessDecision::Deny { .. }, DenialMode::Redirect) => Presentation {
                redirect_to: Some(UNAUTHORIZED_PATH),
                notice: None,
            },
            (AccessDecision::Deny { .. }, DenialMode::InlineNotice) => Presentation {
                redirect_to: None,
                notice: Some(RESTRICTED_NOTICE),
            },
        }
    }
}

/// Two renderings of the same denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialMode {
    #[default]
    Redirect,
    InlineNotice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    pub redirect_to: Option<&'static str>,
    pub notice: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct AccessCheckQuery {
    pub path: Option<String>,
    pub method: Option<String>,
    #[serde(default)]
    pub mode: DenialMode,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessCheckResponse {
    pub path: String,
    pub decision: &'static str,
    pub allowed: bool,
    pub authenticated: bool,
    pub role: Option<Role>,
    pub required_roles: Option<RoleSet>,
    #[serde(flatten)]
    pub presentation: Presentation,
}
