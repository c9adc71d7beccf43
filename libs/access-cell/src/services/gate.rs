use axum::http::Method;
use tracing::debug;

use shared_models::role::Role;

use crate::models::{AccessDecision, CallerState, RoleSet};

/// Roles allowed under a path prefix, optionally for one method only.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    pub prefix: &'static str,
    pub method: Option<Method>,
    pub allowed: RoleSet,
}

impl RoutePolicy {
    pub fn any_method(prefix: &'static str, allowed: &[Role]) -> Self {
        Self {
            prefix,
            method: None,
            allowed: RoleSet::of(allowed),
        }
    }

    pub fn for_method(method: Method, prefix: &'static str, allowed: &[Role]) -> Self {
        Self {
            prefix,
            method: Some(method),
            allowed: RoleSet::of(allowed),
        }
    }

    fn applies_to(&self, method: &Method, path: &str) -> bool {
        self.method.as_ref().map_or(true, |m| m == method) && path_matches(self.prefix, path)
    }
}

/// Route access table plus the decision procedure over it.
#[derive(Debug, Clone)]
pub struct AccessGate {
    public: Vec<&'static str>,
    onboarding_exempt: Vec<&'static str>,
    policies: Vec<RoutePolicy>,
}

/// `prefix` matches itself and anything below it on a segment boundary.
fn path_matches(prefix: &str, path: &str) -> bool {
    if prefix == "/" {
        return path == "/";
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

impl AccessGate {
    pub fn new(
        public: Vec<&'static str>,
        onboarding_exempt: Vec<&'static str>,
        policies: Vec<RoutePolicy>,
    ) -> Self {
        Self {
            public,
            onboarding_exempt,
            policies,
        }
    }

    /// Route table for the dashboard pages and the API.
    pub fn standard() -> Self {
        use Role::*;

        let care_team = [Patient, Caretaker, Doctor, Nurse, Admin];

        Self::new(
            vec![
                "/",
                "/sign-in",
                "/sign-up",
                "/webhooks",
                "/auth/callback",
                "/complete-profile",
                "/auth/complete-profile",
                "/auth/sync",
                "/health",
                "/access/check",
            ],
            vec![
                "/complete-profile",
                "/auth/complete-profile",
                "/auth/sync",
                "/auth/me",
                "/auth/callback",
                "/webhooks",
                "/access/check",
                "/health",
            ],
            vec![
                // Dashboard pages
                RoutePolicy::any_method("/doctor", &[Doctor, Admin]),
                RoutePolicy::any_method("/patient", &[Patient, Caretaker, Admin]),
                RoutePolicy::any_method("/admin", &[Admin]),
                RoutePolicy::any_method("/lab", &[LabReporter, Admin]),
                RoutePolicy::any_method("/nurse", &[Nurse, Admin]),
                RoutePolicy::any_method("/dashboard", &Role::ALL),
                // API
                RoutePolicy::any_method("/users", &Role::ALL),
                RoutePolicy::for_method(Method::POST, "/live-sessions", &[Doctor]),
                RoutePolicy::any_method("/live-sessions/doctor", &[Doctor, Admin]),
                RoutePolicy::any_method("/live-sessions/patient", &[Patient, Caretaker, Doctor, Admin]),
                RoutePolicy::any_method("/appointments", &care_team),
                RoutePolicy::any_method("/vitals", &care_team),
                RoutePolicy::any_method("/documents", &Role::ALL),
                RoutePolicy::any_method("/notifications", &Role::ALL),
                RoutePolicy::any_method("/prescriptions", &care_team),
                RoutePolicy::for_method(Method::POST, "/prescriptions", &[Doctor, Admin]),
                RoutePolicy::for_method(Method::PATCH, "/prescriptions", &[Doctor, Admin]),
            ],
        )
    }

    pub fn is_public(&self, path: &str) -> bool {
        let path = normalize(path);
        self.public.iter().any(|prefix| path_matches(prefix, path))
    }

    pub fn is_onboarding_exempt(&self, path: &str) -> bool {
        let path = normalize(path);
        self.onboarding_exempt.iter().any(|prefix| path_matches(prefix, path))
    }

    /// Most specific policy for the request: longest prefix first, and a
    /// method-bound policy over a method-agnostic one of equal length.
    pub fn policy_for(&self, method: &Method, path: &str) -> Option<&RoutePolicy> {
        let path = normalize(path);
        self.policies
            .iter()
            .filter(|policy| policy.applies_to(method, path))
            .max_by_key(|policy| (policy.prefix.len(), policy.method.is_some()))
    }

    /// Pure function of its inputs; never touches storage.
    pub fn decide(&self, caller: &CallerState, method: &Method, path: &str) -> AccessDecision {
        let decision = if self.is_public(path) {
            AccessDecision::Proceed
        } else {
            match caller {
                CallerState::Unauthenticated => AccessDecision::RedirectToSignIn,
                CallerState::Onboarding if self.is_onboarding_exempt(path) => AccessDecision::Proceed,
                CallerState::Onboarding => AccessDecision::RedirectToOnboarding,
                CallerState::Active(role) => match self.policy_for(method, path) {
                    Some(policy) if !policy.allowed.contains(*role) => AccessDecision::Deny {
                        required: policy.allowed,
                    },
                    _ => AccessDecision::Proceed,
                },
            }
        };

        debug!("Access {} {} as {:?}: {}", method, path, caller, decision.as_str());
        decision
    }
}

impl Default for AccessGate {
    fn default() -> Self {
        Self::standard()
    }
}
