//! Current-page token persisted alongside the session.

use serde::{Deserialize, Serialize};

/// A top-level screen of the product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    Login,
    Register,
    Onboarding,
    Dashboard,
    Leads,
    Calls,
    Appointments,
    Agents,
    Billing,
    Analytics,
    Settings,
    Admin,
    Support,
}

impl Page {
    /// Token stored under the `currentPage` key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Register => "register",
            Self::Onboarding => "onboarding",
            Self::Dashboard => "dashboard",
            Self::Leads => "leads",
            Self::Calls => "calls",
            Self::Appointments => "appointments",
            Self::Agents => "agents",
            Self::Billing => "billing",
            Self::Analytics => "analytics",
            Self::Settings => "settings",
            Self::Admin => "admin",
            Self::Support => "support",
        }
    }

    /// Parse a stored token, falling back to the dashboard for anything
    /// unrecognized.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        token.parse().unwrap_or(Self::Dashboard)
    }

    /// Whether the page is only reachable with a signed-in user.
    #[must_use]
    pub const fn requires_auth(self) -> bool {
        !matches!(self, Self::Login | Self::Register | Self::Onboarding)
    }
}

impl std::fmt::Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Page {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "login" => Ok(Self::Login),
            "register" => Ok(Self::Register),
            "onboarding" => Ok(Self::Onboarding),
            "dashboard" => Ok(Self::Dashboard),
            "leads" => Ok(Self::Leads),
            "calls" => Ok(Self::Calls),
            "appointments" => Ok(Self::Appointments),
            "agents" => Ok(Self::Agents),
            "billing" => Ok(Self::Billing),
            "analytics" => Ok(Self::Analytics),
            "settings" => Ok(Self::Settings),
            "admin" => Ok(Self::Admin),
            "support" => Ok(Self::Support),
            _ => Err(format!("invalid page: {s}")),
        }
    }
}
