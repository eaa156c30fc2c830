//! Plan value object: the subscription a user is on, if any.

use std::fmt;

use crate::domain::foundation::SubscriptionId;

/// Stored value meaning "no active subscription".
pub const NO_PLAN: &str = "none";

/// The plan column of a user record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Plan {
    /// Subscribed through the given provider subscription.
    Subscribed(SubscriptionId),
    /// No active subscription.
    #[default]
    NoPlan,
}

impl Plan {
    /// Interprets a stored plan column.
    ///
    /// `NULL`, the empty string and the `"none"` sentinel all mean no plan.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") | Some(NO_PLAN) => Plan::NoPlan,
            Some(id) => SubscriptionId::new(id)
                .map(Plan::Subscribed)
                .unwrap_or(Plan::NoPlan),
        }
    }

    /// Value written to the plan column.
    pub fn as_stored(&self) -> &str {
        match self {
            Plan::Subscribed(id) => id.as_str(),
            Plan::NoPlan => NO_PLAN,
        }
    }

    pub fn subscription_id(&self) -> Option<&SubscriptionId> {
        match self {
            Plan::Subscribed(id) => Some(id),
            Plan::NoPlan => None,
        }
    }

    pub fn is_subscribed(&self) -> bool {
        matches!(self, Plan::Subscribed(_))
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_stored())
    }
}
