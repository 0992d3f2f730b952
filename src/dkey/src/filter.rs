//! Per-category policy deciding which notices reach a sink.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::descriptor::Severity;

/// What to do with a notice of a given category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningAction {
    /// Use the built-in behaviour for the category.
    #[default]
    Default,
    /// Forward every notice.
    Always,
    /// Forward the first notice for each distinct message.
    Once,
    /// Drop the notice.
    Ignore,
    /// Forward the notice marked as escalated.
    Error,
}

impl WarningAction {
    /// Built-in behaviour: developer notices are hidden, everything else
    /// is shown once.
    pub fn builtin_for(severity: &Severity) -> Self {
        match severity.clone().normalized() {
            Severity::Developer => Self::Ignore,
            Severity::EndUser | Severity::Custom(_) => Self::Once,
        }
    }
}

impl std::fmt::Display for WarningAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Always => write!(f, "always"),
            Self::Once => write!(f, "once"),
            Self::Ignore => write!(f, "ignore"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Filter configuration.
///
/// Per-tag entries in `categories` win over the `developer`, `end_user` and
/// `custom` slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningFilter {
    /// Action for `developer` notices.
    #[serde(default)]
    pub developer: WarningAction,
    /// Action for `end user` notices.
    #[serde(default)]
    pub end_user: WarningAction,
    /// Action for custom tags without their own entry.
    #[serde(default)]
    pub custom: WarningAction,
    /// Overrides by category name.
    #[serde(default)]
    pub categories: HashMap<String, WarningAction>,
}

impl WarningFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward every notice of every category.
    pub fn always() -> Self {
        Self {
            developer: WarningAction::Always,
            end_user: WarningAction::Always,
            custom: WarningAction::Always,
            categories: HashMap::new(),
        }
    }

    /// Set the action for one category.
    pub fn with_action(mut self, severity: impl Into<Severity>, action: WarningAction) -> Self {
        match severity.into().normalized() {
            Severity::Developer => self.developer = action,
            Severity::EndUser => self.end_user = action,
            Severity::Custom(tag) => {
                self.categories.insert(tag, action);
            }
        }
        self
    }

    /// Set the fallback action for custom tags.
    pub fn with_custom_default(mut self, action: WarningAction) -> Self {
        self.custom = action;
        self
    }

    /// Resolve the action for a category. Never returns [`WarningAction::Default`].
    pub fn action_for(&self, severity: &Severity) -> WarningAction {
        let configured = match self.categories.get(severity.as_str()) {
            Some(action) => *action,
            None => match severity.clone().normalized() {
                Severity::Developer => self.developer,
                Severity::EndUser => self.end_user,
                Severity::Custom(_) => self.custom,
            },
        };

        match configured {
            WarningAction::Default => WarningAction::builtin_for(severity),
            action => action,
        }
    }
}
