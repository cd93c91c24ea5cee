use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Configuration;
use crate::fingerprint::FingerprintKey;

/// A curated, read-only gallery template. Names are unique within the gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub description: String,
    pub config: Configuration,
}

/// A template the user saved. Identified by a host-generated id; names may repeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub config: Configuration,
    pub created_at: DateTime<Utc>,
    /// Stamped by the host whenever the template is applied.
    pub last_used_at: DateTime<Utc>,
}

/// Request body for creating a user template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUserTemplate {
    pub name: String,
    pub description: String,
    pub config: Configuration,
}

/// Either kind of template, as it appears in the combined catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateRef {
    Gallery(Template),
    User(UserTemplate),
}

impl TemplateRef {
    pub fn name(&self) -> &str {
        match self {
            Self::Gallery(t) => &t.name,
            Self::User(t) => &t.name,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::Gallery(t) => &t.description,
            Self::User(t) => &t.description,
        }
    }

    pub fn config(&self) -> &Configuration {
        match self {
            Self::Gallery(t) => &t.config,
            Self::User(t) => &t.config,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::Gallery(_) => None,
            Self::User(t) => Some(&t.id),
        }
    }

    pub fn fingerprint_key(&self) -> FingerprintKey {
        match self {
            Self::Gallery(t) => FingerprintKey::Gallery(t.name.clone()),
            Self::User(t) => FingerprintKey::User(t.id.clone()),
        }
    }
}

impl From<Template> for TemplateRef {
    fn from(t: Template) -> Self {
        Self::Gallery(t)
    }
}

impl From<UserTemplate> for TemplateRef {
    fn from(t: UserTemplate) -> Self {
        Self::User(t)
    }
}
