// Structured command identifiers: namespace@scope:entity:id[@version]

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;
use uuid::Uuid;

use crate::config::IdentityConfig;

static ASEID_PATTERN: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<namespace>[\w.-]+)@(?P<scope>[\w.-]+):(?P<entity>[\w.-]+):(?P<id>[\w.-]+)(?:@(?P<version>[\w.-]+))?$",
    )
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AseidError {
    #[error("Invalid command identifier '{0}', expected namespace@scope:entity:id[@version]")]
    Invalid(String),
    #[error("Identifier pattern unavailable: {0}")]
    Pattern(String),
}

/// Globally unique, structured command identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Aseid {
    namespace: String,
    scope: String,
    entity: String,
    id: String,
    version: Option<String>,
}

impl Aseid {
    pub fn new(
        namespace: impl Into<String>,
        scope: impl Into<String>,
        entity: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            scope: scope.into(),
            entity: entity.into(),
            id: id.into(),
            version: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Mint a fresh identifier for `entity` using the configured namespace and scope
    pub fn generate(identity: &IdentityConfig, entity: &str) -> Self {
        let aseid = Self::new(
            identity.namespace.as_str(),
            identity.scope.as_str(),
            entity,
            Uuid::new_v4().simple().to_string(),
        );
        match &identity.version {
            Some(version) => aseid.with_version(version.as_str()),
            None => aseid,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

impl fmt::Display for Aseid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}:{}", self.namespace, self.scope, self.entity, self.id)?;
        if let Some(version) = &self.version {
            write!(f, "@{version}")?;
        }
        Ok(())
    }
}

impl FromStr for Aseid {
    type Err = AseidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pattern = ASEID_PATTERN
            .as_ref()
            .map_err(|e| AseidError::Pattern(e.to_string()))?;
        let caps = pattern
            .captures(s.trim())
            .ok_or_else(|| AseidError::Invalid(s.to_string()))?;

        Ok(Self {
            namespace: caps["namespace"].to_string(),
            scope: caps["scope"].to_string(),
            entity: caps["entity"].to_string(),
            id: caps["id"].to_string(),
            version: caps.name("version").map(|m| m.as_str().to_string()),
        })
    }
}

impl TryFrom<String> for Aseid {
    type Error = AseidError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Aseid> for String {
    fn from(aseid: Aseid) -> Self {
        aseid.to_string()
    }
}
