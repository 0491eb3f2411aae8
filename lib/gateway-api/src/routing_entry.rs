use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Declared routing entry, as found in a module descriptor.
///
/// Exactly one of `path` (legacy literal prefix) or `path_pattern` is expected
/// to be set; the routing core rejects entries carrying neither. Derived values
/// such as the compiled matcher, the resolved phase level and the proxy type are
/// never part of this shape.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoutingEntrySpec {
    /// HTTP methods (GET, POST, etc). `*` matches any method
    #[serde(default)]
    pub methods: Vec<String>,

    /// Templated path, e.g. "/users/{id}" or "/files/*"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_pattern: Option<String>,

    /// Legacy literal path prefix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Pipeline phase. Overrides `level` when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,

    /// Ordering value within the pipeline (default "50")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Proxy behavior of the entry
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub entry_type: Option<EntryType>,

    /// Rewrite target, only for `type: redirect`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions_required: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions_desired: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_permissions: Option<Vec<String>>,
}

impl RoutingEntrySpec {
    /// Entry for the given methods and path pattern, all other fields unset
    pub fn pattern<M, S>(methods: M, path_pattern: impl Into<String>) -> Self
    where
        M: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            methods: methods.into_iter().map(Into::into).collect(),
            path_pattern: Some(path_pattern.into()),
            ..Default::default()
        }
    }

    /// Entry for the given methods and legacy path prefix
    pub fn prefix<M, S>(methods: M, path: impl Into<String>) -> Self
    where
        M: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            methods: methods.into_iter().map(Into::into).collect(),
            path: Some(path.into()),
            ..Default::default()
        }
    }
}

/// Error returned when a string token is not a known entry type or phase
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid entry type: {0}")]
    EntryType(String),

    #[error("Invalid phase {0}")]
    Phase(String),
}

/// The `type` token of a routing entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum EntryType {
    RequestResponse,
    RequestOnly,
    Headers,
    Redirect,
    /// Gateway-internal interface; proxied like request-response
    System,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::RequestResponse => "request-response",
            EntryType::RequestOnly => "request-only",
            EntryType::Headers => "headers",
            EntryType::Redirect => "redirect",
            EntryType::System => "system",
        }
    }

    /// Proxy behavior the dispatcher applies for this type
    pub fn proxy_type(&self) -> ProxyType {
        match self {
            EntryType::RequestResponse | EntryType::System => ProxyType::RequestResponse,
            EntryType::RequestOnly => ProxyType::RequestOnly,
            EntryType::Headers => ProxyType::Headers,
            EntryType::Redirect => ProxyType::Redirect,
        }
    }
}

impl FromStr for EntryType {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "request-response" => Ok(EntryType::RequestResponse),
            "request-only" => Ok(EntryType::RequestOnly),
            "headers" => Ok(EntryType::Headers),
            "redirect" => Ok(EntryType::Redirect),
            "system" => Ok(EntryType::System),
            other => Err(TokenError::EntryType(other.to_string())),
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline phase of a routing entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Authentication/authorization filters, run ahead of regular handlers
    Auth,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Auth => "auth",
        }
    }
}

impl FromStr for Phase {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auth" => Ok(Phase::Auth),
            other => Err(TokenError::Phase(other.to_string())),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the dispatcher treats a matched entry
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ProxyType {
    /// Forward the request, return the module's response body and headers
    #[default]
    RequestResponse,
    /// Forward the request, discard the module's response
    RequestOnly,
    /// Forward the request, propagate only the response headers
    Headers,
    /// Do not invoke a module; re-enter routing with the rewritten URI
    Redirect,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_type_tokens() {
        assert_eq!("request-only".parse::<EntryType>().unwrap(), EntryType::RequestOnly);
        assert_eq!("system".parse::<EntryType>().unwrap().proxy_type(), ProxyType::RequestResponse);
        assert_eq!("redirect".parse::<EntryType>().unwrap().proxy_type(), ProxyType::Redirect);

        let err = "proxy".parse::<EntryType>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid entry type: proxy");
    }

    #[test]
    fn test_phase_tokens() {
        assert_eq!("auth".parse::<Phase>().unwrap(), Phase::Auth);
        assert_eq!("pre".parse::<Phase>().unwrap_err(), TokenError::Phase("pre".to_string()));
    }

    #[test]
    fn test_deserialize_wire_shape() {
        let spec: RoutingEntrySpec = serde_json::from_str(
            r#"{
                "methods": ["GET", "POST"],
                "pathPattern": "/users/{id}",
                "level": "30",
                "type": "request-only",
                "permissionsRequired": ["users.item.get"]
            }"#,
        )
        .unwrap();

        assert_eq!(spec.methods, vec!["GET", "POST"]);
        assert_eq!(spec.path_pattern.as_deref(), Some("/users/{id}"));
        assert_eq!(spec.level.as_deref(), Some("30"));
        assert_eq!(spec.entry_type, Some(EntryType::RequestOnly));
        assert_eq!(spec.permissions_required, Some(vec!["users.item.get".to_string()]));
        assert!(spec.path.is_none());
        assert!(spec.phase.is_none());
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let result = serde_json::from_str::<RoutingEntrySpec>(
            r#"{"methods": ["GET"], "path": "/x", "type": "stream"}"#,
        );
        assert!(result.is_err());

        let result = serde_json::from_str::<RoutingEntrySpec>(
            r#"{"methods": ["GET"], "path": "/x", "phase": "pre"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_absent_fields_are_not_serialized() {
        let spec = RoutingEntrySpec::pattern(["GET"], "/a");
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json, serde_json::json!({"methods": ["GET"], "pathPattern": "/a"}));
    }
}
