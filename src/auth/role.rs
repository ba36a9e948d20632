use serde_json::Value;

use super::claims::{decode_claims, Claims};
use crate::models::Role;

/// Marker Spring Security puts in front of role authorities.
pub const AUTHORITY_PREFIX: &str = "ROLE_";

type RoleStrategy = fn(&Claims) -> Option<String>;

// Tried in order; the first strategy that yields a value wins.
const STRATEGIES: [RoleStrategy; 3] = [direct_role, first_listed_role, first_authority];

/// Resolve the role name carried by `claims`, or an empty string.
pub fn resolve_role(claims: &Claims) -> String {
    STRATEGIES
        .iter()
        .find_map(|strategy| strategy(claims))
        .unwrap_or_default()
}

fn direct_role(claims: &Claims) -> Option<String> {
    claims.get("role").and_then(non_empty_str)
}

fn first_listed_role(claims: &Claims) -> Option<String> {
    claims
        .get("roles")
        .and_then(Value::as_array)
        .and_then(|roles| roles.first())
        .and_then(non_empty_str)
}

fn first_authority(claims: &Claims) -> Option<String> {
    let first = claims
        .get("authorities")
        .and_then(Value::as_array)?
        .first()?;
    let authority = match first {
        Value::String(name) => name.as_str(),
        Value::Object(granted) => granted.get("authority")?.as_str()?,
        _ => return None,
    };
    let name = authority.strip_prefix(AUTHORITY_PREFIX).unwrap_or(authority);
    (!name.is_empty()).then(|| name.to_string())
}

fn non_empty_str(value: &Value) -> Option<String> {
    value
        .as_str()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Role name as resolved, plus its parsed form when it is one we know.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedRole {
    pub raw: String,
    pub role: Option<Role>,
}

impl ResolvedRole {
    pub fn from_raw(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let role = raw.parse().ok();
        Self { raw, role }
    }

    pub fn from_claims(claims: &Claims) -> Self {
        Self::from_raw(resolve_role(claims))
    }

    pub fn from_credential(credential: &str) -> Self {
        Self::from_claims(&decode_claims(credential))
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}
