//! Staff Profile Model

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Staff classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Owner account, implicitly holds every capability
    Master,
    Admin,
    Manager,
    Waiter,
    Kitchen,
    Cashier,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Master => "master",
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Waiter => "waiter",
            Self::Kitchen => "kitchen",
            Self::Cashier => "cashier",
        }
    }
}

/// Named permission gating one category of mutating action
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Orders,
    Tables,
    Stock,
    Users,
    Reports,
    Settings,
    Payments,
}

impl Capability {
    pub const ALL: [Capability; 7] = [
        Capability::Orders,
        Capability::Tables,
        Capability::Stock,
        Capability::Users,
        Capability::Reports,
        Capability::Settings,
        Capability::Payments,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Orders => "orders",
            Self::Tables => "tables",
            Self::Stock => "stock",
            Self::Users => "users",
            Self::Reports => "reports",
            Self::Settings => "settings",
            Self::Payments => "payments",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown capability: {s}"))
    }
}

/// Capability → granted flag
///
/// Decoding drops keys that are not a known [`Capability`], so a stale or
/// hand-edited record can never grant something the evaluator does not know.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct PermissionMap(BTreeMap<Capability, bool>);

impl PermissionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, capability: Capability) -> bool {
        self.0.get(&capability).copied().unwrap_or(false)
    }

    pub fn set(&mut self, capability: Capability, granted: bool) {
        self.0.insert(capability, granted);
    }

    /// Granted capabilities in declaration order
    pub fn granted(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().filter(|(_, v)| **v).map(|(k, _)| *k)
    }
}

impl FromIterator<(Capability, bool)> for PermissionMap {
    fn from_iter<I: IntoIterator<Item = (Capability, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for PermissionMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = HashMap::<String, bool>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .filter_map(|(k, v)| k.parse::<Capability>().ok().map(|c| (c, v)))
            .collect())
    }
}

/// Staff profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: i64,
    pub full_name: String,
    pub role: Role,
    #[serde(default)]
    pub permissions: PermissionMap,
    pub is_active: bool,
}

/// Create profile payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileCreate {
    pub full_name: String,
    pub role: Role,
    /// Role defaults when omitted
    pub permissions: Option<PermissionMap>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_keys_are_dropped() {
        let map: PermissionMap =
            serde_json::from_str(r#"{"orders":true,"integrations":true,"stock":false}"#).unwrap();
        assert!(map.get(Capability::Orders));
        assert!(!map.get(Capability::Stock));
        assert_eq!(map.granted().collect::<Vec<_>>(), vec![Capability::Orders]);
    }

    #[test]
    fn test_missing_capability_denies() {
        let map = PermissionMap::new();
        for cap in Capability::ALL {
            assert!(!map.get(cap));
        }
    }

    #[test]
    fn test_permission_map_serializes_as_object() {
        let mut map = PermissionMap::new();
        map.set(Capability::Tables, true);
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"tables":true}"#);
    }

    #[test]
    fn test_capability_parse() {
        assert_eq!("reports".parse::<Capability>(), Ok(Capability::Reports));
        assert!("Reports".parse::<Capability>().is_err());
        assert!("integrations".parse::<Capability>().is_err());
    }
}
