//! Identifier types for agents and pooled resources.
//!
//! Agents carry two identifiers:
//!
//! - [`AgentId`] -- the public string identity. It embeds the agent's
//!   evolution level and is *replaced* every time the agent evolves, so
//!   external indexes keyed by it must be migrated on evolution.
//! - [`AgentKey`] -- a stable per-simulation handle that never changes.
//!   Every weak back-reference (resource owners, scheduled continuations)
//!   uses the key so that evolution never invalidates them.
//!
//! Resources are addressed by [`ResourceId`], a handle issued by the pool
//! provider. Handles are never reused, so a stale id cannot alias a
//! resource that was spawned later.

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Separator between the identity token and the level suffix of an [`AgentId`].
const LEVEL_SEPARATOR: &str = "-lv";

/// Prefix shared by every generated [`AgentId`].
const AGENT_PREFIX: &str = "pet-";

/// Generates a newtype wrapper around a `u64` handle with standard derives.
macro_rules! define_handle {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl $name {
            /// Return the raw handle value.
            pub const fn into_inner(self) -> u64 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

define_handle! {
    /// Stable handle for an agent within one simulation.
    ///
    /// Unlike [`AgentId`], the key survives evolution.
    AgentKey
}

define_handle! {
    /// Handle for a consumable resource issued by the pool provider.
    ResourceId
}

/// Public identity of an agent, e.g. `pet-3f2a...-lv2`.
///
/// The trailing `-lv<N>` suffix names the evolution level the id was issued
/// for. Evolving produces a brand-new id via [`AgentId::for_level`]; the old
/// id must stop resolving everywhere.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Generate a fresh id for an agent at `level`.
    ///
    /// The identity token is a UUID built from `rng`, so a seeded RNG
    /// yields reproducible ids.
    pub fn generate(rng: &mut impl Rng, level: u32) -> Self {
        let mut bytes = [0_u8; 16];
        rng.fill(&mut bytes);
        let token = uuid::Builder::from_random_bytes(bytes).into_uuid();
        Self::from_parts(&format!("{AGENT_PREFIX}{}", token.simple()), level)
    }

    /// Build an id from an explicit identity token and level.
    pub fn from_parts(token: &str, level: u32) -> Self {
        Self(format!("{token}{LEVEL_SEPARATOR}{level}"))
    }

    /// Return the id issued for the same identity at a different level.
    pub fn for_level(&self, level: u32) -> Self {
        Self::from_parts(self.token(), level)
    }

    /// Return the identity token (everything before the level suffix).
    pub fn token(&self) -> &str {
        self.0
            .rsplit_once(LEVEL_SEPARATOR)
            .map_or(self.0.as_str(), |(token, _)| token)
    }

    /// Return the level embedded in the id, if the suffix is well formed.
    pub fn level(&self) -> Option<u32> {
        self.0
            .rsplit_once(LEVEL_SEPARATOR)
            .and_then(|(_, level)| level.parse().ok())
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the nil-token id used by tests and tooling.
    pub fn nil(level: u32) -> Self {
        Self::from_parts(&format!("{AGENT_PREFIX}{}", Uuid::nil().simple()), level)
    }
}

impl core::fmt::Display for AgentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for AgentId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<AgentId> for String {
    fn from(id: AgentId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    #[test]
    fn generated_id_embeds_level() {
        let mut rng = SmallRng::seed_from_u64(7);
        let id = AgentId::generate(&mut rng, 1);
        assert!(id.as_str().starts_with(AGENT_PREFIX));
        assert!(id.as_str().ends_with("-lv1"));
        assert_eq!(id.level(), Some(1));
    }

    #[test]
    fn same_seed_same_id() {
        let a = AgentId::generate(&mut SmallRng::seed_from_u64(99), 1);
        let b = AgentId::generate(&mut SmallRng::seed_from_u64(99), 1);
        assert_eq!(a, b);
    }

    #[test]
    fn for_level_keeps_token_and_changes_id() {
        let id = AgentId::from_parts("pet-abc", 1);
        let evolved = id.for_level(2);
        assert_ne!(id, evolved);
        assert_eq!(evolved.token(), "pet-abc");
        assert_eq!(evolved.level(), Some(2));
        assert_eq!(evolved.as_str(), "pet-abc-lv2");
    }

    #[test]
    fn malformed_suffix_has_no_level() {
        let id = AgentId::from(String::from("pet-abc"));
        assert_eq!(id.level(), None);
        assert_eq!(id.token(), "pet-abc");
    }

    #[test]
    fn id_roundtrip_serde() {
        let original = AgentId::from_parts("pet-xyz", 3);
        let json = serde_json::to_string(&original).ok();
        assert_eq!(json.as_deref(), Some("\"pet-xyz-lv3\""));
        let restored: Result<AgentId, _> = serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(restored.ok(), Some(original));
    }

    #[test]
    fn handle_display_names_type() {
        assert_eq!(ResourceId(4).to_string(), "ResourceId#4");
        assert_eq!(AgentKey::from(9).into_inner(), 9);
    }
}
