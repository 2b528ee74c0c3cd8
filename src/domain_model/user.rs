use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub uuid::Uuid);

impl UserId {
    /// Stable id derived from a username, the scheme used by the fake identity provider.
    pub fn from_username(username: &str) -> Self {
        UserId(uuid::Uuid::new_v5(
            &uuid::Uuid::NAMESPACE_OID,
            username.as_bytes(),
        ))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::from_str(s).map(UserId)
    }
}

/// Unordered pair of distinct users, normalized so `min() < max()`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct UserPair(UserId, UserId);

impl UserPair {
    pub fn new(a: UserId, b: UserId) -> Option<Self> {
        if a == b {
            return None;
        }
        if a < b { Some(Self(a, b)) } else { Some(Self(b, a)) }
    }

    pub fn min(&self) -> UserId {
        self.0
    }

    pub fn max(&self) -> UserId {
        self.1
    }
}

impl fmt::Display for UserPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~{}", self.0, self.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_ids_are_stable() {
        assert_eq!(UserId::from_username("ada"), UserId::from_username("ada"));
        assert_ne!(UserId::from_username("ada"), UserId::from_username("bob"));
    }

    #[test]
    fn pair_is_normalized_and_rejects_self() {
        let a = UserId::from_username("ada");
        let b = UserId::from_username("bob");
        let ab = UserPair::new(a, b).unwrap();
        let ba = UserPair::new(b, a).unwrap();
        assert_eq!(ab, ba);
        assert!(ab.min() < ab.max());
        assert!(UserPair::new(a, a).is_none());
    }

    #[test]
    fn user_id_parses_from_display() {
        let a = UserId::from_username("ada");
        let parsed: UserId = a.to_string().parse().unwrap();
        assert_eq!(parsed, a);
    }
}
