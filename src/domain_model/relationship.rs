use crate::domain_model::UserId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// The three relationship fields of a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    OwnRequests,
    IncomingRequests,
    Links,
}

impl RecordField {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordField::OwnRequests => "ownRequests",
            RecordField::IncomingRequests => "incomingRequests",
            RecordField::Links => "links",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ownRequests" => Some(RecordField::OwnRequests),
            "incomingRequests" => Some(RecordField::IncomingRequests),
            "links" => Some(RecordField::Links),
            _ => None,
        }
    }
}

/// Address of one entry inside a user record, e.g. `links.<user_id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldPath {
    pub field: RecordField,
    pub key: UserId,
}

impl FieldPath {
    pub fn new(field: RecordField, key: UserId) -> Self {
        Self { field, key }
    }

    pub fn own_request(key: UserId) -> Self {
        Self::new(RecordField::OwnRequests, key)
    }

    pub fn incoming_request(key: UserId) -> Self {
        Self::new(RecordField::IncomingRequests, key)
    }

    pub fn link(key: UserId) -> Self {
        Self::new(RecordField::Links, key)
    }

    /// Parses the dotted form produced by `Display`.
    pub fn parse(s: &str) -> Option<Self> {
        let (field, key) = s.split_once('.')?;
        let field = RecordField::parse(field)?;
        let key = key.parse::<UserId>().ok()?;
        Some(Self { field, key })
    }

    /// Whether `value` has the shape this field stores.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        matches!(
            (self.field, value),
            (RecordField::OwnRequests, FieldValue::Member)
                | (RecordField::IncomingRequests, FieldValue::Member)
                | (RecordField::Links, FieldValue::Link(_))
        )
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.field.as_str(), self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Set membership in a request set.
    Member,
    Link(LinkMeta),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Linked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkMeta {
    pub status: LinkStatus,
}

impl LinkMeta {
    pub fn linked() -> Self {
        Self {
            status: LinkStatus::Linked,
        }
    }
}

/// One user's own view of requests and links. A missing record is the default (empty) one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRelationshipRecord {
    pub own_requests: BTreeSet<UserId>,
    pub incoming_requests: BTreeSet<UserId>,
    pub links: BTreeMap<UserId, LinkMeta>,
}

impl UserRelationshipRecord {
    pub fn is_empty(&self) -> bool {
        self.own_requests.is_empty() && self.incoming_requests.is_empty() && self.links.is_empty()
    }

    pub fn contains(&self, path: &FieldPath) -> bool {
        match path.field {
            RecordField::OwnRequests => self.own_requests.contains(&path.key),
            RecordField::IncomingRequests => self.incoming_requests.contains(&path.key),
            RecordField::Links => self.links.contains_key(&path.key),
        }
    }

    /// Writes one entry. Returns `false` and leaves the record untouched when the
    /// value does not fit the field.
    pub fn set(&mut self, path: &FieldPath, value: FieldValue) -> bool {
        if !path.accepts(&value) {
            return false;
        }
        match (path.field, value) {
            (RecordField::OwnRequests, _) => {
                self.own_requests.insert(path.key);
            }
            (RecordField::IncomingRequests, _) => {
                self.incoming_requests.insert(path.key);
            }
            (RecordField::Links, FieldValue::Link(meta)) => {
                self.links.insert(path.key, meta);
            }
            (RecordField::Links, FieldValue::Member) => return false,
        }
        true
    }

    /// Deleting an absent entry is a no-op.
    pub fn delete(&mut self, path: &FieldPath) {
        match path.field {
            RecordField::OwnRequests => {
                self.own_requests.remove(&path.key);
            }
            RecordField::IncomingRequests => {
                self.incoming_requests.remove(&path.key);
            }
            RecordField::Links => {
                self.links.remove(&path.key);
            }
        }
    }

    pub fn link_ids(&self) -> Vec<UserId> {
        self.links.keys().copied().collect()
    }

    /// State of the relationship toward `other` as seen from this record.
    pub fn state_toward(&self, other: UserId) -> RelationshipState {
        RelationshipState::derive(
            self.own_requests.contains(&other),
            self.incoming_requests.contains(&other),
            self.links.contains_key(&other),
        )
    }
}

/// Relationship of the record owner toward one other user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipState {
    None,
    /// The owner sent a request that is still outstanding.
    Requested,
    /// The owner received a request that is still outstanding.
    Received,
    Linked,
}

impl RelationshipState {
    /// Requested > Received > Linked > None. When a record carries more than one
    /// fragment for the same user, the in-flight state is shown.
    pub fn derive(requested: bool, received: bool, linked: bool) -> Self {
        if requested {
            RelationshipState::Requested
        } else if received {
            RelationshipState::Received
        } else if linked {
            RelationshipState::Linked
        } else {
            RelationshipState::None
        }
    }
}

impl fmt::Display for RelationshipState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelationshipState::None => "none",
            RelationshipState::Requested => "requested",
            RelationshipState::Received => "received",
            RelationshipState::Linked => "linked",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvariantViolation {
    /// A record references its own owner.
    SelfReference { owner: UserId, field: RecordField },
    /// `from` has an outstanding request to `to` that `to` does not see, or the reverse.
    RequestDuality { from: UserId, to: UserId },
    /// `owner` holds both a request fragment and a link for `other`.
    RequestWhileLinked { owner: UserId, other: UserId },
    /// `owner` links `other` but `other` does not link back.
    LinkAsymmetry { owner: UserId, other: UserId },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::SelfReference { owner, field } => {
                write!(f, "{owner} references itself in {}", field.as_str())
            }
            InvariantViolation::RequestDuality { from, to } => {
                write!(f, "request {from} -> {to} is recorded on one side only")
            }
            InvariantViolation::RequestWhileLinked { owner, other } => {
                write!(f, "{owner} holds a request fragment for linked user {other}")
            }
            InvariantViolation::LinkAsymmetry { owner, other } => {
                write!(f, "{owner} links {other} but not the other way round")
            }
        }
    }
}

fn self_references(owner: UserId, record: &UserRelationshipRecord) -> Vec<InvariantViolation> {
    [
        RecordField::OwnRequests,
        RecordField::IncomingRequests,
        RecordField::Links,
    ]
    .into_iter()
    .filter(|field| record.contains(&FieldPath::new(*field, owner)))
    .map(|field| InvariantViolation::SelfReference { owner, field })
    .collect()
}

/// Checks the pairwise invariants between the records of `a` and `b`.
pub fn pair_violations(
    a: UserId,
    record_a: &UserRelationshipRecord,
    b: UserId,
    record_b: &UserRelationshipRecord,
) -> Vec<InvariantViolation> {
    let mut out = self_references(a, record_a);
    if a == b {
        return out;
    }
    out.extend(self_references(b, record_b));

    for (owner, own, other, theirs) in [(a, record_a, b, record_b), (b, record_b, a, record_a)] {
        if own.own_requests.contains(&other) != theirs.incoming_requests.contains(&owner) {
            out.push(InvariantViolation::RequestDuality {
                from: owner,
                to: other,
            });
        }
        let linked = own.links.contains_key(&other);
        if linked
            && (own.own_requests.contains(&other) || own.incoming_requests.contains(&other))
        {
            out.push(InvariantViolation::RequestWhileLinked { owner, other });
        }
        if linked && !theirs.links.contains_key(&owner) {
            out.push(InvariantViolation::LinkAsymmetry { owner, other });
        }
    }
    out
}
