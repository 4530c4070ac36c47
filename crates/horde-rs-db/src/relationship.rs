//! Relationship declarations between record types.
//!
//! A [`Relationship`] is owned by the parent record and names the related
//! record type, the parent-side key, and the child-side key. Join paths are
//! dot-separated chains of relationship names, resolved hop by hop with
//! [`resolve_chain`].

use std::fmt;

use horde_rs_core::{HordeError, HordeResult};

use crate::schema::RecordMeta;

/// The cardinality of a relationship.
///
/// Every kind is materialized as a sequence of related records. The
/// two-character code is the compact form used in serialized declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// One related record per parent.
    HasOne,
    /// Any number of related records per parent.
    HasMany,
    /// Many-to-many through the declared keys.
    BelongsToMany,
    /// The parent points at exactly one owner.
    BelongsToOne,
}

impl RelationKind {
    /// The two-character code of this kind.
    pub const fn code(self) -> &'static str {
        match self {
            Self::HasOne => "00",
            Self::HasMany => "01",
            Self::BelongsToMany => "02",
            Self::BelongsToOne => "03",
        }
    }

    /// Parses a two-character code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "00" => Some(Self::HasOne),
            "01" => Some(Self::HasMany),
            "02" => Some(Self::BelongsToMany),
            "03" => Some(Self::BelongsToOne),
            _ => None,
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A named link from a parent record type to a related record type.
///
/// `related` is a function rather than a reference so that record types can
/// refer to each other (and to themselves) from their static declarations.
#[derive(Debug, Clone, Copy)]
pub struct Relationship {
    /// The relationship name, used as a join path segment and as the key of
    /// the nested collection in materialized records.
    pub name: &'static str,
    /// Returns the declaration of the related record type.
    pub related: fn() -> &'static RecordMeta,
    /// The storage column on the parent table.
    pub parent_key: &'static str,
    /// The storage column on the related table.
    pub child_key: &'static str,
    /// The cardinality.
    pub kind: RelationKind,
}

impl Relationship {
    /// Creates a relationship declaration.
    pub const fn new(
        name: &'static str,
        related: fn() -> &'static RecordMeta,
        parent_key: &'static str,
        child_key: &'static str,
        kind: RelationKind,
    ) -> Self {
        Self {
            name,
            related,
            parent_key,
            child_key,
            kind,
        }
    }

    /// Returns the declaration of the related record type.
    pub fn related_meta(&self) -> &'static RecordMeta {
        (self.related)()
    }
}

impl RecordMeta {
    /// Looks up a relationship this record owns.
    pub fn relationship(&self, name: &str) -> HordeResult<&Relationship> {
        self.relations
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| HordeError::UnknownRelationship {
                record: self.type_name.to_string(),
                name: name.to_string(),
            })
    }
}

/// One resolved hop of a join path.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedLink {
    /// The record type that owns the relationship.
    pub parent: &'static RecordMeta,
    /// The relationship followed.
    pub relationship: &'static Relationship,
}

impl ResolvedLink {
    /// The record type reached by this hop.
    pub fn child(&self) -> &'static RecordMeta {
        self.relationship.related_meta()
    }
}

/// Resolves a dot-separated relationship chain starting at `root`.
///
/// Each segment is looked up on the record type reached by the previous
/// segment. An empty segment or an undeclared name fails with
/// [`HordeError::UnknownRelationship`] against the record it was looked up on.
pub fn resolve_chain(root: &'static RecordMeta, path: &str) -> HordeResult<Vec<ResolvedLink>> {
    let mut current = root;
    let mut links = Vec::new();
    for segment in path.split('.') {
        let relationship = current.relationship(segment)?;
        links.push(ResolvedLink {
            parent: current,
            relationship,
        });
        current = relationship.related_meta();
    }
    Ok(links)
}
