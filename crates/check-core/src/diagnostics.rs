//! Diagnostic data model.
//!
//! A [`Diagnostic`] is a reported problem with a type, a message, and a half-open
//! **character-offset** range (`begin..end`) in the document, the same offset
//! convention used by the rest of the engine. Diagnostics are created by
//! producers and owned by the aggregator; the `owner` field is stamped by the
//! coordinator when a final report is accepted, never by the producer itself.

use crate::region::{RegionError, RegionResolver};
use crate::registry::TypeKey;
use crate::snapshot::SnapshotSource;

/// Opaque identifier for the document a check session coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(u64);

impl DocumentId {
    /// Create a document id from a host-assigned number.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Opaque identifier for a registered producer.
///
/// Ids are assigned in registration order, which is also the tie-break order
/// used by the merged diagnostic view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProducerId(u32);

impl ProducerId {
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    /// Get the underlying registration index.
    pub fn get(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single reported problem for a document.
///
/// Immutable after construction except for the owner stamp applied on
/// acceptance. The range is normalized so `begin <= end` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    document: DocumentId,
    begin: usize,
    end: usize,
    type_key: TypeKey,
    text: String,
    owner: Option<ProducerId>,
}

impl Diagnostic {
    /// Create a diagnostic over an explicit half-open char range.
    ///
    /// A reversed range is normalized rather than rejected.
    pub fn new(
        document: DocumentId,
        begin: usize,
        end: usize,
        type_key: TypeKey,
        text: impl Into<String>,
    ) -> Self {
        let (begin, end) = if begin <= end { (begin, end) } else { (end, begin) };
        Self {
            document,
            begin,
            end,
            type_key,
            text: text.into(),
            owner: None,
        }
    }

    /// Create a diagnostic from a positional hint (1-based line, optional
    /// 1-based column) by resolving it against a document snapshot.
    ///
    /// Fails with [`RegionError`] when the snapshot cannot be resolved; the
    /// caller is expected to log and drop the diagnostic in that case.
    pub fn at_position<S: SnapshotSource + ?Sized>(
        document: DocumentId,
        snapshot: &S,
        resolver: &RegionResolver,
        line: usize,
        column: Option<usize>,
        type_key: TypeKey,
        text: impl Into<String>,
    ) -> Result<Self, RegionError> {
        let region = resolver.resolve(snapshot, line, column)?;
        Ok(Self::new(document, region.start, region.end, type_key, text))
    }

    /// The document this diagnostic belongs to.
    pub fn document(&self) -> DocumentId {
        self.document
    }

    /// Inclusive start char offset.
    pub fn begin(&self) -> usize {
        self.begin
    }

    /// Exclusive end char offset.
    pub fn end(&self) -> usize {
        self.end
    }

    /// The diagnostic type key (resolved to a severity via the registry).
    pub fn type_key(&self) -> &TypeKey {
        &self.type_key
    }

    /// Human-readable message.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The producer whose final report carried this diagnostic.
    ///
    /// `None` until the report is accepted by the aggregator.
    pub fn owner(&self) -> Option<ProducerId> {
        self.owner
    }

    /// Length of the range in characters.
    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    /// Returns `true` if the range is degenerate.
    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    pub(crate) fn stamp_owner(&mut self, owner: ProducerId) {
        if self.owner.is_none() {
            self.owner = Some(owner);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reversed_range_is_normalized() {
        let d = Diagnostic::new(DocumentId::new(1), 9, 4, TypeKey::error(), "oops");
        assert_eq!(d.begin(), 4);
        assert_eq!(d.end(), 9);
        assert_eq!(d.len(), 5);
    }

    #[test]
    fn test_owner_is_stamped_once() {
        let mut d = Diagnostic::new(DocumentId::new(1), 0, 1, TypeKey::warning(), "w");
        assert_eq!(d.owner(), None);

        d.stamp_owner(ProducerId::new(2));
        assert_eq!(d.owner(), Some(ProducerId::new(2)));

        // A second stamp does not overwrite the first.
        d.stamp_owner(ProducerId::new(7));
        assert_eq!(d.owner(), Some(ProducerId::new(2)));
    }

    #[test]
    fn test_empty_range() {
        let d = Diagnostic::new(DocumentId::new(1), 3, 3, TypeKey::note(), "n");
        assert!(d.is_empty());
        assert_eq!(d.len(), 0);
    }
}
