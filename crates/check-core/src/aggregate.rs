//! Diagnostic aggregation across producers.
//!
//! The aggregator owns, per producer, the set of diagnostics that producer
//! last reported (its *partition*). A partition is replaced wholesale on each
//! accepted final report — never merged incrementally — so stale diagnostics
//! from a producer's previous cycle can never coexist with its new ones, and
//! no producer's report can touch another producer's partition.

use std::collections::BTreeMap;

use crate::diagnostics::{Diagnostic, ProducerId};
use crate::registry::TypeRegistry;

/// Owns all diagnostics currently valid for a document, partitioned by the
/// producer that reported them.
#[derive(Debug, Default)]
pub struct DiagnosticAggregator {
    partitions: BTreeMap<ProducerId, Vec<Diagnostic>>,
}

impl DiagnosticAggregator {
    /// Create an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace one producer's partition with a new diagnostic set.
    ///
    /// Every diagnostic is stamped with `producer` as its owner. Other
    /// partitions are untouched.
    pub fn replace_partition(&mut self, producer: ProducerId, mut diagnostics: Vec<Diagnostic>) {
        for diagnostic in &mut diagnostics {
            diagnostic.stamp_owner(producer);
        }
        self.partitions.insert(producer, diagnostics);
    }

    /// Empty one producer's partition (disablement, mode turn-off).
    pub fn clear(&mut self, producer: ProducerId) {
        self.partitions.remove(&producer);
    }

    /// Drop every partition.
    pub fn clear_all(&mut self) {
        self.partitions.clear();
    }

    /// The diagnostics one producer last reported.
    pub fn partition(&self, producer: ProducerId) -> &[Diagnostic] {
        self.partitions
            .get(&producer)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Union across partitions, ordered by `begin` ascending, ties broken by
    /// descending severity and then by producer registration order.
    ///
    /// This ordering is stable; navigation and rendering consumers rely on it.
    pub fn all<'a>(&'a self, registry: &TypeRegistry) -> impl Iterator<Item = &'a Diagnostic> {
        let mut merged: Vec<&Diagnostic> = self.partitions.values().flatten().collect();
        merged.sort_by(|a, b| {
            a.begin()
                .cmp(&b.begin())
                .then_with(|| {
                    registry
                        .severity(b.type_key())
                        .cmp(&registry.severity(a.type_key()))
                })
                .then_with(|| a.owner().cmp(&b.owner()))
        });
        merged.into_iter()
    }

    /// Partition the union into `(error_class, other)` counts.
    pub fn counts(&self, registry: &TypeRegistry) -> (usize, usize) {
        let mut errors = 0;
        let mut others = 0;
        for diagnostic in self.partitions.values().flatten() {
            if registry.is_error(diagnostic.type_key()) {
                errors += 1;
            } else {
                others += 1;
            }
        }
        (errors, others)
    }

    /// Total number of diagnostics across all partitions.
    pub fn len(&self) -> usize {
        self.partitions.values().map(Vec::len).sum()
    }

    /// Returns `true` if no partition holds any diagnostic.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DocumentId;
    use crate::registry::TypeKey;

    fn diag(begin: usize, end: usize, key: TypeKey) -> Diagnostic {
        Diagnostic::new(DocumentId::new(1), begin, end, key, "msg")
    }

    fn registry() -> TypeRegistry {
        TypeRegistry::with_builtin_types()
    }

    #[test]
    fn test_replace_stamps_owner() {
        let mut aggregator = DiagnosticAggregator::new();
        aggregator.replace_partition(ProducerId::new(3), vec![diag(0, 1, TypeKey::error())]);

        let partition = aggregator.partition(ProducerId::new(3));
        assert_eq!(partition.len(), 1);
        assert_eq!(partition[0].owner(), Some(ProducerId::new(3)));
    }

    #[test]
    fn test_replace_is_isolated_per_producer() {
        let mut aggregator = DiagnosticAggregator::new();
        aggregator.replace_partition(ProducerId::new(0), vec![diag(0, 1, TypeKey::error())]);
        aggregator.replace_partition(ProducerId::new(1), vec![diag(5, 6, TypeKey::warning())]);

        // Overwriting producer 0 leaves producer 1 untouched.
        aggregator.replace_partition(ProducerId::new(0), vec![diag(2, 3, TypeKey::note())]);
        assert_eq!(aggregator.partition(ProducerId::new(0))[0].begin(), 2);
        assert_eq!(aggregator.partition(ProducerId::new(1))[0].begin(), 5);
        assert_eq!(aggregator.len(), 2);
    }

    #[test]
    fn test_replace_discards_previous_cycle_wholesale() {
        let mut aggregator = DiagnosticAggregator::new();
        aggregator.replace_partition(
            ProducerId::new(0),
            vec![diag(0, 1, TypeKey::error()), diag(4, 5, TypeKey::error())],
        );
        aggregator.replace_partition(ProducerId::new(0), vec![diag(9, 10, TypeKey::note())]);

        let partition = aggregator.partition(ProducerId::new(0));
        assert_eq!(partition.len(), 1);
        assert_eq!(partition[0].begin(), 9);
    }

    #[test]
    fn test_all_is_ordered_by_begin_then_severity_then_producer() {
        let registry = registry();
        let mut aggregator = DiagnosticAggregator::new();
        aggregator.replace_partition(
            ProducerId::new(1),
            vec![diag(4, 5, TypeKey::warning()), diag(0, 2, TypeKey::note())],
        );
        aggregator.replace_partition(
            ProducerId::new(0),
            vec![diag(4, 6, TypeKey::error()), diag(0, 1, TypeKey::note())],
        );

        let ordered: Vec<(usize, String, u32)> = aggregator
            .all(&registry)
            .map(|d| {
                (
                    d.begin(),
                    d.type_key().to_string(),
                    d.owner().unwrap().get(),
                )
            })
            .collect();

        // Same begin: higher severity first; same severity: registration order.
        assert_eq!(
            ordered,
            vec![
                (0, "note".to_string(), 0),
                (0, "note".to_string(), 1),
                (4, "error".to_string(), 0),
                (4, "warning".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_counts_partition_by_error_threshold() {
        let registry = registry();
        let mut aggregator = DiagnosticAggregator::new();
        aggregator.replace_partition(
            ProducerId::new(0),
            vec![
                diag(0, 1, TypeKey::error()),
                diag(2, 3, TypeKey::warning()),
                diag(4, 5, TypeKey::note()),
            ],
        );

        assert_eq!(aggregator.counts(&registry), (1, 2));
        assert_eq!(
            aggregator.all(&registry).count(),
            aggregator.counts(&registry).0 + aggregator.counts(&registry).1
        );
    }

    #[test]
    fn test_clear_single_partition() {
        let mut aggregator = DiagnosticAggregator::new();
        aggregator.replace_partition(ProducerId::new(0), vec![diag(0, 1, TypeKey::error())]);
        aggregator.replace_partition(ProducerId::new(1), vec![diag(1, 2, TypeKey::error())]);

        aggregator.clear(ProducerId::new(0));
        assert!(aggregator.partition(ProducerId::new(0)).is_empty());
        assert_eq!(aggregator.partition(ProducerId::new(1)).len(), 1);

        aggregator.clear_all();
        assert!(aggregator.is_empty());
    }
}
