//! Association reconciler.
//!
//! Moves a product's persisted link rows to a newly selected id set with the
//! minimal number of calls: diff, then every add, then every remove, one at a
//! time. The first failing call stops the batch; nothing is rolled back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use gpsrhub_core::{CatalogId, ProductId};
use gpsrhub_products::{Association, AssociationKind, Linked, QuestionAnswer, diff};

use crate::error::CollaboratorError;
use crate::persistence::{AssociationStore, QuestionAnswerStore};

/// Creates and deletes the rows behind one selectable collection.
#[async_trait]
pub trait Linker: Send + Sync {
    type Row: Linked + Clone + Send + Sync;

    /// Used in logs and failure reports ("directive", "question answer").
    fn label(&self) -> &'static str;

    async fn link(&self, product_id: ProductId, reference_id: CatalogId) -> Result<Self::Row, CollaboratorError>;

    async fn unlink(&self, product_id: ProductId, reference_id: CatalogId) -> Result<(), CollaboratorError>;
}

/// Directive or regulation links of one kind.
pub struct AssociationLinker<'a, S: ?Sized> {
    store: &'a S,
    kind: AssociationKind,
}

impl<'a, S: ?Sized> AssociationLinker<'a, S> {
    pub fn new(store: &'a S, kind: AssociationKind) -> Self {
        Self { store, kind }
    }
}

#[async_trait]
impl<S> Linker for AssociationLinker<'_, S>
where
    S: AssociationStore + ?Sized,
{
    type Row = Association;

    fn label(&self) -> &'static str {
        self.kind.as_str()
    }

    async fn link(&self, product_id: ProductId, reference_id: CatalogId) -> Result<Association, CollaboratorError> {
        self.store.link(product_id, self.kind, reference_id).await
    }

    async fn unlink(&self, product_id: ProductId, reference_id: CatalogId) -> Result<(), CollaboratorError> {
        self.store.unlink(product_id, self.kind, reference_id).await
    }
}

/// "Yes" answers to product questions.
pub struct AnswerLinker<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: ?Sized> AnswerLinker<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S> Linker for AnswerLinker<'_, S>
where
    S: QuestionAnswerStore + ?Sized,
{
    type Row = QuestionAnswer;

    fn label(&self) -> &'static str {
        "question answer"
    }

    async fn link(&self, product_id: ProductId, reference_id: CatalogId) -> Result<QuestionAnswer, CollaboratorError> {
        self.store.set_answer(product_id, reference_id).await
    }

    async fn unlink(&self, product_id: ProductId, reference_id: CatalogId) -> Result<(), CollaboratorError> {
        self.store.clear_answer(product_id, reference_id).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "op", content = "reference_id", rename_all = "lowercase")]
pub enum LinkOp {
    Add(CatalogId),
    Remove(CatalogId),
}

impl core::fmt::Display for LinkOp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LinkOp::Add(id) => write!(f, "add {id}"),
            LinkOp::Remove(id) => write!(f, "remove {id}"),
        }
    }
}

/// Successful reconcile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled<T> {
    /// Kept previous rows in their original order, then the added rows in call order.
    pub rows: Vec<T>,
    pub added: Vec<CatalogId>,
    pub removed: Vec<CatalogId>,
}

impl<T> Reconciled<T> {
    /// Number of collaborator calls issued.
    pub fn calls(&self) -> usize {
        self.added.len() + self.removed.len()
    }
}

/// A batch that stopped part-way.
///
/// Persistence now holds every operation in `added` and `removed`, none of
/// `not_attempted`, and an unknown outcome for `failed`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{label} update stopped at '{failed}': {error}")]
pub struct ReconcileFailure {
    pub product_id: ProductId,
    pub label: &'static str,
    pub added: Vec<CatalogId>,
    pub removed: Vec<CatalogId>,
    pub failed: LinkOp,
    pub error: CollaboratorError,
    pub not_attempted: Vec<LinkOp>,
}

impl ReconcileFailure {
    /// The in-memory draft no longer matches persistence and must be reloaded.
    pub fn refetch_required(&self) -> bool {
        true
    }
}

/// Reconcile `previous` rows against `selected` ids.
pub async fn reconcile<L>(
    linker: &L,
    product_id: ProductId,
    previous: &[L::Row],
    selected: &[CatalogId],
) -> Result<Reconciled<L::Row>, ReconcileFailure>
where
    L: Linker + ?Sized,
{
    let plan = diff(
        previous.iter().map(Linked::reference_id),
        selected.iter().copied(),
    );
    if plan.is_empty() {
        return Ok(Reconciled {
            rows: previous.to_vec(),
            added: Vec::new(),
            removed: Vec::new(),
        });
    }

    debug!(
        product_id = %product_id,
        label = linker.label(),
        to_add = plan.to_add.len(),
        to_remove = plan.to_remove.len(),
        "reconciling"
    );

    let ops: Vec<LinkOp> = plan
        .to_add
        .iter()
        .copied()
        .map(LinkOp::Add)
        .chain(plan.to_remove.iter().copied().map(LinkOp::Remove))
        .collect();

    let mut added_rows = Vec::with_capacity(plan.to_add.len());
    let mut added = Vec::new();
    let mut removed = Vec::new();

    for (index, op) in ops.iter().enumerate() {
        let outcome = match *op {
            LinkOp::Add(id) => linker.link(product_id, id).await.map(|row| {
                added_rows.push(row);
                added.push(id);
            }),
            LinkOp::Remove(id) => linker
                .unlink(product_id, id)
                .await
                .map(|()| removed.push(id)),
        };

        if let Err(error) = outcome {
            warn!(
                product_id = %product_id,
                label = linker.label(),
                op = %op,
                error = %error,
                applied = index,
                "reconcile stopped part-way"
            );
            return Err(ReconcileFailure {
                product_id,
                label: linker.label(),
                added,
                removed,
                failed: *op,
                error,
                not_attempted: ops[index + 1..].to_vec(),
            });
        }
    }

    let rows = previous
        .iter()
        .filter(|row| !removed.contains(&row.reference_id()))
        .cloned()
        .chain(added_rows)
        .collect();

    Ok(Reconciled { rows, added, removed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Row(CatalogId);

    impl Linked for Row {
        fn reference_id(&self) -> CatalogId {
            self.0
        }
    }

    /// Records calls; fails the call whose 0-based index equals `fail_at`.
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<LinkOp>>,
        fail_at: Option<usize>,
    }

    impl Recorder {
        fn failing_at(index: usize) -> Self {
            Self {
                fail_at: Some(index),
                ..Self::default()
            }
        }

        fn record(&self, op: LinkOp) -> Result<(), CollaboratorError> {
            let mut calls = self.calls.lock().unwrap();
            let index = calls.len();
            calls.push(op);
            if self.fail_at == Some(index) {
                return Err(CollaboratorError::unavailable("connection reset"));
            }
            Ok(())
        }

        fn calls(&self) -> Vec<LinkOp> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Linker for Recorder {
        type Row = Row;

        fn label(&self) -> &'static str {
            "test"
        }

        async fn link(&self, _: ProductId, reference_id: CatalogId) -> Result<Row, CollaboratorError> {
            self.record(LinkOp::Add(reference_id)).map(|()| Row(reference_id))
        }

        async fn unlink(&self, _: ProductId, reference_id: CatalogId) -> Result<(), CollaboratorError> {
            self.record(LinkOp::Remove(reference_id))
        }
    }

    fn ids(raw: &[i64]) -> Vec<CatalogId> {
        raw.iter().copied().map(CatalogId::new).collect()
    }

    fn rows(raw: &[i64]) -> Vec<Row> {
        ids(raw).into_iter().map(Row).collect()
    }

    fn refs(rows: &[Row]) -> Vec<i64> {
        rows.iter().map(|r| r.0.get()).collect()
    }

    #[tokio::test]
    async fn swaps_one_reference_for_another() {
        let linker = Recorder::default();
        let out = reconcile(&linker, ProductId::new(), &rows(&[10, 20]), &ids(&[10, 30]))
            .await
            .unwrap();

        assert_eq!(
            linker.calls(),
            vec![LinkOp::Add(CatalogId::new(30)), LinkOp::Remove(CatalogId::new(20))]
        );
        assert_eq!(refs(&out.rows), vec![10, 30]);
        assert_eq!(out.calls(), 2);
    }

    #[tokio::test]
    async fn unchanged_selection_issues_no_calls() {
        let linker = Recorder::default();
        let product_id = ProductId::new();
        let first = reconcile(&linker, product_id, &[], &ids(&[1, 2, 3])).await.unwrap();
        assert_eq!(linker.calls().len(), 3);

        let second = reconcile(&linker, product_id, &first.rows, &ids(&[3, 2, 1])).await.unwrap();
        assert_eq!(linker.calls().len(), 3);
        assert_eq!(second.calls(), 0);
        assert_eq!(second.rows, first.rows);
    }

    #[tokio::test]
    async fn empty_selection_removes_everything() {
        let linker = Recorder::default();
        let out = reconcile(&linker, ProductId::new(), &rows(&[4, 5]), &[]).await.unwrap();
        assert!(out.rows.is_empty());
        assert_eq!(out.removed, ids(&[4, 5]));
    }

    #[tokio::test]
    async fn failure_reports_applied_failed_and_pending() {
        // Ops: add 3, add 4, remove 1, remove 2; the third call fails.
        let linker = Recorder::failing_at(2);
        let err = reconcile(&linker, ProductId::new(), &rows(&[1, 2]), &ids(&[3, 4]))
            .await
            .unwrap_err();

        assert_eq!(err.added, ids(&[3, 4]));
        assert!(err.removed.is_empty());
        assert_eq!(err.failed, LinkOp::Remove(CatalogId::new(1)));
        assert_eq!(err.not_attempted, vec![LinkOp::Remove(CatalogId::new(2))]);
        assert!(err.refetch_required());
        assert_eq!(linker.calls().len(), 3);
    }

    #[tokio::test]
    async fn first_call_failing_applies_nothing() {
        let linker = Recorder::failing_at(0);
        let err = reconcile(&linker, ProductId::new(), &[], &ids(&[7, 8]))
            .await
            .unwrap_err();
        assert!(err.added.is_empty());
        assert_eq!(err.failed, LinkOp::Add(CatalogId::new(7)));
        assert_eq!(err.not_attempted, vec![LinkOp::Add(CatalogId::new(8))]);
        assert_eq!(
            err.to_string(),
            "test update stopped at 'add 7': unavailable: connection reset"
        );
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn block_on<F: std::future::Future>(future: F) -> F::Output {
            tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap()
                .block_on(future)
        }

        proptest! {
            /// Property: the merged rows cover exactly the selection, and feeding
            /// them back with the same selection is a no-op.
            #[test]
            fn result_matches_selection_and_is_stable(
                previous in proptest::collection::hash_set(1i64..30, 0..10),
                selected in proptest::collection::vec(1i64..30, 0..10),
            ) {
                let previous: Vec<i64> = previous.into_iter().collect();
                let linker = Recorder::default();
                let product_id = ProductId::new();

                let out = block_on(reconcile(&linker, product_id, &rows(&previous), &ids(&selected))).unwrap();
                let got: HashSet<i64> = refs(&out.rows).into_iter().collect();
                let want: HashSet<i64> = selected.iter().copied().collect();
                prop_assert_eq!(got, want);
                prop_assert_eq!(out.rows.len(), refs(&out.rows).into_iter().collect::<HashSet<_>>().len());

                let again = block_on(reconcile(&linker, product_id, &out.rows, &ids(&selected))).unwrap();
                prop_assert_eq!(again.calls(), 0);
            }
        }
    }
}
