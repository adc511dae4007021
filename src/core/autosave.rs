//! Change tracking for the autosave loop.
//!
//! A [`ChangeTracker`] holds the collections being edited next to a baseline
//! snapshot taken at the last successful load or save. Records are compared by
//! their full JSON serialization: a record is dirty when its serialized form
//! differs from the baseline record with the same id, or when there is no such
//! baseline record. Baseline records missing from the current state are
//! reported as deletions.
//!
//! The [`Countdown`] ticks while there are unsaved changes, resets as soon as the
//! state is clean again, and signals expiry once the period has elapsed.

use crate::entities::{ClientModel, InvoiceModel, SubscriptionModel};
use crate::errors::Result;
use crate::store::{Backend, Record, Store};
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;

/// The collections edited in one owner's console
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Workspace {
    /// Clients
    pub clients: Vec<ClientModel>,
    /// Subscriptions
    pub subscriptions: Vec<SubscriptionModel>,
    /// Invoices
    pub invoices: Vec<InvoiceModel>,
}

/// Records that live in a [`Workspace`] collection.
pub trait Tracked: Record {
    /// The collection holding records of this type.
    fn collection(workspace: &Workspace) -> &Vec<Self>;

    /// Mutable access to the collection.
    fn collection_mut(workspace: &mut Workspace) -> &mut Vec<Self>;
}

impl Tracked for ClientModel {
    fn collection(workspace: &Workspace) -> &Vec<Self> {
        &workspace.clients
    }

    fn collection_mut(workspace: &mut Workspace) -> &mut Vec<Self> {
        &mut workspace.clients
    }
}

impl Tracked for SubscriptionModel {
    fn collection(workspace: &Workspace) -> &Vec<Self> {
        &workspace.subscriptions
    }

    fn collection_mut(workspace: &mut Workspace) -> &mut Vec<Self> {
        &mut workspace.subscriptions
    }
}

impl Tracked for InvoiceModel {
    fn collection(workspace: &Workspace) -> &Vec<Self> {
        &workspace.invoices
    }

    fn collection_mut(workspace: &mut Workspace) -> &mut Vec<Self> {
        &mut workspace.invoices
    }
}

impl Workspace {
    /// Record with the given id.
    #[must_use]
    pub fn find<R: Tracked>(&self, id: &str) -> Option<&R> {
        R::collection(self).iter().find(|record| record.id() == id)
    }

    /// Replaces the record with the same id in place, or appends it.
    pub fn put<R: Tracked>(&mut self, record: R) {
        let records = R::collection_mut(self);
        match records.iter_mut().find(|existing| existing.id() == record.id()) {
            Some(slot) => *slot = record,
            None => records.push(record),
        }
    }

    /// Removes the record, returning whether it was present.
    pub fn remove<R: Tracked>(&mut self, id: &str) -> bool {
        let records = R::collection_mut(self);
        let before = records.len();
        records.retain(|record| record.id() != id);
        records.len() != before
    }
}

/// Pending writes for one collection
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeSet<R> {
    /// New or modified records
    pub upserts: Vec<R>,
    /// Ids present in the baseline but no longer in the current state
    pub deletions: Vec<String>,
}

impl<R> Default for ChangeSet<R> {
    fn default() -> Self {
        Self {
            upserts: Vec::new(),
            deletions: Vec::new(),
        }
    }
}

impl<R> ChangeSet<R> {
    /// Number of pending writes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.upserts.len() + self.deletions.len()
    }

    /// Whether nothing needs saving.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.deletions.is_empty()
    }
}

/// Computes the writes that bring `baseline` up to `current`.
pub fn diff_collection<R: Record>(baseline: &[R], current: &[R]) -> Result<ChangeSet<R>> {
    let mut saved: HashMap<&str, String> = HashMap::with_capacity(baseline.len());
    for record in baseline {
        saved.insert(record.id(), serde_json::to_string(record)?);
    }

    let mut changes = ChangeSet::default();
    for record in current {
        let serialized = serde_json::to_string(record)?;
        if saved.get(record.id()) != Some(&serialized) {
            changes.upserts.push(record.clone());
        }
    }
    for record in baseline {
        if !current.iter().any(|other| other.id() == record.id()) {
            changes.deletions.push(record.id().to_string());
        }
    }
    Ok(changes)
}

/// Pending writes for a whole workspace
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorkspaceDiff {
    /// Client writes
    pub clients: ChangeSet<ClientModel>,
    /// Subscription writes
    pub subscriptions: ChangeSet<SubscriptionModel>,
    /// Invoice writes
    pub invoices: ChangeSet<InvoiceModel>,
}

impl WorkspaceDiff {
    /// Total pending writes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len() + self.subscriptions.len() + self.invoices.len()
    }

    /// Whether the workspace is clean.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sends every write to `store`, all concurrently.
    ///
    /// Every write is attempted; the first failure is returned once all have
    /// finished. Returns the number of writes performed.
    pub async fn persist(&self, store: &Store, owner_id: &str) -> Result<usize> {
        let (clients, subscriptions, invoices) = futures::join!(
            persist_changes(store, owner_id, &self.clients),
            persist_changes(store, owner_id, &self.subscriptions),
            persist_changes(store, owner_id, &self.invoices),
        );
        Ok(clients? + subscriptions? + invoices?)
    }
}

async fn persist_changes<R: Record>(
    store: &Store,
    owner_id: &str,
    changes: &ChangeSet<R>,
) -> Result<usize> {
    let upserts = changes
        .upserts
        .iter()
        .map(|record| store.upsert(owner_id, record));
    let deletions = changes
        .deletions
        .iter()
        .map(|id| store.delete::<R>(owner_id, id));
    let (upserted, deleted) = futures::join!(join_all(upserts), join_all(deletions));

    let mut written = 0;
    for result in upserted {
        result?;
        written += 1;
    }
    for result in deleted {
        result?;
        written += 1;
    }
    Ok(written)
}

/// Current state plus the last saved baseline.
#[derive(Clone, Debug, Default)]
pub struct ChangeTracker {
    baseline: Workspace,
    current: Workspace,
}

impl ChangeTracker {
    /// Starts tracking a freshly loaded workspace; nothing is dirty.
    #[must_use]
    pub fn new(loaded: Workspace) -> Self {
        Self {
            baseline: loaded.clone(),
            current: loaded,
        }
    }

    /// The state being edited.
    #[must_use]
    pub const fn current(&self) -> &Workspace {
        &self.current
    }

    /// Mutable access to the state being edited.
    pub fn current_mut(&mut self) -> &mut Workspace {
        &mut self.current
    }

    /// The last saved state.
    #[must_use]
    pub const fn baseline(&self) -> &Workspace {
        &self.baseline
    }

    /// Records a change that was already written to the backend, so it is not
    /// reported as unsaved.
    pub fn apply_persisted(&mut self, change: impl Fn(&mut Workspace)) {
        change(&mut self.current);
        change(&mut self.baseline);
    }

    /// Whether any collection differs from the baseline.
    pub fn has_unsaved_changes(&self) -> Result<bool> {
        Ok(serde_json::to_string(&self.current)? != serde_json::to_string(&self.baseline)?)
    }

    /// Writes needed to bring the backend up to the current state.
    pub fn diff(&self) -> Result<WorkspaceDiff> {
        Ok(WorkspaceDiff {
            clients: diff_collection(&self.baseline.clients, &self.current.clients)?,
            subscriptions: diff_collection(
                &self.baseline.subscriptions,
                &self.current.subscriptions,
            )?,
            invoices: diff_collection(&self.baseline.invoices, &self.current.invoices)?,
        })
    }

    /// Promotes `snapshot` (the state captured when a save started) to baseline.
    pub fn mark_saved(&mut self, snapshot: Workspace) {
        self.baseline = snapshot;
    }
}

/// Result of one countdown tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Nothing to save
    Idle,
    /// Changes pending, this many ticks left
    Counting(u32),
    /// Period elapsed, save now
    Expired,
}

/// Fixed-period countdown that runs only while there are unsaved changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Countdown {
    period: u32,
    remaining: u32,
}

impl Countdown {
    /// A countdown of `period` ticks (at least one).
    #[must_use]
    pub fn new(period: u32) -> Self {
        let period = period.max(1);
        Self {
            period,
            remaining: period,
        }
    }

    /// Ticks left before expiry.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Back to a full period.
    pub const fn reset(&mut self) {
        self.remaining = self.period;
    }

    /// Advances one tick. A clean state resets the countdown; expiry restarts it.
    pub const fn tick(&mut self, dirty: bool) -> Tick {
        if !dirty {
            self.reset();
            return Tick::Idle;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.reset();
            Tick::Expired
        } else {
            Tick::Counting(self.remaining)
        }
    }
}
