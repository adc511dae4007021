//! Per-owner workbenches and the autosave task that drives them.
//!
//! A [`Workbench`] is the in-memory copy of one owner's clients, subscriptions
//! and invoices, loaded once from the store and kept behind a tokio mutex. Edits
//! land in memory; a background task ticks the [`Countdown`] and persists the
//! diff when it expires. [`Console`] hands out one workbench per owner.

use super::autosave::{ChangeTracker, Countdown, Tick, Workspace};
use crate::config::AppConfig;
use crate::entities::{ClientModel, ClientStatus, InvoiceModel, SubscriptionModel};
use crate::errors::Result;
use crate::store::{Backend, Store};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument};

/// Autosave and seeding parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkbenchSettings {
    /// Countdown length in ticks
    pub period: u32,
    /// Length of one tick
    pub tick: Duration,
    /// Seed sample clients into empty demo workbenches
    pub seed_sample_clients: bool,
}

impl Default for WorkbenchSettings {
    fn default() -> Self {
        Self {
            period: 30,
            tick: Duration::from_secs(1),
            seed_sample_clients: true,
        }
    }
}

impl From<&AppConfig> for WorkbenchSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            period: config.autosave.period_secs,
            tick: Duration::from_millis(config.autosave.tick_millis),
            seed_sample_clients: config.demo.seed_sample_clients,
        }
    }
}

/// Autosave state reported to the save indicator
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveStatus {
    /// Whether anything differs from the last save
    pub has_unsaved_changes: bool,
    /// Number of pending writes
    pub pending_changes: usize,
    /// Time left on the countdown while changes are pending
    pub seconds_until_save: Option<u64>,
    /// A save is running
    pub is_saving: bool,
    /// Completion time of the last successful save
    pub last_saved: Option<DateTime<Utc>>,
    /// Error of the last failed save, cleared by the next success
    pub last_error: Option<String>,
}

/// What a save request did
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum SaveOutcome {
    /// Changes were written
    Saved {
        /// Number of upserts and deletions
        written: usize,
    },
    /// The workspace was already clean
    NothingToSave,
    /// Another save was running; this request did nothing
    AlreadySaving,
}

struct WorkbenchState {
    tracker: ChangeTracker,
    countdown: Countdown,
    last_saved: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

/// Clears the saving flag when dropped.
struct SavingGuard<'a>(&'a AtomicBool);

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One owner's editable collections plus their autosave state.
pub struct Workbench {
    owner_id: String,
    store: Store,
    tick: Duration,
    state: Mutex<WorkbenchState>,
    saving: AtomicBool,
}

impl std::fmt::Debug for Workbench {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workbench")
            .field("owner_id", &self.owner_id)
            .field("saving", &self.saving.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

fn sample_clients() -> Vec<ClientModel> {
    vec![
        ClientModel {
            id: "1".to_string(),
            owner_id: String::new(),
            name: "Amanda Souza".to_string(),
            email: "amanda.souza@email.com".to_string(),
            national_id: "123456789LA041".to_string(),
            status: ClientStatus::Active,
        },
        ClientModel {
            id: "2".to_string(),
            owner_id: String::new(),
            name: "João Pereira".to_string(),
            email: "joao.pereira@email.com".to_string(),
            national_id: "987654321LA042".to_string(),
            status: ClientStatus::Inactive,
        },
    ]
}

impl Workbench {
    /// Loads `owner_id`'s collections. In demo mode an empty client list is
    /// seeded with two sample clients first.
    #[instrument(skip(store, settings))]
    pub async fn load(store: Store, owner_id: &str, settings: WorkbenchSettings) -> Result<Self> {
        let mut clients: Vec<ClientModel> = store.list(owner_id).await?;
        if clients.is_empty() && store.is_demo() && settings.seed_sample_clients {
            for client in sample_clients() {
                clients.push(store.upsert(owner_id, &client).await?);
            }
            info!("Seeded sample clients for {owner_id}");
        }
        let subscriptions: Vec<SubscriptionModel> = store.list(owner_id).await?;
        let invoices: Vec<InvoiceModel> = store.list(owner_id).await?;
        debug!(
            "Loaded {} clients, {} subscriptions, {} invoices",
            clients.len(),
            subscriptions.len(),
            invoices.len()
        );

        Ok(Self {
            owner_id: owner_id.to_string(),
            store,
            tick: settings.tick,
            state: Mutex::new(WorkbenchState {
                tracker: ChangeTracker::new(Workspace {
                    clients,
                    subscriptions,
                    invoices,
                }),
                countdown: Countdown::new(settings.period),
                last_saved: None,
                last_error: None,
            }),
            saving: AtomicBool::new(false),
        })
    }

    /// Owner of the collections.
    #[must_use]
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Reads the current state.
    pub async fn read<T>(&self, view: impl FnOnce(&Workspace) -> T) -> T {
        let state = self.state.lock().await;
        view(state.tracker.current())
    }

    /// Mutates the current state only; the change is saved by autosave.
    pub async fn edit<T>(&self, change: impl FnOnce(&mut Workspace) -> Result<T>) -> Result<T> {
        let mut state = self.state.lock().await;
        change(state.tracker.current_mut())
    }

    /// Applies a change already written to the backend to both the current state
    /// and the baseline.
    pub async fn apply_persisted(&self, change: impl Fn(&mut Workspace)) {
        let mut state = self.state.lock().await;
        state.tracker.apply_persisted(change);
    }

    /// Save indicator data.
    pub async fn status(&self) -> Result<SaveStatus> {
        let state = self.state.lock().await;
        let pending_changes = state.tracker.diff()?.len();
        let has_unsaved_changes = state.tracker.has_unsaved_changes()?;
        let tick_millis = u64::try_from(self.tick.as_millis()).unwrap_or(u64::MAX);
        let seconds_until_save = has_unsaved_changes
            .then(|| u64::from(state.countdown.remaining()).saturating_mul(tick_millis) / 1000);
        Ok(SaveStatus {
            has_unsaved_changes,
            pending_changes,
            seconds_until_save,
            is_saving: self.saving.load(Ordering::Acquire),
            last_saved: state.last_saved,
            last_error: state.last_error.clone(),
        })
    }

    /// Persists every pending change now.
    ///
    /// On failure the baseline is left untouched so the same changes are retried
    /// on the next save. A call made while another save runs does nothing.
    #[instrument(skip(self), fields(owner = %self.owner_id))]
    pub async fn save_now(&self) -> Result<SaveOutcome> {
        if self.saving.swap(true, Ordering::AcqRel) {
            debug!("Save already in progress");
            return Ok(SaveOutcome::AlreadySaving);
        }
        let _guard = SavingGuard(&self.saving);

        let (snapshot, diff) = {
            let mut state = self.state.lock().await;
            let diff = state.tracker.diff()?;
            if diff.is_empty() {
                state.countdown.reset();
                return Ok(SaveOutcome::NothingToSave);
            }
            (state.tracker.current().clone(), diff)
        };

        match diff.persist(&self.store, &self.owner_id).await {
            Ok(written) => {
                let mut state = self.state.lock().await;
                state.tracker.mark_saved(snapshot);
                state.countdown.reset();
                state.last_saved = Some(Utc::now());
                state.last_error = None;
                info!("Saved {written} changes");
                Ok(SaveOutcome::Saved { written })
            }
            Err(e) => {
                error!("Autosave failed: {e}");
                self.state.lock().await.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Advances the countdown one tick and saves on expiry.
    pub async fn tick(&self) -> Result<Tick> {
        if self.saving.load(Ordering::Acquire) {
            return Ok(Tick::Idle);
        }
        let tick = {
            let mut state = self.state.lock().await;
            let dirty = state.tracker.has_unsaved_changes()?;
            state.countdown.tick(dirty)
        };
        if tick == Tick::Expired {
            self.save_now().await?;
        }
        Ok(tick)
    }
}

/// Starts the countdown task for `workbench`. The task ends once the workbench
/// is dropped.
pub fn spawn_autosave(workbench: &Arc<Workbench>) -> JoinHandle<()> {
    let weak: Weak<Workbench> = Arc::downgrade(workbench);
    let period = workbench.tick;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await;
        loop {
            interval.tick().await;
            let Some(workbench) = weak.upgrade() else {
                break;
            };
            if let Err(e) = workbench.tick().await {
                error!("Autosave tick for {} failed: {e}", workbench.owner_id());
            }
        }
    })
}

/// Shared application core: the store plus one workbench per owner.
#[derive(Debug)]
pub struct Console {
    store: Store,
    settings: WorkbenchSettings,
    workbenches: Mutex<HashMap<String, Arc<Workbench>>>,
}

impl Console {
    /// A console over `store` with no workbenches loaded yet.
    #[must_use]
    pub fn new(store: Store, settings: WorkbenchSettings) -> Self {
        Self {
            store,
            settings,
            workbenches: Mutex::new(HashMap::new()),
        }
    }

    /// The backing store.
    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    /// The workbench of `owner_id`, loading it and starting its autosave task on
    /// first use.
    ///
    /// The load runs without holding the registry lock. When two first requests
    /// for one owner race, the first insert wins and the other load is dropped.
    pub async fn workbench(&self, owner_id: &str) -> Result<Arc<Workbench>> {
        if let Some(workbench) = self.workbenches.lock().await.get(owner_id) {
            return Ok(Arc::clone(workbench));
        }
        let loaded = Arc::new(Workbench::load(self.store.clone(), owner_id, self.settings).await?);

        let mut workbenches = self.workbenches.lock().await;
        let workbench = workbenches
            .entry(owner_id.to_string())
            .or_insert_with(|| {
                spawn_autosave(&loaded);
                Arc::clone(&loaded)
            });
        Ok(Arc::clone(workbench))
    }

    /// Saves every loaded workbench, logging failures. Used on shutdown.
    pub async fn save_all(&self) {
        let workbenches: Vec<Arc<Workbench>> =
            self.workbenches.lock().await.values().cloned().collect();
        for workbench in workbenches {
            if let Err(e) = workbench.save_now().await {
                error!("Final save for {} failed: {e}", workbench.owner_id());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::InvoiceStatus;
    use crate::store::SqlBackend;
    use crate::test_utils::{demo_store, sample_invoice, sample_subscription, setup_test_db};

    fn settings(period: u32) -> WorkbenchSettings {
        WorkbenchSettings {
            period,
            ..WorkbenchSettings::default()
        }
    }

    /// A workbench with nothing loaded, for stores that cannot be read yet.
    fn empty_workbench(store: Store, settings: WorkbenchSettings) -> Workbench {
        Workbench {
            owner_id: "u1".to_string(),
            store,
            tick: settings.tick,
            state: Mutex::new(WorkbenchState {
                tracker: ChangeTracker::default(),
                countdown: Countdown::new(settings.period),
                last_saved: None,
                last_error: None,
            }),
            saving: AtomicBool::new(false),
        }
    }

    #[tokio::test]
    async fn test_demo_load_seeds_sample_clients_once() -> Result<()> {
        let store = demo_store();
        let first = Workbench::load(store.clone(), "u1", settings(30)).await?;
        let names = first
            .read(|ws| ws.clients.iter().map(|c| c.name.clone()).collect::<Vec<_>>())
            .await;
        assert_eq!(names, vec!["Amanda Souza", "João Pereira"]);
        assert!(!first.status().await?.has_unsaved_changes);

        let second = Workbench::load(store, "u1", settings(30)).await?;
        assert_eq!(second.read(|ws| ws.clients.len()).await, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_remote_load_does_not_seed() -> Result<()> {
        let store = Store::Remote(SqlBackend::new(setup_test_db().await?));
        let workbench = Workbench::load(store, "u1", settings(30)).await?;
        assert_eq!(workbench.read(|ws| ws.clients.len()).await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_save_now_persists_and_cleans() -> Result<()> {
        let store = demo_store();
        let workbench = Workbench::load(store.clone(), "u1", settings(30)).await?;
        workbench
            .edit(|ws| {
                ws.put(sample_subscription("10", "1", "Básico 2Mbps"));
                Ok(())
            })
            .await?;

        let status = workbench.status().await?;
        assert!(status.has_unsaved_changes);
        assert_eq!(status.pending_changes, 1);
        assert_eq!(status.seconds_until_save, Some(30));

        assert_eq!(workbench.save_now().await?, SaveOutcome::Saved { written: 1 });
        let status = workbench.status().await?;
        assert!(!status.has_unsaved_changes);
        assert!(status.last_saved.is_some());
        assert_eq!(workbench.save_now().await?, SaveOutcome::NothingToSave);

        let stored: Vec<SubscriptionModel> = store.list("u1").await?;
        assert_eq!(stored.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_save_keeps_changes_dirty() -> Result<()> {
        // No tables yet, so every write fails
        let db = sea_orm::Database::connect("sqlite::memory:").await?;
        let workbench = empty_workbench(Store::Remote(SqlBackend::new(db.clone())), settings(30));
        workbench
            .edit(|ws| {
                ws.put(sample_invoice("20", "1", InvoiceStatus::Paid, 10.0));
                Ok(())
            })
            .await?;

        assert!(workbench.save_now().await.is_err());
        let status = workbench.status().await?;
        assert!(status.has_unsaved_changes);
        assert!(status.last_error.is_some());
        assert!(!status.is_saving);

        crate::config::database::create_tables(&db).await?;
        assert_eq!(workbench.save_now().await?, SaveOutcome::Saved { written: 1 });
        let status = workbench.status().await?;
        assert!(!status.has_unsaved_changes);
        assert!(status.last_error.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_second_trigger_while_saving_is_noop() -> Result<()> {
        let workbench = Workbench::load(demo_store(), "u1", settings(30)).await?;
        workbench
            .edit(|ws| {
                ws.clients[0].name = "Amanda S.".to_string();
                Ok(())
            })
            .await?;

        workbench.saving.store(true, Ordering::Release);
        assert_eq!(workbench.save_now().await?, SaveOutcome::AlreadySaving);
        assert!(workbench.status().await?.has_unsaved_changes);
        // The flag belongs to the running save and is left alone
        assert!(workbench.saving.load(Ordering::Acquire));
        Ok(())
    }

    #[tokio::test]
    async fn test_countdown_expiry_saves() -> Result<()> {
        let store = demo_store();
        let workbench = Workbench::load(store.clone(), "u1", settings(2)).await?;
        assert_eq!(workbench.tick().await?, Tick::Idle);

        workbench
            .edit(|ws| {
                ws.remove::<ClientModel>("2");
                Ok(())
            })
            .await?;
        assert_eq!(workbench.tick().await?, Tick::Counting(1));
        assert_eq!(workbench.tick().await?, Tick::Expired);

        let stored: Vec<ClientModel> = store.list("u1").await?;
        assert_eq!(stored.len(), 1);
        assert!(!workbench.status().await?.has_unsaved_changes);
        Ok(())
    }

    #[tokio::test]
    async fn test_console_reuses_workbenches_per_owner() -> Result<()> {
        let console = Console::new(demo_store(), settings(30));
        let a1 = console.workbench("a").await?;
        let a2 = console.workbench("a").await?;
        let b = console.workbench("b").await?;
        assert!(Arc::ptr_eq(&a1, &a2));
        assert!(!Arc::ptr_eq(&a1, &b));

        a1.edit(|ws| {
            ws.clients.clear();
            Ok(())
        })
        .await?;
        console.save_all().await;
        let stored: Vec<ClientModel> = console.store().list("a").await?;
        assert!(stored.is_empty());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_autosave_task_saves_when_countdown_expires() -> Result<()> {
        let store = demo_store();
        let workbench = Arc::new(Workbench::load(store.clone(), "u1", settings(3)).await?);
        let task = spawn_autosave(&workbench);

        workbench
            .edit(|ws| {
                ws.put(sample_subscription("10", "1", "Básico 2Mbps"));
                Ok(())
            })
            .await?;
        tokio::time::sleep(Duration::from_millis(1500)).await;
        let stored: Vec<SubscriptionModel> = store.list("u1").await?;
        assert!(stored.is_empty());

        tokio::time::sleep(Duration::from_secs(3)).await;
        let stored: Vec<SubscriptionModel> = store.list("u1").await?;
        assert_eq!(stored.len(), 1);
        assert!(!workbench.status().await?.has_unsaved_changes);

        drop(workbench);
        let finished = tokio::time::timeout(Duration::from_secs(5), task).await;
        assert!(matches!(finished, Ok(Ok(()))));
        Ok(())
    }

    #[tokio::test]
    async fn test_autosave_task_survives_failed_saves() -> Result<()> {
        // No tables yet, so every write fails until they are created
        let db = sea_orm::Database::connect("sqlite::memory:").await?;
        let quick = WorkbenchSettings {
            period: 2,
            tick: Duration::from_millis(10),
            seed_sample_clients: false,
        };
        let workbench = Arc::new(empty_workbench(Store::Remote(SqlBackend::new(db.clone())), quick));
        let task = spawn_autosave(&workbench);
        workbench
            .edit(|ws| {
                ws.put(sample_invoice("20", "1", InvoiceStatus::Paid, 10.0));
                Ok(())
            })
            .await?;

        for _ in 0..500 {
            if workbench.status().await?.last_error.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(workbench.status().await?.last_error.is_some());
        assert!(!task.is_finished());

        crate::config::database::create_tables(&db).await?;
        for _ in 0..500 {
            if !workbench.status().await?.has_unsaved_changes {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let status = workbench.status().await?;
        assert!(!status.has_unsaved_changes);
        assert!(status.last_error.is_none());
        task.abort();
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_first_requests_share_one_workbench() -> Result<()> {
        let console = Console::new(demo_store(), settings(30));
        let (a1, a2, b) = futures::join!(
            console.workbench("a"),
            console.workbench("a"),
            console.workbench("b")
        );
        let (a1, a2, b) = (a1?, a2?, b?);
        assert!(Arc::ptr_eq(&a1, &a2));
        assert!(!Arc::ptr_eq(&a1, &b));
        assert_eq!(a2.read(|ws| ws.clients.len()).await, 2);
        assert_eq!(console.workbenches.lock().await.len(), 2);
        Ok(())
    }
}
