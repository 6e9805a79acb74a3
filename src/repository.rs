//! The facade views talk to: one addressable collection of sightings built
//! from the remote catalog and the local collection.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{info, warn};
use tokio::sync::Mutex;

use crate::config::Config;
use crate::error::{Result, SightingError};
use crate::identity;
use crate::notify::{ChangeNotifier, NEW_SIGHTING};
use crate::reconcile;
use crate::record::{NewSighting, Sighting, SightingId, Status};
use crate::remote::{HttpRemoteSource, RemoteSource};
use crate::store::{FileStore, LocalStore};

/// Result of [`SightingRepository::list`].
///
/// When the remote catalog could not be read the listing holds only local
/// records and `remote_error` says why.
#[derive(Debug)]
pub struct Listing {
    pub sightings: Vec<Sighting>,
    pub remote_error: Option<SightingError>,
}

impl Listing {
    pub fn is_degraded(&self) -> bool {
        self.remote_error.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Summary {
    pub total: usize,
    pub by_status: HashMap<Status, usize>,
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
}

impl Summary {
    pub fn of(sightings: &[Sighting]) -> Self {
        let mut by_status = HashMap::new();
        for sighting in sightings {
            *by_status.entry(sighting.status).or_insert(0) += 1;
        }
        Self {
            total: sightings.len(),
            by_status,
            earliest: sightings.iter().map(|s| s.date_time).min(),
            latest: sightings.iter().map(|s| s.date_time).max(),
        }
    }

    pub fn count(&self, status: Status) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

pub struct SightingRepository {
    remote: Arc<dyn RemoteSource>,
    store: Arc<dyn LocalStore>,
    notifier: Arc<ChangeNotifier>,
    // Held from reading the known ids until the append has finished.
    submit_lock: Arc<Mutex<()>>,
}

impl SightingRepository {
    pub fn new(
        remote: Arc<dyn RemoteSource>,
        store: Arc<dyn LocalStore>,
        notifier: Arc<ChangeNotifier>,
    ) -> Self {
        Self {
            remote,
            store,
            notifier,
            submit_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Wires the HTTP catalog and the file-backed local store.
    pub fn from_config(config: &Config, notifier: Arc<ChangeNotifier>) -> Result<Self> {
        let remote = HttpRemoteSource::new(config)?;
        let store = FileStore::from_config(config);
        Ok(Self::new(Arc::new(remote), Arc::new(store), notifier))
    }

    pub fn notifier(&self) -> &Arc<ChangeNotifier> {
        &self.notifier
    }

    /// Reconciled view of both sources, ascending by id.
    ///
    /// A remote failure degrades to local-only results; a local failure
    /// fails the call.
    pub async fn list(&self) -> Result<Listing> {
        let (remote, local) = tokio::join!(self.remote.fetch_all(), self.store.load());
        let local = local?;

        let (remote, remote_error) = match remote {
            Ok(remote) => (remote, None),
            Err(e) => {
                warn!("Remote catalog unavailable, listing local sightings only: {}", e);
                (Vec::new(), Some(e))
            }
        };

        let sightings = reconcile::merge(&remote, &local);
        info!(
            "Listed {} sightings ({} remote, {} local)",
            sightings.len(),
            remote.len(),
            local.len()
        );
        Ok(Listing {
            sightings,
            remote_error,
        })
    }

    pub async fn list_by_status(&self, status: Status) -> Result<Listing> {
        let mut listing = self.list().await?;
        listing.sightings.retain(|s| s.status == status);
        Ok(listing)
    }

    /// Looks the id up in freshly loaded state, local records first.
    ///
    /// A remote failure only surfaces when the local collection cannot
    /// answer on its own.
    pub async fn get_by_id(&self, id: SightingId) -> Result<Sighting> {
        let (remote, local) = tokio::join!(self.remote.fetch_by_id(id), self.store.load());
        let local = local?;

        let remote = match remote {
            Ok(sighting) => vec![sighting],
            Err(SightingError::NotFound(_)) => Vec::new(),
            Err(e) if local.iter().any(|s| s.id == id) => {
                warn!("Remote lookup of {} failed, using local record: {}", id, e);
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        reconcile::find_by_id(&remote, &local, id).cloned()
    }

    /// Validates, allocates an id, persists and announces a new sighting.
    ///
    /// Submissions are serialized, so two concurrent calls never observe
    /// the same set of known ids. Once the append starts it runs to
    /// completion even if the returned future is dropped. The submission is
    /// committed when the append returns; publishing afterwards cannot turn
    /// it into an error.
    pub async fn add(&self, submission: NewSighting) -> Result<Sighting> {
        let location = submission.validate()?;

        let guard = Arc::clone(&self.submit_lock).lock_owned().await;
        let (remote, local) = tokio::join!(self.remote.fetch_all(), self.store.load());
        let remote = remote?;
        let local = local?;

        let id = identity::next_id(remote.iter().chain(local.iter()).map(|s| s.id))?;
        let sighting = submission.into_sighting(id, location);

        let store = Arc::clone(&self.store);
        let notifier = Arc::clone(&self.notifier);
        let record = sighting.clone();
        let commit = tokio::spawn(async move {
            let _guard = guard;
            store.append(record).await?;
            info!("Submitted sighting {}", id);
            // Subscriber panics are contained by the notifier.
            notifier.publish(NEW_SIGHTING, Some(id));
            Ok::<_, SightingError>(())
        });
        commit
            .await
            .map_err(|e| SightingError::Interrupted(e.to_string()))??;

        Ok(sighting)
    }
}
