//! Sighting records from a read-only remote catalog and a device-local
//! collection, reconciled into one addressable view.

pub mod config;
pub mod error;
pub mod export;
pub mod identity;
pub mod notify;
pub mod reconcile;
pub mod record;
pub mod remote;
pub mod repository;
pub mod store;

pub use config::Config;
pub use error::{ErrorKind, Result, SightingError};
pub use notify::{ChangeNotifier, NEW_SIGHTING, Notification, SubscriptionId};
pub use record::{Location, NewSighting, Sighting, SightingId, Status};
pub use remote::{HttpRemoteSource, RemoteSource};
pub use repository::{Listing, SightingRepository, Summary};
pub use store::{FileStore, LocalStore, MemoryStore};
