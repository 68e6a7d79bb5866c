//! App Core for Markstash.
//!
//! Central struct holding the store, the request client and the session flows,
//! managing application lifecycle. There is no global instance: whoever needs
//! the store gets a handle from here.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use crate::managers::bookmark_store::BookmarkStore;
use crate::services::api_client::{
    AuthClient, Navigator, ReqwestTransport, RouteState, SessionAccess, Transport,
};
use crate::services::auth_flow::{AuthFlow, SessionCheck};
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::services::state_storage::{MemoryStorage, SqliteStateStorage, StateStorage};
use crate::types::settings::ClientSettings;

/// File name of the state database inside the data directory.
pub const DB_FILE_NAME: &str = "markstash.db";

/// Central application struct.
pub struct App {
    pub settings: ClientSettings,
    pub store: Arc<Mutex<BookmarkStore>>,
    pub client: Arc<AuthClient>,
    pub auth: AuthFlow,
    pub navigator: Arc<RouteState>,
}

impl App {
    /// Creates a new App: loads settings, opens the state database in the
    /// data directory and talks to the configured API over HTTP.
    pub fn new(config_path: Option<String>) -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings_engine = SettingsEngine::new(config_path);
        let settings = settings_engine.load()?;
        let db_path = settings_engine.data_dir().join(DB_FILE_NAME);
        Self::open(settings, &db_path)
    }

    /// Creates an App persisting to the SQLite database at `db_path`.
    pub fn open(
        settings: ClientSettings,
        db_path: &Path,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let storage = Arc::new(SqliteStateStorage::open(db_path)?);
        let transport = Arc::new(ReqwestTransport::new(&settings)?);
        info!(db = %db_path.display(), api = %transport.base_url(), "Opening Markstash");
        Ok(Self::with_parts(settings, storage, transport))
    }

    /// Creates an App over in-memory storage and the given transport.
    pub fn in_memory(transport: Arc<dyn Transport>) -> Self {
        Self::with_parts(
            ClientSettings::default(),
            Arc::new(MemoryStorage::new()),
            transport,
        )
    }

    /// Wires the store, client and flows together over explicit back ends.
    pub fn with_parts(
        settings: ClientSettings,
        storage: Arc<dyn StateStorage>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let store = Arc::new(Mutex::new(BookmarkStore::with_storage(
            storage,
            settings.storage_key.clone(),
        )));
        let session: Arc<dyn SessionAccess> = store.clone();
        let navigator = Arc::new(RouteState::new(settings.landing_route.clone()));
        let client = Arc::new(AuthClient::new(
            transport,
            session.clone(),
            navigator.clone() as Arc<dyn Navigator>,
            settings.landing_route.clone(),
        ));
        let auth = AuthFlow::new(client.clone(), session);

        Self {
            settings,
            store,
            client,
            auth,
            navigator,
        }
    }

    /// Locks the store. A poisoned lock still yields the store.
    pub fn store(&self) -> MutexGuard<'_, BookmarkStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Startup sequence: rehydrate the store, then renew the session.
    pub async fn startup(&self) -> SessionCheck {
        {
            let mut store = self.store();
            if let Err(e) = store.hydrate() {
                warn!(error = %e, "Starting from sample data");
            }
        }
        let check = self.auth.check_session().await;
        info!(?check, "Startup complete");
        check
    }

    /// Shutdown sequence: write the final state.
    pub fn shutdown(&self) {
        if let Err(e) = self.store().flush() {
            warn!(error = %e, "Failed to flush store state on shutdown");
        }
    }
}
