use std::{collections::HashMap, fmt::Debug};

use cucumber::World;
use log::*;
use price_watch_engine::{
    db_types::{ItemSnapshot, UserProfile, Watch},
    events::EventProducers,
    test_utils::prepare_env::{prepare_test_env, random_db_path, sqlite_scanner, sqlite_watch_api, SqliteScanner, SqliteWatchApi},
    watch_objects::{ScanConfig, ScanSummary},
    SqliteDatabase,
    WatchApiError,
};

#[derive(Default, Debug, World)]
pub struct PriceWatchWorld {
    pub system: Option<WatchSystem>,
}

pub struct WatchSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub api: SqliteWatchApi,
    pub scanner: SqliteScanner,
    pub users: HashMap<String, UserProfile>,
    pub items: HashMap<String, ItemSnapshot>,
    /// The most recent watch armed by each user.
    pub watches: HashMap<String, Watch>,
    pub last_error: Option<WatchApiError>,
    pub last_summary: Option<ScanSummary>,
}

impl Debug for WatchSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WatchSystem ({})", self.db_path)
    }
}

impl WatchSystem {
    pub async fn new() -> Self {
        let db_path = random_db_path();
        let db = prepare_test_env(&db_path).await;
        debug!("🚀️ Created database: {db_path}");
        let api = sqlite_watch_api(&db);
        let scanner = sqlite_scanner(&db, EventProducers::default(), ScanConfig::default());
        Self {
            db_path,
            db,
            api,
            scanner,
            users: HashMap::new(),
            items: HashMap::new(),
            watches: HashMap::new(),
            last_error: None,
            last_summary: None,
        }
    }

    pub fn user(&self, name: &str) -> &UserProfile {
        self.users.get(name).unwrap_or_else(|| panic!("No user called {name}"))
    }

    pub fn item(&self, title: &str) -> &ItemSnapshot {
        self.items.get(title).unwrap_or_else(|| panic!("No item called {title}"))
    }

    pub fn watch_of(&self, name: &str) -> &Watch {
        self.watches.get(name).unwrap_or_else(|| panic!("{name} has not armed a watch"))
    }
}

impl PriceWatchWorld {
    pub fn system(&self) -> &WatchSystem {
        self.system.as_ref().expect("System not initialised")
    }

    pub fn system_mut(&mut self) -> &mut WatchSystem {
        self.system.as_mut().expect("System not initialised")
    }
}
