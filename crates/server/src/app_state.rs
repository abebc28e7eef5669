use std::sync::Arc;

use chrono::{Local, NaiveDate};
use db::DBService;
use services::services::{
    config::Config,
    ephemeris::EphemerisService,
    event_generator::EventGenerator,
    event_resolver::EventResolver,
    record_store::SqliteRecordStore,
    retry::RetryPolicy,
    text_generator::TextGenerator,
    verified_events::VerifiedEventTable,
};

/// Shared handles for request handlers. Everything is built once at startup.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    db: DBService,
    ephemeris: Arc<EphemerisService>,
}

impl AppState {
    pub fn new(config: Config, db: DBService, generator: Arc<dyn TextGenerator>) -> Self {
        let settings = &config.generation;
        let resolver = EventResolver::new(
            VerifiedEventTable::builtin(),
            EventGenerator::new(generator, settings),
            RetryPolicy::new(settings.max_attempts, settings.retry_delay),
        );
        let store = Arc::new(SqliteRecordStore::new(db.pool.clone()));
        let ephemeris = Arc::new(EphemerisService::new(store, resolver));

        Self {
            config: Arc::new(config),
            db,
            ephemeris,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn ephemeris(&self) -> &EphemerisService {
        &self.ephemeris
    }

    /// Server-local calendar date; the request layer owns timezone choice.
    pub fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}
