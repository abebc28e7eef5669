//! Resolve-persist-read flow behind the generate endpoint, plus the read paths
//! the terminal UI uses.

use std::sync::Arc;

use chrono::NaiveDate;
use db::models::ephemeris::{CreateEphemeris, Ephemeris};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use utils::date_key::{self, InvalidDateFormat};

use super::{
    content_validator::{self, ContentRejection},
    event_resolver::{EventResolver, EventSource, ResolvedEvent},
    record_store::{RecordStore, RecordStoreError},
};

#[derive(Debug, Error)]
pub enum EphemerisError {
    #[error(transparent)]
    InvalidDate(#[from] InvalidDateFormat),
    #[error("no valid ephemeris could be generated for {display_key} after {attempts} attempts")]
    GenerationExhausted { display_key: String, attempts: u32 },
    #[error("ephemeris for {display_key} was resolved but not stored: {source}")]
    PersistenceFailure {
        display_key: String,
        event: ResolvedEvent,
        #[source]
        source: RecordStoreError,
    },
    #[error("event rejected: {0}")]
    ContentRejected(#[from] ContentRejection),
    #[error(transparent)]
    Store(#[from] RecordStoreError),
}

/// Whether an existing row for the same day short-circuits generation.
/// With the default (`false`) a day that already has a row is served from the
/// store and no new row is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateOptions {
    pub force_regenerate: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Existing(Ephemeris),
    Created {
        ephemeris: Ephemeris,
        source: EventSource,
    },
}

impl GenerationOutcome {
    pub fn into_ephemeris(self) -> Ephemeris {
        match self {
            Self::Existing(ephemeris) | Self::Created { ephemeris, .. } => ephemeris,
        }
    }

    /// `existing`, `verified` or `generated`
    pub fn source_label(&self) -> String {
        match self {
            Self::Existing(_) => "existing".to_string(),
            Self::Created { source, .. } => source.to_string(),
        }
    }
}

pub struct EphemerisService {
    store: Arc<dyn RecordStore>,
    resolver: EventResolver,
}

impl EphemerisService {
    pub fn new(store: Arc<dyn RecordStore>, resolver: EventResolver) -> Self {
        Self { store, resolver }
    }

    /// Produces and stores the ephemeris for `target_date`.
    ///
    /// Concurrent calls for the same day are not coordinated; both may insert
    /// and the read paths tolerate the duplicate.
    pub async fn generate(
        &self,
        target_date: NaiveDate,
        options: GenerateOptions,
    ) -> Result<GenerationOutcome, EphemerisError> {
        let display_key = date_key::display_key(target_date);

        if !options.force_regenerate {
            if let Some(existing) = self.by_display_key(&display_key).await.into_iter().next() {
                info!(display_key = %display_key, id = %existing.id, "Ephemeris already stored for this day");
                return Ok(GenerationOutcome::Existing(existing));
            }
        }

        let resolved = self.resolver.resolve(target_date).await.ok_or_else(|| {
            EphemerisError::GenerationExhausted {
                display_key: display_key.clone(),
                attempts: self.resolver.max_attempts(),
            }
        })?;

        let inserted = match self
            .store
            .insert(CreateEphemeris::new(target_date, resolved.text.clone()))
            .await
        {
            Ok(row) => row,
            Err(source) => {
                error!(
                    display_key = %display_key,
                    target_date = %target_date,
                    error = %source,
                    "Failed to store resolved ephemeris"
                );
                return Err(EphemerisError::PersistenceFailure {
                    display_key,
                    event: resolved,
                    source,
                });
            }
        };
        debug!(display_key = %display_key, id = %inserted.id, "Ephemeris stored");

        let ephemeris = self
            .by_display_key(&display_key)
            .await
            .into_iter()
            .find(|row| row.id == inserted.id)
            .unwrap_or(inserted);

        Ok(GenerationOutcome::Created {
            ephemeris,
            source: resolved.source,
        })
    }

    /// Read errors are logged and reported as "no rows".
    pub async fn by_display_key(&self, display_key: &str) -> Vec<Ephemeris> {
        match self.store.query_by_display_key(display_key).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(display_key = %display_key, error = %e, "Ephemeris lookup failed");
                Vec::new()
            }
        }
    }

    pub async fn random(&self) -> Option<Ephemeris> {
        match self.store.query_random_record().await {
            Ok(row) => row,
            Err(e) => {
                warn!(error = %e, "Random ephemeris lookup failed");
                None
            }
        }
    }

    /// A random row for the day of `date`, or any row when the day has none.
    pub async fn today(&self, date: NaiveDate) -> Option<Ephemeris> {
        let rows = self.by_display_key(&date_key::display_key(date)).await;
        let picked = rows.choose(&mut rand::thread_rng()).cloned();
        if picked.is_some() {
            return picked;
        }
        self.random().await
    }

    /// Stores a hand-written event after the same content checks as generated ones.
    pub async fn add_manual(&self, date: NaiveDate, event: &str) -> Result<Ephemeris, EphemerisError> {
        let event = event.trim();
        content_validator::validate(event)?;
        let row = self.store.insert(CreateEphemeris::new(date, event)).await?;
        info!(display_key = %row.display_date, id = %row.id, "Manual ephemeris stored");
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Mutex,
            atomic::{AtomicU32, Ordering},
        },
        time::Duration,
    };

    use async_trait::async_trait;
    use chrono::Utc;
    use db::models::ephemeris::{EphemerisCategory, EphemerisLanguage};
    use futures::FutureExt;
    use uuid::Uuid;

    use super::*;
    use crate::services::{
        config::GenerationSettings,
        event_generator::EventGenerator,
        retry::RetryPolicy,
        text_generator::{CompletionRequest, TextGenerationError, TextGenerator},
        verified_events::VerifiedEventTable,
    };

    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<Vec<Ephemeris>>,
        fail_inserts: bool,
        fail_reads: bool,
    }

    impl MemoryStore {
        fn seed(&self, date: NaiveDate, event: &str) -> Ephemeris {
            let row = to_row(CreateEphemeris::new(date, event));
            self.rows.lock().unwrap().push(row.clone());
            row
        }

        fn len(&self) -> usize {
            self.rows.lock().unwrap().len()
        }
    }

    fn to_row(record: CreateEphemeris) -> Ephemeris {
        Ephemeris {
            id: Uuid::new_v4(),
            display_date: record.display_date(),
            date: record.date,
            event: record.event,
            category: EphemerisCategory::Programming,
            language: EphemerisLanguage::Es,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[async_trait]
    impl RecordStore for MemoryStore {
        async fn insert(&self, record: CreateEphemeris) -> Result<Ephemeris, RecordStoreError> {
            if self.fail_inserts {
                return Err(RecordStoreError::Unavailable("write refused".to_string()));
            }
            let row = to_row(record);
            self.rows.lock().unwrap().push(row.clone());
            Ok(row)
        }

        async fn query_by_display_key(
            &self,
            display_key: &str,
        ) -> Result<Vec<Ephemeris>, RecordStoreError> {
            if self.fail_reads {
                return Err(RecordStoreError::Unavailable("read refused".to_string()));
            }
            let mut rows: Vec<_> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.display_date == display_key)
                .cloned()
                .collect();
            rows.sort_by_key(|r| r.date);
            Ok(rows)
        }

        async fn query_random_record(&self) -> Result<Option<Ephemeris>, RecordStoreError> {
            if self.fail_reads {
                return Err(RecordStoreError::Unavailable("read refused".to_string()));
            }
            Ok(self.rows.lock().unwrap().first().cloned())
        }
    }

    struct FixedGenerator {
        reply: &'static str,
        calls: AtomicU32,
    }

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, TextGenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.to_string())
        }
    }

    fn service(store: Arc<MemoryStore>, reply: &'static str) -> (EphemerisService, Arc<FixedGenerator>) {
        let generator = Arc::new(FixedGenerator {
            reply,
            calls: AtomicU32::new(0),
        });
        let retry = RetryPolicy::new(3, Duration::from_millis(2000)).with_sleeper(|_| async {}.boxed());
        let resolver = EventResolver::new(
            VerifiedEventTable::from_entries([("01-15", "Se lanza Wikipedia (2001)")]),
            EventGenerator::new(generator.clone(), &GenerationSettings::default()),
            retry,
        );
        (EphemerisService::new(store, resolver), generator)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn assert_send<T: Send>(_: &T) {}

    #[test]
    fn service_futures_are_send() {
        let (service, _) = service(Arc::new(MemoryStore::default()), "unused");
        let day = date(2024, 3, 3);
        assert_send(&service.generate(day, GenerateOptions::default()));
        assert_send(&service.today(day));
        assert_send(&service.add_manual(day, "evento"));
    }

    #[tokio::test]
    async fn verified_day_is_stored_and_read_back() {
        let store = Arc::new(MemoryStore::default());
        let (service, generator) = service(store.clone(), "unused");

        let outcome = service.generate(date(2024, 1, 15), GenerateOptions::default()).await.unwrap();
        assert_eq!(outcome.source_label(), "verified");
        let row = outcome.into_ephemeris();
        assert_eq!(row.event, "Se lanza Wikipedia (2001)");
        assert_eq!(row.display_date, "01-15");
        assert_eq!(row.date, date(2024, 1, 15));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn existing_row_short_circuits_unless_forced() {
        let store = Arc::new(MemoryStore::default());
        let seeded = store.seed(date(2023, 7, 1), "Evento guardado");
        let (service, generator) = service(store.clone(), "Evento nuevo (1999)");

        let outcome = service.generate(date(2024, 7, 1), GenerateOptions::default()).await.unwrap();
        assert_eq!(outcome, GenerationOutcome::Existing(seeded));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.len(), 1);

        let forced = service
            .generate(date(2024, 7, 1), GenerateOptions { force_regenerate: true })
            .await
            .unwrap();
        assert_eq!(forced.source_label(), "generated");
        assert_eq!(forced.into_ephemeris().event, "Evento nuevo (1999)");
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn exhausted_generation_is_an_error_and_stores_nothing() {
        let store = Arc::new(MemoryStore::default());
        let (service, generator) = service(store.clone(), "NO_EVENT");

        let err = service.generate(date(2024, 3, 3), GenerateOptions::default()).await.unwrap_err();
        assert!(matches!(
            err,
            EphemerisError::GenerationExhausted { ref display_key, attempts: 3 } if display_key == "03-03"
        ));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn persistence_failure_keeps_the_resolved_event() {
        let store = Arc::new(MemoryStore {
            fail_inserts: true,
            ..Default::default()
        });
        let (service, _) = service(store, "unused");

        let err = service.generate(date(2024, 1, 15), GenerateOptions::default()).await.unwrap_err();
        match err {
            EphemerisError::PersistenceFailure { event, display_key, .. } => {
                assert_eq!(display_key, "01-15");
                assert_eq!(event.text, "Se lanza Wikipedia (2001)");
                assert_eq!(event.source, EventSource::Verified);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn read_failures_degrade_to_empty() {
        let store = Arc::new(MemoryStore {
            fail_reads: true,
            ..Default::default()
        });
        let (service, _) = service(store.clone(), "Se anuncia Java (1995)");

        assert!(service.by_display_key("05-23").await.is_empty());
        assert!(service.random().await.is_none());
        assert!(service.today(date(2024, 5, 23)).await.is_none());

        let outcome = service.generate(date(2024, 5, 23), GenerateOptions::default()).await.unwrap();
        assert_eq!(outcome.into_ephemeris().event, "Se anuncia Java (1995)");
    }

    #[tokio::test]
    async fn today_falls_back_to_any_row() {
        let store = Arc::new(MemoryStore::default());
        let other_day = store.seed(date(1991, 8, 25), "Linus anuncia Linux (1991)");
        let (service, _) = service(store.clone(), "unused");

        assert_eq!(service.today(date(2024, 2, 2)).await, Some(other_day.clone()));

        let same_day = store.seed(date(2001, 2, 2), "Evento del 2 de febrero");
        assert_eq!(service.today(date(2024, 2, 2)).await, Some(same_day));
    }

    #[tokio::test]
    async fn manual_add_validates_content() {
        let store = Arc::new(MemoryStore::default());
        let (service, _) = service(store.clone(), "unused");

        let err = service.add_manual(date(2024, 8, 16), "16 de agosto: algo").await.unwrap_err();
        assert!(matches!(err, EphemerisError::ContentRejected(ContentRejection::LeadingDate)));

        let row = service
            .add_manual(date(1995, 8, 16), "  Se lanza Internet Explorer (1995) ")
            .await
            .unwrap();
        assert_eq!(row.event, "Se lanza Internet Explorer (1995)");
        assert_eq!(row.display_date, "08-16");
        assert_eq!(store.len(), 1);
    }
}
