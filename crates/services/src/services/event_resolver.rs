//! Decides which event to present for a calendar day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use tracing::{info, warn};
use utils::date_key;

use super::{event_generator::EventGenerator, retry::RetryPolicy, verified_events::VerifiedEventTable};

/// Where a resolved event came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EventSource {
    Verified,
    Generated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEvent {
    pub text: String,
    pub source: EventSource,
}

pub struct EventResolver {
    table: VerifiedEventTable,
    generator: EventGenerator,
    retry: RetryPolicy,
}

impl EventResolver {
    pub fn new(table: VerifiedEventTable, generator: EventGenerator, retry: RetryPolicy) -> Self {
        Self {
            table,
            generator,
            retry,
        }
    }

    /// Verified table first, then the AI fallback under the retry policy.
    /// `None` means every source came back empty.
    pub async fn resolve(&self, target_date: NaiveDate) -> Option<ResolvedEvent> {
        let display_key = date_key::display_key(target_date);

        if let Some(text) = self.table.lookup(&display_key) {
            info!(display_key = %display_key, "Using verified event");
            return Some(ResolvedEvent {
                text,
                source: EventSource::Verified,
            });
        }

        match self.retry.run(|| self.generator.generate(target_date)).await {
            Some(text) => {
                info!(display_key = %display_key, "Using generated event");
                Some(ResolvedEvent {
                    text,
                    source: EventSource::Generated,
                })
            }
            None => {
                warn!(
                    display_key = %display_key,
                    target_date = %target_date,
                    attempts = self.retry.max_attempts(),
                    "No acceptable event after all generation attempts"
                );
                None
            }
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.retry.max_attempts()
    }
}
