//! Single-attempt AI generation of a historical event for a calendar day.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use tracing::{debug, warn};
use utils::date_key;

use super::{
    config::GenerationSettings,
    content_validator::{self, MAX_EVENT_CHARS, NO_EVENT_SENTINEL},
    text_generator::{CompletionRequest, TextGenerator},
};

pub struct EventGenerator {
    client: Arc<dyn TextGenerator>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl EventGenerator {
    pub fn new(client: Arc<dyn TextGenerator>, settings: &GenerationSettings) -> Self {
        Self {
            client,
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        }
    }

    pub fn build_request(&self, date: NaiveDate) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            prompt: build_prompt(date),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    /// One call to the model. Service failures and unacceptable answers both
    /// come back as `None`; the caller decides whether to try again.
    pub async fn generate(&self, date: NaiveDate) -> Option<String> {
        let display_key = date_key::display_key(date);
        debug!(display_key = %display_key, "Asking the model for an event");

        let request = self.build_request(date);
        let raw = match self.client.complete(&request).await {
            Ok(text) => text,
            Err(e) => {
                warn!(display_key = %display_key, error = %e, "Event generation request failed");
                return None;
            }
        };

        let candidate = raw.trim();
        if candidate == NO_EVENT_SENTINEL {
            debug!(display_key = %display_key, "Model reported no verifiable event");
            return None;
        }
        if let Err(rejection) = content_validator::validate(candidate) {
            debug!(
                display_key = %display_key,
                reason = %rejection,
                candidate = %candidate,
                "Discarding generated event"
            );
            return None;
        }

        Some(candidate.to_string())
    }
}

fn build_prompt(date: NaiveDate) -> String {
    let phrase = date_key::human_phrase(date);
    format!(
        r#"ERES UN VERIFICADOR HISTÓRICO ULTRA-ESTRICTO especializado en tecnología y programación.
Encuentra UN SOLO evento tecnológico que haya ocurrido EXACTAMENTE el día {phrase}, en cualquier año.

REGLAS:
1. Fecha exacta: día {day}, mes {month}. No sirven eventos de días cercanos.
2. No inventes ni aproximes; solo hechos verificables.
3. Solo eventos de historia de la tecnología o la programación.
4. Si no conoces ninguno con total certeza, responde únicamente "{NO_EVENT_SENTINEL}".

Formato: solo el texto del evento en español, máximo {MAX_EVENT_CHARS} caracteres, sin mencionar la fecha. Puedes terminar con el año entre paréntesis."#,
        day = date.day(),
        month = date.month(),
    )
}
