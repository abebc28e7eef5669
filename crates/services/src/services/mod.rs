pub mod chat_api;
pub mod config;
pub mod content_validator;
pub mod ephemeris;
pub mod event_generator;
pub mod event_resolver;
pub mod record_store;
pub mod retry;
pub mod text_generator;
pub mod verified_events;
