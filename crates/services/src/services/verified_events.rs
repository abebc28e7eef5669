//! Hand-checked events that bypass the AI fallback entirely.

use std::collections::HashMap;

use rand::seq::SliceRandom;

const BUILTIN_EVENTS: &[(&str, &str)] = &[
    ("01-15", "Se lanza Wikipedia, la enciclopedia libre en línea (2001)"),
    ("02-20", "Guido van Rossum publica Python 0.9.0 en el grupo alt.sources (1991)"),
    ("03-12", "Tim Berners-Lee presenta en el CERN la propuesta que daría origen a la World Wide Web (1989)"),
    ("04-07", "IBM anuncia la familia de computadoras System/360 (1964)"),
    ("05-15", "Se publica Rust 1.0, la primera versión estable del lenguaje (2015)"),
    ("08-15", "IBM anuncia el retiro de su mainframe System/390 modelo G5 y G6 para dar paso a la nueva serie zSeries (2000)"),
    ("08-16", "Se lanza la primera versión del navegador web Internet Explorer incluido con Windows 95 Plus! Pack (1995)"),
    ("08-25", "Linus Torvalds anuncia en comp.os.minix que está trabajando en un sistema operativo libre: Linux (1991)"),
    ("11-10", "Google anuncia públicamente el lenguaje de programación Go (2009)"),
    ("12-04", "Netscape y Sun Microsystems anuncian JavaScript (1995)"),
    ("12-09", "Douglas Engelbart presenta el ratón y el hipertexto en la llamada \"madre de todas las demos\" (1968)"),
    ("12-09", "Nace Grace Hopper, pionera de los compiladores y creadora de FLOW-MATIC (1906)"),
];

/// Immutable `MM-DD` → events table, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct VerifiedEventTable {
    entries: HashMap<String, Vec<String>>,
}

impl VerifiedEventTable {
    pub fn builtin() -> Self {
        Self::from_entries(BUILTIN_EVENTS.iter().copied())
    }

    /// Repeated keys accumulate into one multi-event entry.
    pub fn from_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for (key, event) in entries {
            map.entry(key.into()).or_default().push(event.into());
        }
        Self { entries: map }
    }

    /// Picks uniformly at random when a day has several events.
    pub fn lookup(&self, display_key: &str) -> Option<String> {
        self.entries
            .get(display_key)
            .and_then(|events| events.choose(&mut rand::thread_rng()))
            .cloned()
    }
}
