//! # JSON Output Module
//!
//! Output strutturato in JSON per chi invoca `reduce-image` da un altro processo.
//!
//! ## Responsabilità:
//! - Emette un solo oggetto JSON su stdout a fine esecuzione
//! - Riusa `RunStats` così com'è, senza strutture parallele
//!
//! ## Tipi di messaggi:
//! - `complete`: scansione terminata, con statistiche e durata
//! - `error`: scansione interrotta dal primo errore
//!
//! ```json
//! {"type":"complete","stats":{"files":{...},"dirs":{...},"data":{...}},"duration_seconds":1.2}
//! ```

use crate::stats::RunStats;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    /// Scansione completata
    Complete {
        stats: RunStats,
        duration_seconds: f64,
        bytes_saved: i64,
    },

    /// Errore che ha interrotto la scansione
    Error { message: String },
}

impl JsonMessage {
    pub fn complete(stats: RunStats, elapsed: Duration) -> Self {
        Self::Complete {
            bytes_saved: stats.bytes_saved(),
            stats,
            duration_seconds: elapsed.as_secs_f64(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = self.to_json() {
            println!("{}", json);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_message_shape() {
        let mut stats = RunStats::new();
        stats.add_scanned(300);
        stats.add_optimized(100);

        let message = JsonMessage::complete(stats, Duration::from_millis(1500));
        let value: serde_json::Value = serde_json::from_str(&message.to_json().unwrap()).unwrap();

        assert_eq!(value["type"], "complete");
        assert_eq!(value["stats"]["files"]["optimized"], 1);
        assert_eq!(value["stats"]["data"]["optimized"], 100);
        assert_eq!(value["bytes_saved"], 200);
        assert_eq!(value["duration_seconds"], 1.5);
    }

    #[test]
    fn test_error_message_shape() {
        let json = JsonMessage::error("Configuration error: boom").to_json().unwrap();
        assert_eq!(json, r#"{"type":"error","message":"Configuration error: boom"}"#);
    }
}
