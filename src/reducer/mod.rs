//! # Reducer Module
//!
//! Separa le responsabilità della riduzione in sottomoduli:
//! - `image_reducer`: Orchestratore della scansione (visitor dell'albero)
//! - `verifier`: Verifica dell'artefatto e fallback alla copia dell'originale

pub mod image_reducer;
pub mod verifier;

pub use image_reducer::{run, ImageReducer};
pub use verifier::FileOutcome;
