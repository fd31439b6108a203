// Adapters layer: concrete implementations for the outside world (document files, transcripts).

pub mod store;
pub mod transcript;
