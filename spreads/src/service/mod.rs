//! Domain services of the spreads service.

pub mod interpretations;
pub mod spreads;

pub use interpretations::InterpretationService;
pub use spreads::SpreadService;
