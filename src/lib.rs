// ------------------------------------------------------------
// Module declarations
// ------------------------------------------------------------
//
// Each module represents a well-defined responsibility:
//
// - config:    Configuration structs loaded from JSON
// - schema:    Strongly typed subnet record definitions
// - util:      Shared helper utilities (time, slugs)
// - sources:   Metadata source trait and the subtensor chain source
// - collector: Fetch loop, per-item error capture, persistence
// - renderer:  Markdown profile generation from a Collection
//
pub mod config;
pub mod schema;
pub mod util;
pub mod sources;
pub mod collector;
pub mod renderer;
