// ------------------------------------------------------------
// Collector module
// ------------------------------------------------------------
//
// The runner owns the fetch loop and the persistence step.
// It is strictly sequential: one source session, one pass over
// the identifier space, one file fully rewritten at the end.
//
pub mod runner;

pub use runner::{collect, collect_and_persist, write_collection};
