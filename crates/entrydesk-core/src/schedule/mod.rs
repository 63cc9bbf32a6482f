//! Scheduling contracts used by the editor.
//!
//! - [`Debouncer`]: run an action once triggers have stopped for a duration.
//! - [`RequestSequence`]: tag requests so only the latest response is applied.

mod debounce;
mod sequence;

pub use debounce::Debouncer;
pub use sequence::{RequestSequence, Ticket};
