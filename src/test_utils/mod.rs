//! Test utilities: in-memory repository mocks, a recording notifier, a fixed
//! clock, and a builder for assembling an `AppState` out of all of them.

mod app_state_builder;
mod factories;
mod mocks;

pub use app_state_builder::*;
pub use factories::*;
pub use mocks::*;
