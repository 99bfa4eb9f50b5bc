//! Testing utilities for the Misaki backend
//!
//! Scripted providers, counting model loaders, and stub engines shared by
//! the integration suite and available to downstream tests.

pub mod providers;

pub use providers::{CountingLoader, ScriptedProvider, StubEngine};
