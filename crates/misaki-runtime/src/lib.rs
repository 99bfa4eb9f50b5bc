//! # misaki-runtime
//!
//! The thin I/O shell around the escalation core: parses the invocation
//! payload into a prompt, wires settings → providers → orchestrator once per
//! warm execution context, and serializes the orchestrator's result into the
//! outbound JSON contract.
//!
//! The model cache is created here, at context startup, and injected into
//! the local provider — consecutive invocations of the same warm process
//! reuse the loaded model without request logic ever owning it.

pub mod event;
pub mod handler;
pub mod response;

pub use event::{EventError, parse_event};
pub use handler::Handler;
pub use response::LambdaResponse;
