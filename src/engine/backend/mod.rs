//! Execution backends: the two strategies an element can be dispatched to.

pub mod rest;
pub mod script;

pub use rest::{HttpTransport, ReqwestTransport};
