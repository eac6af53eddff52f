//! Test support for end-to-end contact-form tests.
//!
//! Wires the full service together in-process and pairs it with a
//! recording mock relay so tests can follow a submission from HTTP
//! request to SMTP delivery.

pub mod harness;
pub mod mock_server;

pub use harness::TestHarness;
