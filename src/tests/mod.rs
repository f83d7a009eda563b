//! Test suite.
//!
//! - `mocks`: shared test doubles (scripted item source, recording cache)
//! - `unit`: component tests (two-path resolution matrix, reconciliation
//!   loop discipline, database operations)
//! - `property`: proptest invariants for the gating rules

mod mocks;
