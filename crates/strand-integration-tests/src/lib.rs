//! Integration tests for the Strand bootstrap.
//!
//! No library code here. The tests under `tests/` run complete bootstrap
//! sequences against the in-process mock services from
//! `strand_bootstrap::testing`, with on-disk credential stores to simulate
//! process restarts.
//!
//! ```sh
//! cargo test -p strand-integration-tests
//! ```
