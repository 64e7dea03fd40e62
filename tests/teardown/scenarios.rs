//! BDD scenarios for teardown.

use rstest_bdd_macros::scenario;

use super::test_helpers::{TeardownContext, teardown_context};

#[scenario(
    path = "tests/features/teardown.feature",
    name = "Live teardown removes cloud and cluster resources"
)]
fn scenario_live_teardown(teardown_context: TeardownContext) {
    let _ = teardown_context;
}

#[scenario(
    path = "tests/features/teardown.feature",
    name = "Missing storage location stops teardown"
)]
fn scenario_missing_storage_location(teardown_context: TeardownContext) {
    let _ = teardown_context;
}

#[scenario(
    path = "tests/features/teardown.feature",
    name = "A failed detach keeps the role"
)]
fn scenario_failed_detach(teardown_context: TeardownContext) {
    let _ = teardown_context;
}
