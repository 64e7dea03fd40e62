//! BDD scenarios for provisioning.

use rstest_bdd_macros::scenario;

use super::test_helpers::{ProvisionContext, provision_context};

#[scenario(
    path = "tests/features/provision.feature",
    name = "Fresh cluster receives every backup resource"
)]
fn scenario_fresh_cluster(provision_context: ProvisionContext) {
    let _ = provision_context;
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "Re-running provisioning reuses the role and policy"
)]
fn scenario_rerun(provision_context: ProvisionContext) {
    let _ = provision_context;
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "Unknown management cluster stops provisioning"
)]
fn scenario_unknown_management_cluster(provision_context: ProvisionContext) {
    let _ = provision_context;
}
