//! Deterministic resource names.
//!
//! Teardown holds no inventory, so every name it needs must either be
//! recomputable from the cluster identity (everything here except the bucket)
//! or discoverable from a live resource that recorded it (the bucket).

use uuid::Uuid;

/// Prefix of the backup IAM role name.
pub const ROLE_NAME_PREFIX: &str = "rosa-hcp-bkp-";

/// Prefix of generated backup bucket names.
pub const BUCKET_NAME_PREFIX: &str = "rosa-hcp-backup-oadp-";

/// Prefix of the companion IAM policy granting key access.
pub const KMS_POLICY_PREFIX: &str = "AllowSSEKMSBackupKey-";

/// Suffix shared by the schedule and backup storage location names.
pub const SCHEDULE_SUFFIX: &str = "-hourly";

/// Name of the backup IAM role for a management cluster and cluster pair.
#[must_use]
pub fn role_name(mc_name: &str, cluster_id: &str) -> String {
    format!("{ROLE_NAME_PREFIX}{mc_name}-{cluster_id}")
}

/// Name of the companion IAM policy mirroring the key permissions.
#[must_use]
pub fn kms_policy_name(cluster_id: &str) -> String {
    format!("{KMS_POLICY_PREFIX}{cluster_id}")
}

/// Name of the schedule and backup storage location created for a cluster.
#[must_use]
pub fn schedule_resource_name(cluster_id: &str) -> String {
    format!("{cluster_id}{SCHEDULE_SUFFIX}")
}

/// Generates a fresh, globally unique bucket name.
///
/// Only used at creation time; the result cannot be recomputed later.
#[must_use]
pub fn generate_bucket_name() -> String {
    bucket_name_for(Uuid::new_v4())
}

fn bucket_name_for(token: Uuid) -> String {
    format!("{BUCKET_NAME_PREFIX}{}", token.simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("hs-mc-1", "abc123", "rosa-hcp-bkp-hs-mc-1-abc123")]
    #[case("hs-mc-n1j3kghkg", "2a3b", "rosa-hcp-bkp-hs-mc-n1j3kghkg-2a3b")]
    fn role_name_joins_prefix_mc_and_cluster(
        #[case] mc: &str,
        #[case] cluster: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(role_name(mc, cluster), expected);
        assert_eq!(role_name(mc, cluster), role_name(mc, cluster));
    }

    #[test]
    fn kms_policy_and_schedule_names() {
        assert_eq!(kms_policy_name("abc123"), "AllowSSEKMSBackupKey-abc123");
        assert_eq!(schedule_resource_name("abc123"), "abc123-hourly");
    }

    #[test]
    fn bucket_name_uses_lowercase_hex_without_hyphens() {
        let token = Uuid::from_u128(0x0123_4567_89AB_CDEF_0123_4567_89AB_CDEF);
        assert_eq!(
            bucket_name_for(token),
            "rosa-hcp-backup-oadp-0123456789abcdef0123456789abcdef"
        );
    }

    #[test]
    fn generated_bucket_names_are_unique_and_well_formed() {
        let first = generate_bucket_name();
        let second = generate_bucket_name();
        assert_ne!(first, second);

        let suffix = first
            .strip_prefix(BUCKET_NAME_PREFIX)
            .expect("prefix should be present");
        assert_eq!(suffix.len(), 32);
        assert!(
            suffix
                .chars()
                .all(|ch| ch.is_ascii_digit() || ('a'..='f').contains(&ch))
        );
    }
}
