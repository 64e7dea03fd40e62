//! Cluster-managed backup resources.

use std::fmt;

use crate::naming;

/// Kinds of backup custom resources the teardown removes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ResourceKind {
    /// Where backup data is written; records the bucket name.
    BackupStorageLocation,
    /// Periodic backup schedule.
    Schedule,
    /// A single backup taken by the schedule.
    Backup,
    /// Credentials secret.
    Secret,
    /// Repository metadata for file-system backups.
    BackupRepository,
}

impl ResourceKind {
    /// Order in which teardown deletes cluster resources.
    pub const TEARDOWN_ORDER: [Self; 5] = [
        Self::BackupStorageLocation,
        Self::Schedule,
        Self::Backup,
        Self::Secret,
        Self::BackupRepository,
    ];

    /// Resource name understood by the cluster CLI.
    #[must_use]
    pub const fn cli_name(self) -> &'static str {
        match self {
            Self::BackupStorageLocation => "backupstoragelocation",
            Self::Schedule => "schedule",
            Self::Backup => "backup",
            Self::Secret => "secret",
            Self::BackupRepository => "backuprepository",
        }
    }

    /// `kind` field as written in a manifest.
    #[must_use]
    pub const fn manifest_kind(self) -> &'static str {
        match self {
            Self::BackupStorageLocation => "BackupStorageLocation",
            Self::Schedule => "Schedule",
            Self::Backup => "Backup",
            Self::Secret => "Secret",
            Self::BackupRepository => "BackupRepository",
        }
    }

    /// Looks up the kind named by a manifest `kind` field.
    #[must_use]
    pub fn from_manifest_kind(kind: &str) -> Option<Self> {
        Self::TEARDOWN_ORDER
            .into_iter()
            .find(|candidate| candidate.manifest_kind() == kind)
    }

    /// Name a resource of this kind is created under, when it is derivable
    /// from the cluster identifier alone.
    #[must_use]
    pub fn deterministic_name(self, cluster_id: &str) -> Option<String> {
        match self {
            Self::BackupStorageLocation | Self::Schedule => {
                Some(naming::schedule_resource_name(cluster_id))
            }
            Self::Backup | Self::Secret | Self::BackupRepository => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.manifest_kind())
    }
}

/// Returns `true` when `name` belongs to `cluster_id` under the substring
/// rule used for kinds without a deterministic name.
#[must_use]
pub fn belongs_to_cluster(name: &str, cluster_id: &str) -> bool {
    name.contains(cluster_id)
}
