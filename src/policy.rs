//! IAM and key policy documents.

use serde_json::{Value, json};

/// Policy language version used by every document.
pub const POLICY_VERSION: &str = "2012-10-17";

/// Key operations granted to the backup role.
pub const KEY_ACTIONS: [&str; 4] = [
    "kms:Encrypt",
    "kms:Decrypt",
    "kms:GenerateDataKey",
    "kms:DescribeKey",
];

/// Trust policy letting the backup service account assume the role through
/// the management cluster's identity provider.
#[must_use]
pub fn trust_policy(provider_arn: &str, issuer_host_path: &str, subject: &str) -> Value {
    let subject_key = format!("{issuer_host_path}:sub");
    json!({
        "Version": POLICY_VERSION,
        "Statement": [{
            "Effect": "Allow",
            "Principal": { "Federated": provider_arn },
            "Action": ["sts:AssumeRoleWithWebIdentity"],
            "Condition": { "StringEquals": { subject_key: subject } }
        }]
    })
}

/// Key policy granting the backup role use of the key.
///
/// The second statement keeps `admin_principal` in full control of the key,
/// so the policy never locks out the caller that applies it.
#[must_use]
pub fn key_policy(role_arn: &str, admin_principal: &str) -> Value {
    json!({
        "Version": POLICY_VERSION,
        "Statement": [
            {
                "Sid": "AllowClusterRoleAccess",
                "Effect": "Allow",
                "Principal": { "AWS": role_arn },
                "Action": KEY_ACTIONS,
                "Resource": "*"
            },
            {
                "Sid": "AllowAdministratorFullAccess",
                "Effect": "Allow",
                "Principal": { "AWS": "*" },
                "Action": "kms:*",
                "Resource": "*",
                "Condition": { "StringEquals": { "aws:PrincipalArn": admin_principal } }
            }
        ]
    })
}

/// Identity policy mirroring the key permissions, scoped to one key.
#[must_use]
pub fn companion_policy(key_arn: &str) -> Value {
    json!({
        "Version": POLICY_VERSION,
        "Statement": [{
            "Effect": "Allow",
            "Action": KEY_ACTIONS,
            "Resource": key_arn
        }]
    })
}
