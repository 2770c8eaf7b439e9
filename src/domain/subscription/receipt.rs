//! Deterministic order receipts.
//!
//! The gateway de-duplicates orders by receipt. Deriving the receipt from the
//! user, the plan and a time bucket means a retried `createOrder` inside one
//! bucket maps onto the same gateway order instead of creating a second one,
//! while a different user or a different plan never shares it.

use sha2::{Digest, Sha256};

use super::PlanType;
use crate::domain::foundation::{Timestamp, UserId};

/// Gateway limit on receipt length.
pub const MAX_RECEIPT_LEN: usize = 40;

/// Hex characters of the user digest kept in the receipt.
const USER_DIGEST_LEN: usize = 16;

/// Builds `rcpt_<user digest>_<plan>_<bucket>` where
/// `bucket = unix_secs / bucket_secs`.
///
/// The user part is a SHA-256 prefix of the full id, so ids that differ only
/// in punctuation or past some length still get distinct receipts.
pub fn receipt_id(user_id: &UserId, plan: PlanType, now: Timestamp, bucket_secs: i64) -> String {
    let bucket = now.as_unix_secs() / bucket_secs.max(1);
    let digest = hex::encode(Sha256::digest(user_id.as_str().as_bytes()));
    let plan_code = match plan {
        PlanType::Monthly => 'm',
        PlanType::Yearly => 'y',
    };
    format!("rcpt_{}_{}_{}", &digest[..USER_DIGEST_LEN], plan_code, bucket)
}
