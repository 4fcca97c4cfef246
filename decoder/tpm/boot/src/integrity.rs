/*
 * Copyright (c) Huawei Technologies Co., Ltd. 2025. All rights reserved.
 * Global Trust Authority is licensed under the Mulan PSL v2.
 * You can use this software according to the terms and conditions of the Mulan PSL v2.
 * You may obtain a copy of Mulan PSL v2 at:
 *     http://license.coscl.org.cn/MulanPSL2
 * THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY KIND, EITHER EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR
 * PURPOSE.
 * See the Mulan PSL v2 for more details.
 */

//! Advisory digest check of a single event.

use log::warn;
use serde::Serialize;
use tpm_common_decoder::{DigestAlgorithm, HashProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrityStatus {
    Matched,
    Mismatched,
}

pub struct IntegrityChecker;

impl IntegrityChecker {
    /// Recompute the digest of `event_data` and compare it with `stored_digest`.
    ///
    /// Never fails: a provider error is reported as `Mismatched`, since the stored digest could
    /// not be confirmed.
    pub fn check(
        event_data: &[u8],
        stored_digest: &[u8],
        algorithm: DigestAlgorithm,
        provider: &dyn HashProvider,
    ) -> IntegrityStatus {
        match provider.hash(algorithm, event_data) {
            Ok(computed) if computed.as_slice() == stored_digest => IntegrityStatus::Matched,
            Ok(_) => IntegrityStatus::Mismatched,
            Err(e) => {
                warn!("Failed to recompute event digest: {}", e);
                IntegrityStatus::Mismatched
            }
        }
    }
}
