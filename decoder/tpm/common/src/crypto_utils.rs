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

//! Hash service used by PCR replay and integrity checking.
//!
//! The decoders never hash directly; they go through [`HashProvider`] so that callers can
//! plug in their own implementation. [`OpenSslHashProvider`] is the default.

use openssl::hash::{hash, MessageDigest};

use crate::algorithm::DigestAlgorithm;
use crate::error::DecodeError;

#[cfg_attr(test, mockall::automock)]
pub trait HashProvider {
    /// Compute the `algorithm` digest of `data`.
    fn hash(&self, algorithm: DigestAlgorithm, data: &[u8]) -> Result<Vec<u8>, DecodeError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OpenSslHashProvider;

impl OpenSslHashProvider {
    pub fn message_digest(algorithm: DigestAlgorithm) -> MessageDigest {
        match algorithm {
            DigestAlgorithm::Sha1 => MessageDigest::sha1(),
            DigestAlgorithm::Sha256 => MessageDigest::sha256(),
        }
    }
}

impl HashProvider for OpenSslHashProvider {
    fn hash(&self, algorithm: DigestAlgorithm, data: &[u8]) -> Result<Vec<u8>, DecodeError> {
        hash(Self::message_digest(algorithm), data)
            .map(|digest| digest.to_vec())
            .map_err(|e| DecodeError::HashFailure(format!("Failed to compute {} digest: {}", algorithm, e)))
    }
}
