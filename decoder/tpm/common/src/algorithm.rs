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

//! Digest algorithms understood by the decoders.
//!
//! A log or blob selects exactly one algorithm, which fixes the digest width of every event
//! and every PCR in that artifact.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DecodeError;

/// TPM_ALG_ID of SHA-1
pub const TPM_ALG_SHA1: u16 = 0x0004;
/// TPM_ALG_ID of SHA-256
pub const TPM_ALG_SHA256: u16 = 0x000B;

pub const SHA1_DIGEST_SIZE: usize = 20;
pub const SHA256_DIGEST_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    Sha1,
    Sha256,
}

impl DigestAlgorithm {
    pub const fn digest_size(&self) -> usize {
        match self {
            DigestAlgorithm::Sha1 => SHA1_DIGEST_SIZE,
            DigestAlgorithm::Sha256 => SHA256_DIGEST_SIZE,
        }
    }

    pub const fn alg_id(&self) -> u16 {
        match self {
            DigestAlgorithm::Sha1 => TPM_ALG_SHA1,
            DigestAlgorithm::Sha256 => TPM_ALG_SHA256,
        }
    }

    /// Resolve a TPM_ALG_ID read from a header field located at `offset`.
    pub fn from_alg_id(alg_id: u32, offset: usize) -> Result<Self, DecodeError> {
        match alg_id {
            id if id == TPM_ALG_SHA1 as u32 => Ok(DigestAlgorithm::Sha1),
            id if id == TPM_ALG_SHA256 as u32 => Ok(DigestAlgorithm::Sha256),
            _ => Err(DecodeError::UnsupportedAlgorithm { offset, alg_id }),
        }
    }

    /// Resolve the algorithm from a digest width in bytes.
    pub fn from_digest_size(size: usize, offset: usize) -> Result<Self, DecodeError> {
        match size {
            SHA1_DIGEST_SIZE => Ok(DigestAlgorithm::Sha1),
            SHA256_DIGEST_SIZE => Ok(DigestAlgorithm::Sha256),
            _ => Err(DecodeError::UnsupportedAlgorithm {
                offset,
                alg_id: u32::try_from(size).unwrap_or(u32::MAX),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha1 => "sha1",
            DigestAlgorithm::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sha1" => Ok(DigestAlgorithm::Sha1),
            "sha256" => Ok(DigestAlgorithm::Sha256),
            other => Err(DecodeError::Config(format!("Unsupported hash algorithm: {}", other))),
        }
    }
}
