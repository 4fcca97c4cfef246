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

//! Error taxonomy shared by the log, SIPA and container decoders.
//!
//! Every structural error carries the byte offset at which the violation was detected.
//! Offsets are absolute within the buffer handed to the top-level decode call.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Malformed log at offset {offset}: {reason}")]
    MalformedLog { offset: usize, reason: String },

    #[error("Malformed payload at offset {offset}: {reason}")]
    MalformedPayload { offset: usize, reason: String },

    #[error("Bad magic 0x{magic:08X} at offset {offset}")]
    BadMagic { offset: usize, magic: u32 },

    #[error("Unknown shape at offset {offset}: {reason}")]
    UnknownShape { offset: usize, reason: String },

    #[error("Truncated buffer at offset {offset}: {needed} bytes required, {available} bytes available")]
    TruncatedBuffer { offset: usize, needed: usize, available: usize },

    #[error("Unsupported algorithm 0x{alg_id:04X} at offset {offset}")]
    UnsupportedAlgorithm { offset: usize, alg_id: u32 },

    #[error("Nesting depth limit {limit} exceeded at offset {offset}")]
    RecursionLimitExceeded { offset: usize, limit: usize },

    #[error("Input of {size} bytes exceeds limit of {limit} bytes")]
    Oversized { size: usize, limit: usize },

    #[error("Digest of {actual} bytes where {expected} bytes are required")]
    DigestWidth { expected: usize, actual: usize },

    #[error("Hash failure: {0}")]
    HashFailure(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialize(String),
}

impl DecodeError {
    pub fn malformed_log(offset: usize, reason: impl Into<String>) -> Self {
        DecodeError::MalformedLog { offset, reason: reason.into() }
    }

    pub fn malformed_payload(offset: usize, reason: impl Into<String>) -> Self {
        DecodeError::MalformedPayload { offset, reason: reason.into() }
    }

    pub fn unknown_shape(offset: usize, reason: impl Into<String>) -> Self {
        DecodeError::UnknownShape { offset, reason: reason.into() }
    }

    /// Byte offset of a structural error, `None` for the non-structural variants.
    pub fn offset(&self) -> Option<usize> {
        match self {
            DecodeError::MalformedLog { offset, .. }
            | DecodeError::MalformedPayload { offset, .. }
            | DecodeError::BadMagic { offset, .. }
            | DecodeError::UnknownShape { offset, .. }
            | DecodeError::TruncatedBuffer { offset, .. }
            | DecodeError::UnsupportedAlgorithm { offset, .. }
            | DecodeError::RecursionLimitExceeded { offset, .. } => Some(*offset),
            DecodeError::Oversized { .. }
            | DecodeError::DigestWidth { .. }
            | DecodeError::HashFailure(_)
            | DecodeError::Config(_)
            | DecodeError::Serialize(_) => None,
        }
    }

    /// Re-tag a cursor error as a log framing error, keeping its offset.
    pub fn into_malformed_log(self) -> Self {
        match self {
            DecodeError::TruncatedBuffer { offset, needed, available } => DecodeError::MalformedLog {
                offset,
                reason: format!("{} bytes required, {} bytes available", needed, available),
            },
            DecodeError::MalformedPayload { offset, reason } => DecodeError::MalformedLog { offset, reason },
            other => other,
        }
    }

    /// Re-tag a cursor error as a payload error, keeping its offset.
    pub fn into_malformed_payload(self) -> Self {
        match self {
            DecodeError::TruncatedBuffer { offset, needed, available } => DecodeError::MalformedPayload {
                offset,
                reason: format!("{} bytes required, {} bytes available", needed, available),
            },
            DecodeError::MalformedLog { offset, reason } => DecodeError::MalformedPayload { offset, reason },
            other => other,
        }
    }
}
