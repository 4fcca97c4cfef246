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

//! Platform attestation evidence
//!
//! Decodes a platform attestation blob end to end: the reported PCR bank, the embedded log
//! replayed into a second bank, and the quote and signature handed on untouched to whoever
//! verifies the quote.

use log::{debug, warn};
use serde::Serialize;
use serde_json::{json, Value};
use tpm_blob_decoder::{PlatformAttestationBlob, PlatformAttestationHeader};
use tpm_common_decoder::{DecodeError, DecoderConfig, DigestAlgorithm, HashProvider, PcrBank};

use crate::event_log::EventLog;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformEvidence<'a> {
    blob: PlatformAttestationBlob<'a>,
    algorithm: DigestAlgorithm,
    reported: PcrBank,
    log: EventLog<'a>,
}

/// Summary of how the replayed log compares with the reported PCRs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PcrComparison {
    pub reported: PcrBank,
    pub replayed: PcrBank,
    pub mismatched_pcrs: Vec<u32>,
}

impl<'a> PlatformEvidence<'a> {
    /// Decode a platform attestation blob and replay its log
    ///
    /// # Errors
    /// * `DecodeError::Oversized` - If `buffer` exceeds `config.max_buffer_size`
    /// * `DecodeError::BadMagic` / `UnknownShape` / `TruncatedBuffer` - If the container is invalid
    /// * `DecodeError::UnsupportedAlgorithm` - If the header names an unknown PCR algorithm
    /// * Any error of [`EventLog::decode`], with offsets relative to `buffer`
    pub fn decode(buffer: &'a [u8], provider: &dyn HashProvider, config: &DecoderConfig) -> Result<Self, DecodeError> {
        config.check_size(buffer.len())?;
        let blob = PlatformAttestationBlob::parse(buffer)?;
        let algorithm = blob.algorithm()?;
        let reported = blob.pcr_bank()?;
        let log = EventLog::decode_at(blob.log(), algorithm, blob.log_offset(), provider, config)?;
        debug!(
            "Platform evidence with {} events, quote {} bytes, signature {} bytes",
            log.len(),
            blob.quote().len(),
            blob.signature().len()
        );

        Ok(Self { blob, algorithm, reported, log })
    }

    pub fn header(&self) -> &PlatformAttestationHeader {
        &self.blob.header
    }

    pub fn blob(&self) -> &PlatformAttestationBlob<'a> {
        &self.blob
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// PCR values reported by the platform, covered by the quote.
    pub fn reported(&self) -> &PcrBank {
        &self.reported
    }

    /// PCR values obtained by replaying the embedded log.
    pub fn replayed(&self) -> &PcrBank {
        self.log.replayed()
    }

    pub fn log(&self) -> &EventLog<'a> {
        &self.log
    }

    pub fn quote(&self) -> &'a [u8] {
        self.blob.quote()
    }

    pub fn signature(&self) -> &'a [u8] {
        self.blob.signature()
    }

    /// PCR indices where the log does not explain the reported value.
    pub fn mismatched_pcrs(&self) -> Vec<u32> {
        self.log.mismatched_pcrs(&self.reported)
    }

    pub fn compare(&self) -> PcrComparison {
        PcrComparison {
            reported: self.reported.clone(),
            replayed: self.replayed().clone(),
            mismatched_pcrs: self.mismatched_pcrs(),
        }
    }

    pub fn to_json_value(&self) -> Result<Value, DecodeError> {
        let header = serde_json::to_value(&self.blob.header)
            .map_err(|e| DecodeError::Serialize(format!("Failed to serialize header: {}", e)))?;
        let sections = serde_json::to_value(&self.blob.sections)
            .map_err(|e| DecodeError::Serialize(format!("Failed to serialize sections: {}", e)))?;
        let comparison = serde_json::to_value(self.compare())
            .map_err(|e| DecodeError::Serialize(format!("Failed to serialize PCR comparison: {}", e)))?;
        let suspicious = self.log.suspicious_events().count();
        if suspicious > 0 {
            warn!("{} events carry a digest that does not match their data", suspicious);
        }

        Ok(json!({
            "header": header,
            "sections": sections,
            "hash_alg": self.algorithm.name(),
            "quote": hex::encode(self.quote()),
            "signature": hex::encode(self.signature()),
            "pcrs": comparison,
            "event_log": self.log.to_json_value()?,
        }))
    }
}
