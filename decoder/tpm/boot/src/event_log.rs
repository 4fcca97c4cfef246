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

//! Event Log decoding
//!
//! Ties the pieces together for one log: frames the records, recomputes each event digest,
//! decodes SIPA records carried by `EV_EVENT_TAG` events and replays every measurement into a
//! fresh PCR bank.
//!
//! Main features include:
//! - Decoding TCG format event logs of a single digest algorithm
//! - Replaying the log into simulated PCR values
//! - Comparing the replayed PCRs with a reported bank
//! - Serializing the decoded log into JSON
//!

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use log::{debug, warn};
use serde::Serialize;
use serde_json::{json, Value};
use tpm_common_decoder::{DecodeError, DecoderConfig, DigestAlgorithm, HashProvider, PcrBank, PcrReplayEngine};

use crate::event_type::{EventType, LogEvent};
use crate::integrity::{IntegrityChecker, IntegrityStatus};
use crate::log_iterator::LogIterator;
use crate::sipa::{SipaDecoder, SipaEvent};

/// A framed event together with everything derived from it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedEvent<'a> {
    pub event: LogEvent<'a>,
    pub digest_covers_event_data: bool,     // Whether the digest is defined over event_data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integrity: Option<IntegrityStatus>, // None when integrity checking is disabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sipa: Option<Vec<SipaEvent<'a>>>,   // SIPA records of EV_EVENT_TAG events
}

impl DecodedEvent<'_> {
    /// A mismatch on an event whose digest should cover its own data.
    pub fn is_suspicious(&self) -> bool {
        self.digest_covers_event_data && self.integrity == Some(IntegrityStatus::Mismatched)
    }
}

/// TPM Event Log
///
/// # Fields
/// * `algorithm` - Digest algorithm of every event in the log
/// * `events` - Decoded events in log order
/// * `replayed` - PCR bank obtained by replaying every event
/// * `startup_locality` - Locality applied to PCR 0, if the log carried one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLog<'a> {
    algorithm: DigestAlgorithm,
    events: Vec<DecodedEvent<'a>>,
    replayed: PcrBank,
    startup_locality: Option<u8>,
}

impl<'a> EventLog<'a> {
    /// Decode and replay a complete log
    ///
    /// # Parameters
    /// * `buffer` - Raw log bytes
    /// * `algorithm` - Digest algorithm of the log's events
    /// * `provider` - Hash service used for replay and integrity checks
    /// * `config` - Decoder limits
    ///
    /// # Errors
    /// * `DecodeError::Oversized` - If `buffer` exceeds `config.max_buffer_size`
    /// * `DecodeError::MalformedLog` - If a record overruns the buffer
    /// * `DecodeError::MalformedPayload` / `DecodeError::RecursionLimitExceeded` - If a SIPA payload is invalid
    /// * `DecodeError::HashFailure` - If the hash provider fails during replay
    pub fn decode(
        buffer: &'a [u8],
        algorithm: DigestAlgorithm,
        provider: &dyn HashProvider,
        config: &DecoderConfig,
    ) -> Result<Self, DecodeError> {
        Self::decode_at(buffer, algorithm, 0, provider, config)
    }

    /// Like [`decode`](Self::decode) for a log embedded at `base_offset` of an outer buffer.
    pub fn decode_at(
        buffer: &'a [u8],
        algorithm: DigestAlgorithm,
        base_offset: usize,
        provider: &dyn HashProvider,
        config: &DecoderConfig,
    ) -> Result<Self, DecodeError> {
        config.check_size(buffer.len())?;
        let sipa_decoder = SipaDecoder::from_config(config);
        let mut engine = PcrReplayEngine::new(algorithm, provider);
        let mut startup_locality = None;
        let mut events = Vec::new();

        for item in LogIterator::with_base_offset(buffer, algorithm, base_offset) {
            let event = item?;

            if event.event_type == EventType::EvNoAction {
                if let Some(locality) = event.startup_locality() {
                    if engine.set_startup_locality(locality) {
                        startup_locality = Some(locality);
                    } else {
                        warn!("Ignoring startup locality {} after PCR 0 was extended", locality);
                    }
                }
            } else {
                engine.extend(event.pcr_index, event.digest).map_err(|e| match e {
                    DecodeError::DigestWidth { expected, actual } => DecodeError::malformed_payload(
                        event.offset,
                        format!("Digest of {} bytes cannot extend a {}-byte PCR", actual, expected),
                    ),
                    other => other,
                })?;
            }

            let digest_covers_event_data = event.event_type.digest_covers_event_data();
            let integrity = config
                .verify_integrity
                .then(|| IntegrityChecker::check(event.event_data, event.digest, algorithm, provider));
            if digest_covers_event_data && integrity == Some(IntegrityStatus::Mismatched) {
                warn!(
                    "Digest mismatch, event_number: {}, event_type: {}, offset: {}",
                    event.event_number, event.event_type, event.offset
                );
            }

            let sipa = match event.event_type {
                EventType::EvEventTag => {
                    Some(sipa_decoder.decode_stream(event.event_data, event.event_data_offset())?)
                }
                _ => None,
            };

            events.push(DecodedEvent {
                event,
                digest_covers_event_data,
                integrity,
                sipa,
            });
        }
        debug!("Decoded {} events with {}", events.len(), algorithm);

        Ok(Self {
            algorithm,
            events,
            replayed: engine.into_bank(),
            startup_locality,
        })
    }

    /// Decode the base64 transport encoding of a log; pass the result to [`decode`](Self::decode).
    pub fn decode_base64(encoded: &str, config: &DecoderConfig) -> Result<Vec<u8>, DecodeError> {
        let bytes = BASE64
            .decode(encoded.trim().as_bytes())
            .map_err(|e| DecodeError::malformed_log(0, format!("Failed to decode event log: {}", e)))?;
        config.check_size(bytes.len())?;
        Ok(bytes)
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    pub fn events(&self) -> &[DecodedEvent<'a>] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// PCR values obtained by replaying the log.
    pub fn replayed(&self) -> &PcrBank {
        &self.replayed
    }

    pub fn startup_locality(&self) -> Option<u8> {
        self.startup_locality
    }

    /// Events whose recomputed digest contradicts a digest that should cover their data.
    pub fn suspicious_events(&self) -> impl Iterator<Item = &DecodedEvent<'a>> {
        self.events.iter().filter(|event| event.is_suspicious())
    }

    /// PCR indices where the replayed log disagrees with `reported`.
    pub fn mismatched_pcrs(&self, reported: &PcrBank) -> Vec<u32> {
        let mismatched = self.replayed.mismatched_indices(reported);
        if !mismatched.is_empty() {
            warn!("Replayed PCRs {:?} do not match the reported values", mismatched);
        }
        mismatched
    }

    /// Convert to JSON value
    ///
    /// One object per event: `event_number`, `offset`, `pcr_index`, `event_type`, `digest`,
    /// `digest_covers_event_data` and, when present, `integrity` and `sipa`.
    pub fn to_json_value(&self) -> Result<Value, DecodeError> {
        let event_entries = self
            .events
            .iter()
            .map(|entry| {
                let mut obj = serde_json::Map::new();
                obj.insert("event_number".to_string(), json!(entry.event.event_number));
                obj.insert("offset".to_string(), json!(entry.event.offset));
                obj.insert("pcr_index".to_string(), json!(entry.event.pcr_index));
                obj.insert("event_type".to_string(), json!(entry.event.event_type.to_string()));
                obj.insert("digest".to_string(), json!(hex::encode(entry.event.digest)));
                obj.insert("digest_covers_event_data".to_string(), json!(entry.digest_covers_event_data));
                if let Some(integrity) = entry.integrity {
                    obj.insert("integrity".to_string(), json!(integrity));
                }
                if let Some(sipa) = &entry.sipa {
                    let sipa_json = serde_json::to_value(sipa)
                        .map_err(|e| DecodeError::Serialize(format!("Failed to serialize SIPA events: {}", e)))?;
                    obj.insert("sipa".to_string(), sipa_json);
                }
                Ok(Value::Object(obj))
            })
            .collect::<Result<Vec<Value>, DecodeError>>()?;

        Ok(Value::Array(event_entries))
    }
}
