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

//! SIPA event decoding
//!
//! SIPA records are `typeCode:u32, length:u32, payload[length]`, little-endian. Aggregation
//! records hold a nested record stream that must consume their payload exactly. Nesting is
//! walked with an explicit stack bounded by a maximum depth, so adversarial logs cannot
//! exhaust the call stack.

use log::{debug, warn};
use serde::Serialize;
use tpm_common_decoder::{ByteParseable, ByteReader, DecodeError, DecoderConfig, DEFAULT_MAX_SIPA_DEPTH};

use crate::sipa_type::{is_aggregation, sipa_kind, sipa_type_name, SipaKind};

/// Size of the `typeCode` and `length` fields
pub const SIPA_RECORD_HEADER_SIZE: usize = 8;

const SI_POLICY_PREFIX_SIZE: usize = 16;
const REVOCATION_LIST_PREFIX_SIZE: usize = 14;
const VSM_IDK_INFO_PREFIX_SIZE: usize = 16;

/// Code integrity policy measured at boot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiPolicy<'a> {
    pub version: u64,
    pub hash_alg_id: u16,
    pub name: String,
    #[serde(serialize_with = "tpm_common_decoder::hex_serde::serialize")]
    pub digest: &'a [u8],
}

/// Boot or OS revocation list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevocationList<'a> {
    pub creation_time: i64,
    pub hash_alg_id: u16,
    #[serde(serialize_with = "tpm_common_decoder::hex_serde::serialize")]
    pub digest: &'a [u8],
}

/// Public part of the VSM identity key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VsmIdkInfo<'a> {
    pub key_alg_id: u32,
    pub key_bits: u32,
    #[serde(serialize_with = "tpm_common_decoder::hex_serde::serialize")]
    pub public_exponent: &'a [u8],
    #[serde(serialize_with = "tpm_common_decoder::hex_serde::serialize")]
    pub modulus: &'a [u8],
}

/// The variable arrays after a structured prefix must fill the payload exactly.
fn ensure_exact_fit(
    reader: &ByteReader<'_>,
    start: usize,
    prefix_size: usize,
    lengths: &[usize],
    what: &str,
) -> Result<(), DecodeError> {
    let declared = lengths
        .iter()
        .try_fold(0usize, |total, length| total.checked_add(*length))
        .ok_or_else(|| DecodeError::malformed_payload(start, format!("{} lengths overflow", what)))?;
    if declared != reader.remaining() {
        return Err(DecodeError::malformed_payload(
            start,
            format!(
                "{} declares {} + {} bytes, payload has {}",
                what,
                prefix_size,
                declared,
                prefix_size + reader.remaining()
            ),
        ));
    }
    Ok(())
}

impl<'a> ByteParseable<'a> for SiPolicy<'a> {
    fn parse_from(reader: &mut ByteReader<'a>) -> Result<Self, DecodeError> {
        let start = reader.offset();
        let version = reader.read_u64()?;
        let name_length = reader.read_u16()? as usize;
        let hash_alg_id = reader.read_u16()?;
        let digest_length = reader.read_u32()? as usize;
        ensure_exact_fit(reader, start, SI_POLICY_PREFIX_SIZE, &[name_length, digest_length], "SiPolicy")?;

        Ok(Self {
            version,
            hash_alg_id,
            name: reader.read_utf16_string(name_length)?,
            digest: reader.read_slice(digest_length)?,
        })
    }
}

impl<'a> ByteParseable<'a> for RevocationList<'a> {
    fn parse_from(reader: &mut ByteReader<'a>) -> Result<Self, DecodeError> {
        let start = reader.offset();
        let creation_time = reader.read_i64()?;
        let digest_length = reader.read_u32()? as usize;
        let hash_alg_id = reader.read_u16()?;
        ensure_exact_fit(reader, start, REVOCATION_LIST_PREFIX_SIZE, &[digest_length], "RevocationList")?;

        Ok(Self {
            creation_time,
            hash_alg_id,
            digest: reader.read_slice(digest_length)?,
        })
    }
}

impl<'a> ByteParseable<'a> for VsmIdkInfo<'a> {
    fn parse_from(reader: &mut ByteReader<'a>) -> Result<Self, DecodeError> {
        let start = reader.offset();
        let key_alg_id = reader.read_u32()?;
        let key_bits = reader.read_u32()?;
        let exponent_length = reader.read_u32()? as usize;
        let modulus_length = reader.read_u32()? as usize;
        ensure_exact_fit(
            reader,
            start,
            VSM_IDK_INFO_PREFIX_SIZE,
            &[exponent_length, modulus_length],
            "VsmIdkInfo",
        )?;

        Ok(Self {
            key_alg_id,
            key_bits,
            public_exponent: reader.read_slice(exponent_length)?,
            modulus: reader.read_slice(modulus_length)?,
        })
    }
}

/// Decoded SIPA payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value")]
pub enum SipaPayload<'a> {
    Aggregation(Vec<SipaEvent<'a>>),
    Boolean(bool),
    UInt32(u32),
    UInt64(u64),
    Utf16String(String),
    SiPolicy(SiPolicy<'a>),
    VsmIdkInfo(VsmIdkInfo<'a>),
    RevocationList(RevocationList<'a>),
    Raw(#[serde(serialize_with = "tpm_common_decoder::hex_serde::serialize")] &'a [u8]),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SipaEvent<'a> {
    pub type_code: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'static str>,
    pub offset: usize,                  // Offset of the record header, or of the payload for a top-level decode
    pub payload: SipaPayload<'a>,
}

impl<'a> SipaEvent<'a> {
    fn new(type_code: u32, offset: usize, payload: SipaPayload<'a>) -> Self {
        Self {
            type_code,
            name: sipa_type_name(type_code),
            offset,
            payload,
        }
    }

    /// Children of an aggregation, empty for leaves.
    pub fn children(&self) -> &[SipaEvent<'a>] {
        match &self.payload {
            SipaPayload::Aggregation(children) => children,
            _ => &[],
        }
    }
}

struct SipaRecord<'a> {
    type_code: u32,
    offset: usize,
    payload_offset: usize,
    payload: &'a [u8],
}

impl<'a> SipaRecord<'a> {
    fn read(reader: &mut ByteReader<'a>) -> Result<Self, DecodeError> {
        let offset = reader.offset();
        let type_code = reader.read_u32()?;
        let length = reader.read_u32()? as usize;
        let payload_offset = reader.offset();
        let payload = reader.read_slice(length)?;
        Ok(Self { type_code, offset, payload_offset, payload })
    }
}

/// One open aggregation on the traversal stack
struct Frame<'a> {
    header: Option<(u32, usize)>,       // None for the top-level stream
    reader: ByteReader<'a>,
    children: Vec<SipaEvent<'a>>,
}

/// Decodes SIPA payloads into [`SipaEvent`] trees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SipaDecoder {
    max_depth: usize,
}

impl Default for SipaDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIPA_DEPTH)
    }
}

impl SipaDecoder {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn from_config(config: &DecoderConfig) -> Self {
        Self::new(config.max_sipa_depth)
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Decode one payload of type `type_code`.
    ///
    /// # Errors
    /// * `DecodeError::MalformedPayload` - If a nested length overruns its parent, an aggregation is
    ///   not consumed exactly, or a structured payload's lengths do not add up
    /// * `DecodeError::RecursionLimitExceeded` - If aggregations nest deeper than `max_depth`
    pub fn decode<'a>(&self, bytes: &'a [u8], type_code: u32) -> Result<SipaEvent<'a>, DecodeError> {
        self.decode_at(bytes, type_code, 0)
    }

    /// Like [`decode`](Self::decode) for a payload located at `base_offset` of an outer buffer.
    pub fn decode_at<'a>(
        &self,
        bytes: &'a [u8],
        type_code: u32,
        base_offset: usize,
    ) -> Result<SipaEvent<'a>, DecodeError> {
        if is_aggregation(type_code) {
            if self.max_depth == 0 {
                return Err(DecodeError::RecursionLimitExceeded { offset: base_offset, limit: self.max_depth });
            }
            let children = self.walk(bytes, base_offset, 1)?;
            return Ok(SipaEvent::new(type_code, base_offset, SipaPayload::Aggregation(children)));
        }
        let payload = Self::decode_leaf(type_code, bytes, base_offset)?;
        Ok(SipaEvent::new(type_code, base_offset, payload))
    }

    /// Decode a stream of records that fills `bytes` exactly, as carried by `EV_EVENT_TAG`.
    pub fn decode_stream<'a>(&self, bytes: &'a [u8], base_offset: usize) -> Result<Vec<SipaEvent<'a>>, DecodeError> {
        self.walk(bytes, base_offset, 0)
    }

    /// Iterative traversal; `root_depth` is the nesting depth of the records' container.
    fn walk<'a>(&self, bytes: &'a [u8], base_offset: usize, root_depth: usize) -> Result<Vec<SipaEvent<'a>>, DecodeError> {
        let mut stack = vec![Frame {
            header: None,
            reader: ByteReader::with_base_offset(bytes, base_offset),
            children: Vec::new(),
        }];

        while let Some(frame) = stack.last_mut() {
            if frame.reader.is_end() {
                let Some(finished) = stack.pop() else { break };
                match (finished.header, stack.last_mut()) {
                    (Some((type_code, offset)), Some(parent)) => {
                        parent.children.push(SipaEvent::new(
                            type_code,
                            offset,
                            SipaPayload::Aggregation(finished.children),
                        ));
                    }
                    _ => return Ok(finished.children),
                }
                continue;
            }

            let record = SipaRecord::read(&mut frame.reader).map_err(DecodeError::into_malformed_payload)?;
            if is_aggregation(record.type_code) {
                let depth = root_depth + stack.len();
                if depth > self.max_depth {
                    return Err(DecodeError::RecursionLimitExceeded { offset: record.offset, limit: self.max_depth });
                }
                debug!("SIPA aggregation 0x{:08X} at offset {}, depth {}", record.type_code, record.offset, depth);
                stack.push(Frame {
                    header: Some((record.type_code, record.offset)),
                    reader: ByteReader::with_base_offset(record.payload, record.payload_offset),
                    children: Vec::new(),
                });
            } else {
                let payload = Self::decode_leaf(record.type_code, record.payload, record.payload_offset)?;
                frame.children.push(SipaEvent::new(record.type_code, record.offset, payload));
            }
        }
        Ok(Vec::new())
    }

    fn decode_leaf<'a>(type_code: u32, payload: &'a [u8], offset: usize) -> Result<SipaPayload<'a>, DecodeError> {
        let kind = sipa_kind(type_code);
        if let Some(width) = kind.fixed_width() {
            if payload.len() != width {
                warn!(
                    "SIPA 0x{:08X} at offset {} has {} bytes, expected {}; keeping raw bytes",
                    type_code,
                    offset,
                    payload.len(),
                    width
                );
                return Ok(SipaPayload::Raw(payload));
            }
        }

        let mut reader = ByteReader::with_base_offset(payload, offset);
        let value = match kind {
            SipaKind::Boolean => SipaPayload::Boolean(reader.read_u8()? != 0),
            SipaKind::UInt32 => SipaPayload::UInt32(reader.read_u32()?),
            SipaKind::UInt64 => SipaPayload::UInt64(reader.read_u64()?),
            SipaKind::Utf16String => SipaPayload::Utf16String(reader.read_ucs2_string()),
            SipaKind::SiPolicy => SipaPayload::SiPolicy(
                SiPolicy::parse_from(&mut reader).map_err(DecodeError::into_malformed_payload)?,
            ),
            SipaKind::RevocationList => SipaPayload::RevocationList(
                RevocationList::parse_from(&mut reader).map_err(DecodeError::into_malformed_payload)?,
            ),
            SipaKind::VsmIdkInfo => SipaPayload::VsmIdkInfo(
                VsmIdkInfo::parse_from(&mut reader).map_err(DecodeError::into_malformed_payload)?,
            ),
            SipaKind::Aggregation | SipaKind::Raw => SipaPayload::Raw(payload),
        };
        Ok(value)
    }
}
