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

#![allow(dead_code)]

use openssl::hash::{hash, MessageDigest};
use tpm_blob_decoder::PLATFORM_ATTESTATION_MAGIC_V2;
use tpm_common_decoder::DigestAlgorithm;

pub fn digest(algorithm: DigestAlgorithm, data: &[u8]) -> Vec<u8> {
    let md = match algorithm {
        DigestAlgorithm::Sha1 => MessageDigest::sha1(),
        DigestAlgorithm::Sha256 => MessageDigest::sha256(),
    };
    hash(md, data).unwrap().to_vec()
}

/// Encode one TCG log record
pub fn log_record(pcr_index: u32, event_type: u32, digest: &[u8], data: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&pcr_index.to_le_bytes());
    bytes.extend_from_slice(&event_type.to_le_bytes());
    bytes.extend_from_slice(digest);
    bytes.extend_from_slice(&(data.len() as u32).to_le_bytes());
    bytes.extend_from_slice(data);
    bytes
}

/// Encode a record whose digest is the hash of its own data
pub fn measured_record(algorithm: DigestAlgorithm, pcr_index: u32, event_type: u32, data: &[u8]) -> Vec<u8> {
    log_record(pcr_index, event_type, &digest(algorithm, data), data)
}

/// Encode one SIPA record
pub fn sipa_record(type_code: u32, payload: &[u8]) -> Vec<u8> {
    let mut bytes = type_code.to_le_bytes().to_vec();
    bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

/// `depth` aggregations nested inside each other, the innermost one empty
///
/// Built in place rather than by repeated wrapping so large depths stay cheap.
pub fn nested_aggregations(type_code: u32, depth: usize) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(depth * 8);
    for level in 0..depth {
        let length = (depth - 1 - level) * 8;
        bytes.extend_from_slice(&type_code.to_le_bytes());
        bytes.extend_from_slice(&(length as u32).to_le_bytes());
    }
    bytes
}

pub fn utf16(text: &str) -> Vec<u8> {
    text.encode_utf16().chain(std::iter::once(0)).flat_map(u16::to_le_bytes).collect()
}

/// Replay `(pcr_index, digest)` pairs with openssl, independent of the decoder
pub fn replay(algorithm: DigestAlgorithm, extends: &[(usize, Vec<u8>)]) -> Vec<Vec<u8>> {
    let size = algorithm.digest_size();
    let mut pcrs: Vec<Vec<u8>> = (0..24)
        .map(|index| if (17..=22).contains(&index) { vec![0xFF; size] } else { vec![0; size] })
        .collect();
    for (index, value) in extends {
        let input = [pcrs[*index].clone(), value.clone()].concat();
        pcrs[*index] = digest(algorithm, &input);
    }
    pcrs
}

/// Platform attestation blob, V2 layout
pub fn platform_blob_v2(pcr_alg_id: u32, pcrs: &[u8], quote: &[u8], signature: &[u8], log: &[u8]) -> Vec<u8> {
    let mut blob = Vec::new();
    for word in [
        PLATFORM_ATTESTATION_MAGIC_V2,
        2,
        32,
        pcrs.len() as u32,
        quote.len() as u32,
        signature.len() as u32,
        log.len() as u32,
        pcr_alg_id,
    ] {
        blob.extend_from_slice(&word.to_le_bytes());
    }
    for section in [pcrs, quote, signature, log] {
        blob.extend_from_slice(section);
    }
    blob
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
