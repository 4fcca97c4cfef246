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

use tpm_blob_decoder::{KEY_ATTESTATION_MAGIC, PCP_KEY_MAGIC, PLATFORM_ATTESTATION_MAGIC, PLATFORM_ATTESTATION_MAGIC_V2};

/// Build a container: `magic`, `discriminant`, `headerSize`, the header words, then the
/// sections in order.
///
/// # Parameters
/// * `magic` - Leading magic constant
/// * `discriminant` - Platform version or pcpType
/// * `header_prefix` - Header words placed between `headerSize` and the section sizes
/// * `sections` - Section payloads, in declaration order
/// * `header_suffix` - Header words placed after the section sizes
pub fn build_container(
    magic: u32,
    discriminant: u32,
    header_prefix: &[u32],
    sections: &[&[u8]],
    header_suffix: &[u32],
) -> Vec<u8> {
    let header_size = 12 + 4 * (header_prefix.len() + sections.len() + header_suffix.len());
    let mut buffer = Vec::new();
    buffer.extend_from_slice(&magic.to_le_bytes());
    buffer.extend_from_slice(&discriminant.to_le_bytes());
    buffer.extend_from_slice(&(header_size as u32).to_le_bytes());
    for word in header_prefix {
        buffer.extend_from_slice(&word.to_le_bytes());
    }
    for section in sections {
        buffer.extend_from_slice(&(section.len() as u32).to_le_bytes());
    }
    for word in header_suffix {
        buffer.extend_from_slice(&word.to_le_bytes());
    }
    for section in sections {
        buffer.extend_from_slice(section);
    }
    buffer
}

/// Platform attestation blob, V1 layout
pub fn build_platform_v1(platform: u32, pcrs: &[u8], quote: &[u8], signature: &[u8], log: &[u8]) -> Vec<u8> {
    build_container(PLATFORM_ATTESTATION_MAGIC, platform, &[], &[pcrs, quote, signature, log], &[])
}

/// Platform attestation blob, V2 layout carrying `pcr_alg_id`
pub fn build_platform_v2(
    platform: u32,
    pcr_alg_id: u32,
    pcrs: &[u8],
    quote: &[u8],
    signature: &[u8],
    log: &[u8],
) -> Vec<u8> {
    build_container(PLATFORM_ATTESTATION_MAGIC_V2, platform, &[], &[pcrs, quote, signature, log], &[pcr_alg_id])
}

/// TPM1.2 key blob
pub fn build_key_blob_tpm12(flags: u32, tpm_key: &[u8]) -> Vec<u8> {
    build_container(PCP_KEY_MAGIC, 1, &[flags], &[tpm_key], &[])
}

/// TPM2.0 key blob; a `pcr_alg_id` selects the 56-byte layout
pub fn build_key_blob_tpm20(flags: u32, sections: &[&[u8]; 9], pcr_alg_id: Option<u16>) -> Vec<u8> {
    let suffix: Vec<u32> = pcr_alg_id.map(|id| vec![id as u32]).unwrap_or_default();
    build_container(PCP_KEY_MAGIC, 2, &[flags], sections, &suffix)
}

/// Key attestation blob
pub fn build_key_attestation(platform: u32, key_attest: &[u8], signature: &[u8], key_blob: &[u8]) -> Vec<u8> {
    build_container(KEY_ATTESTATION_MAGIC, platform, &[], &[key_attest, signature, key_blob], &[])
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
