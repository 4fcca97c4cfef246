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

mod algorithm;
mod byte_reader;
mod config;
mod crypto_utils;
mod error;
mod pcr;
pub mod hex_serde;

pub use algorithm::{DigestAlgorithm, TPM_ALG_SHA1, TPM_ALG_SHA256, SHA1_DIGEST_SIZE, SHA256_DIGEST_SIZE};
pub use byte_reader::{ByteReader, ByteParseable, decode_utf16_nul_terminated};
pub use config::{DecoderConfig, DEFAULT_MAX_SIPA_DEPTH, DEFAULT_MAX_BUFFER_SIZE};
pub use crypto_utils::{HashProvider, OpenSslHashProvider};
pub use error::DecodeError;
pub use pcr::{PcrBank, PcrReplayEngine, PcrValueEntry, PCR_COUNT, PCR_INDEX_NONE};
