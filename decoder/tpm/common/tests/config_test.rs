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

use std::str::FromStr;
use tpm_common_decoder::{DecodeError, DecoderConfig, DigestAlgorithm, DEFAULT_MAX_BUFFER_SIZE};

#[test]
fn test_config_defaults_from_empty_document() {
    let config = DecoderConfig::from_yaml_str("{}").unwrap();
    assert_eq!(config, DecoderConfig::default());
    assert_eq!(config.max_buffer_size, DEFAULT_MAX_BUFFER_SIZE);
}

#[test]
fn test_config_overrides() {
    let yaml = "max_sipa_depth: 4\nmax_buffer_size: 1024\nverify_integrity: false\n";
    let config = DecoderConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.max_sipa_depth, 4);
    assert_eq!(config.max_buffer_size, 1024);
    assert!(!config.verify_integrity);
    assert!(config.check_size(1024).is_ok());
    assert_eq!(
        config.check_size(1025),
        Err(DecodeError::Oversized { size: 1025, limit: 1024 })
    );
}

#[test]
fn test_config_rejects_zero_depth() {
    let result = DecoderConfig::from_yaml_str("max_sipa_depth: 0\n");
    assert!(matches!(result, Err(DecodeError::Config(_))));
}

#[test]
fn test_config_rejects_invalid_yaml() {
    let result = DecoderConfig::from_yaml_str("max_sipa_depth: [1, 2]\n");
    assert!(matches!(result, Err(DecodeError::Config(_))));
}

#[test]
fn test_algorithm_lookup() {
    assert_eq!(DigestAlgorithm::from_alg_id(0x0004, 0).unwrap(), DigestAlgorithm::Sha1);
    assert_eq!(DigestAlgorithm::from_alg_id(0x000B, 0).unwrap(), DigestAlgorithm::Sha256);
    assert_eq!(
        DigestAlgorithm::from_alg_id(0x000C, 28),
        Err(DecodeError::UnsupportedAlgorithm { offset: 28, alg_id: 0x000C })
    );
    assert_eq!(DigestAlgorithm::from_digest_size(32, 0).unwrap(), DigestAlgorithm::Sha256);
    assert!(DigestAlgorithm::from_digest_size(48, 0).is_err());
    assert_eq!(DigestAlgorithm::from_str("SHA256").unwrap(), DigestAlgorithm::Sha256);
    assert_eq!(DigestAlgorithm::Sha1.to_string(), "sha1");
}
