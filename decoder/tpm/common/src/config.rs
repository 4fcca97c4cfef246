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

//! Decoder configuration.
//!
//! Limits that bound the work done on untrusted input. Loaded from YAML the same way the
//! agent configuration is, with every field optional.

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Default maximum nesting depth of SIPA aggregations
pub const DEFAULT_MAX_SIPA_DEPTH: usize = 64;
/// Default maximum input size, 5MB
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    pub max_sipa_depth: usize,     // Deepest SIPA aggregation accepted
    pub max_buffer_size: usize,    // Largest log or blob accepted, in bytes
    pub verify_integrity: bool,    // Recompute event digests while decoding
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_sipa_depth: DEFAULT_MAX_SIPA_DEPTH,
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            verify_integrity: true,
        }
    }
}

impl DecoderConfig {
    /// Parse and validate a YAML document
    ///
    /// # Example
    /// ```
    /// use tpm_common_decoder::DecoderConfig;
    ///
    /// let config = DecoderConfig::from_yaml_str("max_sipa_depth: 8\n").unwrap();
    /// assert_eq!(config.max_sipa_depth, 8);
    /// assert!(config.verify_integrity);
    /// ```
    pub fn from_yaml_str(yaml: &str) -> Result<Self, DecodeError> {
        let config: DecoderConfig = serde_yaml::from_str(yaml)
            .map_err(|e| DecodeError::Config(format!("Failed to parse decoder config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DecodeError> {
        if self.max_sipa_depth == 0 {
            return Err(DecodeError::Config("max_sipa_depth must be at least 1".to_string()));
        }
        if self.max_buffer_size == 0 {
            return Err(DecodeError::Config("max_buffer_size must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Reject buffers larger than `max_buffer_size`.
    pub fn check_size(&self, size: usize) -> Result<(), DecodeError> {
        if size > self.max_buffer_size {
            return Err(DecodeError::Oversized { size, limit: self.max_buffer_size });
        }
        Ok(())
    }
}
