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

//! PCR bank model and replay engine.
//!
//! The engine reconstructs simulated PCR values by applying TPM extend semantics
//! (`PCR_new = Hash(PCR_old || digest)`) to digests taken from a measurement log.
//! # Examples
//! ```
//! use tpm_common_decoder::{DigestAlgorithm, OpenSslHashProvider, PcrReplayEngine};
//!
//! let provider = OpenSslHashProvider;
//! let mut engine = PcrReplayEngine::new(DigestAlgorithm::Sha1, &provider);
//! engine.extend(0, &[0u8; 20]).unwrap();
//! let bank = engine.snapshot();
//! assert_eq!(bank.get(0).unwrap().len(), 20);
//! ```

use log::debug;
use serde::{Serialize, Serializer};

use crate::algorithm::DigestAlgorithm;
use crate::crypto_utils::HashProvider;
use crate::error::DecodeError;

/// Number of PCRs in a bank
pub const PCR_COUNT: usize = 24;
/// PCR index used by log-only events that are never extended
pub const PCR_INDEX_NONE: u32 = 0xFFFF_FFFF;

// TPM1.2 resettable PCRs start at all-ones
const RESETTABLE_PCR_FIRST: usize = 17;
const RESETTABLE_PCR_LAST: usize = 22;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PcrValueEntry {
    pub pcr_index: u32,
    pub pcr_value: String,
}

/// A full bank of 24 PCR accumulators of one digest algorithm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcrBank {
    algorithm: DigestAlgorithm,
    registers: Vec<Vec<u8>>,
}

impl PcrBank {
    /// Bank in its power-on state: 0-16 and 23 all-zero, 17-22 all-0xFF.
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        let registers = (0..PCR_COUNT)
            .map(|index| Self::initial_value(algorithm, index))
            .collect();
        Self { algorithm, registers }
    }

    pub fn initial_value(algorithm: DigestAlgorithm, index: usize) -> Vec<u8> {
        let fill = if (RESETTABLE_PCR_FIRST..=RESETTABLE_PCR_LAST).contains(&index) {
            0xFF
        } else {
            0x00
        };
        vec![fill; algorithm.digest_size()]
    }

    /// Rebuild a bank from 24 concatenated PCR values, as carried in an attestation blob.
    ///
    /// # Errors
    /// * `DecodeError::MalformedPayload` - If `bytes` is not exactly 24 digests long
    pub fn from_bytes(algorithm: DigestAlgorithm, bytes: &[u8], offset: usize) -> Result<Self, DecodeError> {
        let size = algorithm.digest_size();
        let expected = PCR_COUNT * size;
        if bytes.len() != expected {
            return Err(DecodeError::malformed_payload(
                offset,
                format!("PCR values of {} bytes, expected {} for {}", bytes.len(), expected, algorithm),
            ));
        }
        let registers = bytes.chunks_exact(size).map(<[u8]>::to_vec).collect();
        Ok(Self { algorithm, registers })
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    pub fn get(&self, index: u32) -> Option<&[u8]> {
        self.registers.get(index as usize).map(Vec::as_slice)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.registers.concat()
    }

    /// Indices whose values differ between the two banks.
    ///
    /// Banks of different algorithms differ at every index.
    pub fn mismatched_indices(&self, other: &PcrBank) -> Vec<u32> {
        (0..PCR_COUNT as u32)
            .filter(|index| self.algorithm != other.algorithm || self.get(*index) != other.get(*index))
            .collect()
    }

    pub fn entries(&self) -> Vec<PcrValueEntry> {
        self.registers
            .iter()
            .enumerate()
            .map(|(index, value)| PcrValueEntry {
                pcr_index: index as u32,
                pcr_value: hex::encode(value),
            })
            .collect()
    }

    fn set(&mut self, index: usize, value: Vec<u8>) {
        if let Some(register) = self.registers.get_mut(index) {
            *register = value;
        }
    }
}

impl Serialize for PcrBank {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        #[derive(Serialize)]
        struct Bank<'b> {
            hash_alg: &'b str,
            pcr_values: Vec<PcrValueEntry>,
        }
        Bank { hash_alg: self.algorithm.name(), pcr_values: self.entries() }.serialize(serializer)
    }
}

/// Replays extend operations into a fresh [`PcrBank`]
pub struct PcrReplayEngine<'h> {
    bank: PcrBank,
    provider: &'h dyn HashProvider,
    extended: [bool; PCR_COUNT],
}

impl<'h> PcrReplayEngine<'h> {
    pub fn new(algorithm: DigestAlgorithm, provider: &'h dyn HashProvider) -> Self {
        Self {
            bank: PcrBank::new(algorithm),
            provider,
            extended: [false; PCR_COUNT],
        }
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.bank.algorithm
    }

    /// Apply the TPM 2.0 startup locality to PCR 0: `00..00 || locality`.
    ///
    /// Only honoured before PCR 0 has been extended. Returns whether it was applied.
    pub fn set_startup_locality(&mut self, locality: u8) -> bool {
        if self.extended[0] {
            return false;
        }
        let mut value = vec![0u8; self.bank.algorithm.digest_size()];
        if let Some(last) = value.last_mut() {
            *last = locality;
        }
        self.bank.set(0, value);
        true
    }

    /// `bank[pcr_index] = Hash(bank[pcr_index] || digest)`.
    ///
    /// Sentinel and out-of-range indices are informational and leave the bank untouched.
    ///
    /// # Errors
    /// * `DecodeError::DigestWidth` - If `digest` is not one digest of the bank's algorithm wide
    /// * `DecodeError::HashFailure` - If the hash provider fails
    pub fn extend(&mut self, pcr_index: u32, digest: &[u8]) -> Result<(), DecodeError> {
        let index = pcr_index as usize;
        if pcr_index == PCR_INDEX_NONE || index >= PCR_COUNT {
            debug!("Skipping extend of informational PCR index 0x{:08X}", pcr_index);
            return Ok(());
        }
        let algorithm = self.bank.algorithm;
        if digest.len() != algorithm.digest_size() {
            return Err(DecodeError::DigestWidth { expected: algorithm.digest_size(), actual: digest.len() });
        }

        let mut input = Vec::with_capacity(algorithm.digest_size() * 2);
        input.extend_from_slice(&self.bank.registers[index]);
        input.extend_from_slice(digest);
        let value = self.provider.hash(algorithm, &input)?;
        if value.len() != algorithm.digest_size() {
            return Err(DecodeError::HashFailure(format!(
                "Hash provider returned {} bytes for {}",
                value.len(),
                algorithm
            )));
        }
        self.bank.set(index, value);
        self.extended[index] = true;
        Ok(())
    }

    /// Read-only copy of the current bank.
    pub fn snapshot(&self) -> PcrBank {
        self.bank.clone()
    }

    pub fn into_bank(self) -> PcrBank {
        self.bank
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto_utils::MockHashProvider;

    #[test]
    fn test_extend_skips_sentinel_without_hashing() {
        let mut provider = MockHashProvider::new();
        provider.expect_hash().times(0);
        let mut engine = PcrReplayEngine::new(DigestAlgorithm::Sha1, &provider);
        engine.extend(PCR_INDEX_NONE, &[0u8; 20]).unwrap();
        engine.extend(24, &[0u8; 20]).unwrap();
        assert_eq!(engine.snapshot(), PcrBank::new(DigestAlgorithm::Sha1));
    }

    #[test]
    fn test_extend_feeds_old_value_then_digest() {
        let mut provider = MockHashProvider::new();
        provider
            .expect_hash()
            .withf(|alg, data| *alg == DigestAlgorithm::Sha1 && data.len() == 40 && data[..20] == [0xFF; 20] && data[20..] == [0x11; 20])
            .times(1)
            .returning(|_, _| Ok(vec![0x22; 20]));
        let mut engine = PcrReplayEngine::new(DigestAlgorithm::Sha1, &provider);
        engine.extend(17, &[0x11; 20]).unwrap();
        assert_eq!(engine.snapshot().get(17).unwrap(), &[0x22; 20]);
    }

    #[test]
    fn test_extend_rejects_short_provider_output() {
        let mut provider = MockHashProvider::new();
        provider.expect_hash().returning(|_, _| Ok(vec![0u8; 3]));
        let mut engine = PcrReplayEngine::new(DigestAlgorithm::Sha256, &provider);
        let err = engine.extend(0, &[0u8; 32]).unwrap_err();
        assert!(matches!(err, DecodeError::HashFailure(_)));
    }

    #[test]
    fn test_startup_locality_only_before_first_extend() {
        let mut provider = MockHashProvider::new();
        provider.expect_hash().returning(|_, _| Ok(vec![0x01; 32]));
        let mut engine = PcrReplayEngine::new(DigestAlgorithm::Sha256, &provider);
        assert!(engine.set_startup_locality(3));
        let mut expected = vec![0u8; 32];
        expected[31] = 3;
        assert_eq!(engine.snapshot().get(0).unwrap(), expected.as_slice());
        engine.extend(0, &[0u8; 32]).unwrap();
        assert!(!engine.set_startup_locality(4));
    }
}
