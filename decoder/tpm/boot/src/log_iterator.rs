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

//! TCG log framing
//!
//! [`LogIterator`] walks a raw log buffer record by record:
//! `pcrIndex:u32, eventType:u32, digest[algSize], eventDataSize:u32, eventData[eventDataSize]`,
//! all integers little-endian. Records are yielded lazily and borrow the caller's buffer.

use log::debug;
use tpm_common_decoder::{ByteReader, DecodeError, DigestAlgorithm};

use crate::event_type::{EventType, LogEvent};

/// Bytes of a record before its event data, excluding the digest
const RECORD_FIXED_SIZE: usize = 12;

/// Forward-only, finite iterator over the records of one log
///
/// After the first error the iterator is exhausted; build a new one to start over.
pub struct LogIterator<'a> {
    reader: ByteReader<'a>,
    algorithm: DigestAlgorithm,
    event_number: u32,
    failed: bool,
}

impl<'a> LogIterator<'a> {
    pub fn new(buffer: &'a [u8], algorithm: DigestAlgorithm) -> Self {
        Self::with_base_offset(buffer, algorithm, 0)
    }

    /// Iterate a log embedded at `base_offset` of an outer buffer, reporting absolute offsets.
    pub fn with_base_offset(buffer: &'a [u8], algorithm: DigestAlgorithm, base_offset: usize) -> Self {
        Self {
            reader: ByteReader::with_base_offset(buffer, base_offset),
            algorithm,
            event_number: 0,
            failed: false,
        }
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Bytes of the buffer consumed by the records yielded so far.
    pub fn consumed(&self) -> usize {
        self.reader.position()
    }

    /// Smallest possible record: the fixed fields plus one digest.
    pub fn min_record_size(&self) -> usize {
        RECORD_FIXED_SIZE + self.algorithm.digest_size()
    }

    fn read_record(&mut self) -> Result<LogEvent<'a>, DecodeError> {
        let offset = self.reader.offset();
        let min_size = self.min_record_size();
        if self.reader.remaining() < min_size {
            return Err(DecodeError::malformed_log(
                offset,
                format!(
                    "Record header needs {} bytes, {} bytes remain",
                    min_size,
                    self.reader.remaining()
                ),
            ));
        }

        let pcr_index = self.reader.read_u32()?;
        let event_type = EventType::from_u32(self.reader.read_u32()?);
        let digest = self.reader.read_slice(self.algorithm.digest_size())?;

        let size_offset = self.reader.offset();
        let event_size = self.reader.read_u32()? as usize;
        if event_size > self.reader.remaining() {
            return Err(DecodeError::malformed_log(
                size_offset,
                format!(
                    "Event size {} exceeds remaining data {}, event_number: {}, event_type: {}",
                    event_size,
                    self.reader.remaining(),
                    self.event_number,
                    event_type
                ),
            ));
        }
        let event_data = self.reader.read_slice(event_size)?;

        let event = LogEvent {
            event_number: self.event_number,
            offset,
            size: self.reader.offset() - offset,
            pcr_index,
            event_type,
            digest,
            event_data,
        };
        debug!(
            "Event {} at offset {}: PCR {}, {}, {} bytes of data",
            event.event_number, offset, pcr_index, event_type, event_size
        );
        Ok(event)
    }
}

impl<'a> Iterator for LogIterator<'a> {
    type Item = Result<LogEvent<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.reader.is_end() {
            return None;
        }
        match self.read_record() {
            Ok(event) => {
                self.event_number = self.event_number.saturating_add(1);
                Some(Ok(event))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e.into_malformed_log()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pcr_index: u32, event_type: u32, digest: &[u8], data: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&pcr_index.to_le_bytes());
        bytes.extend_from_slice(&event_type.to_le_bytes());
        bytes.extend_from_slice(digest);
        bytes.extend_from_slice(&(data.len() as u32).to_le_bytes());
        bytes.extend_from_slice(data);
        bytes
    }

    #[test]
    fn test_zero_length_event_data() {
        let buffer = record(7, 0x80000007, &[0xAB; 32], &[]);
        let events: Vec<_> = LogIterator::new(&buffer, DigestAlgorithm::Sha256).collect();
        assert_eq!(events.len(), 1);
        let event = events[0].as_ref().unwrap();
        assert_eq!(event.pcr_index, 7);
        assert_eq!(event.event_type, EventType::EvEfiAction);
        assert!(event.event_data.is_empty());
        assert_eq!(event.size, buffer.len());
    }

    #[test]
    fn test_short_header_is_malformed_log() {
        let mut buffer = record(0, 4, &[0u8; 20], &[0u8; 4]);
        buffer.extend_from_slice(&[1, 2, 3]);
        let mut iter = LogIterator::new(&buffer, DigestAlgorithm::Sha1);
        assert!(iter.next().unwrap().is_ok());
        let err = iter.next().unwrap().unwrap_err();
        assert_eq!(err, DecodeError::MalformedLog {
            offset: 36,
            reason: "Record header needs 32 bytes, 3 bytes remain".to_string(),
        });
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_base_offset_is_reported() {
        let buffer = record(0, 4, &[0u8; 20], &[0u8; 4]);
        let event = LogIterator::with_base_offset(&buffer, DigestAlgorithm::Sha1, 100)
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(event.offset, 100);
    }
}
