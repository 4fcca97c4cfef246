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

mod utils;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tpm_boot_decoder::{
    EventLog, EventType, IntegrityStatus, LogIterator, SipaPayload, STARTUP_LOCALITY_SIGNATURE,
};
use tpm_common_decoder::{DecodeError, DecoderConfig, DigestAlgorithm, OpenSslHashProvider};
use utils::{digest, init_logger, log_record, measured_record, replay, sipa_record};

const EV_NO_ACTION: u32 = 0x0000_0003;
const EV_SEPARATOR: u32 = 0x0000_0004;
const EV_EVENT_TAG: u32 = 0x0000_0006;
const EV_EFI_ACTION: u32 = 0x8000_0007;
const EV_EFI_BOOT_SERVICES_APPLICATION: u32 = 0x8000_0003;

/// Test Objective: Verify a single EV_SEPARATOR record over four zero bytes
/// Expected Result: Exactly one event, integrity Matched, PCR 0 extended once
#[test]
fn test_single_separator_event_matches() {
    init_logger();
    let sha1 = DigestAlgorithm::Sha1;
    let separator_digest = digest(sha1, &[0u8; 4]);
    let buffer = log_record(0, EV_SEPARATOR, &separator_digest, &[0u8; 4]);

    let log = EventLog::decode(&buffer, sha1, &OpenSslHashProvider, &DecoderConfig::default()).unwrap();
    assert_eq!(log.len(), 1);
    let event = &log.events()[0];
    assert_eq!(event.event.pcr_index, 0);
    assert_eq!(event.event.event_type, EventType::EvSeparator);
    assert_eq!(event.event.digest, separator_digest.as_slice());
    assert_eq!(event.event.event_data, &[0u8; 4]);
    assert_eq!(event.integrity, Some(IntegrityStatus::Matched));
    assert!(event.digest_covers_event_data);
    assert!(!event.is_suspicious());

    let expected = replay(sha1, &[(0, separator_digest)]);
    assert_eq!(log.replayed().get(0).unwrap(), expected[0].as_slice());
    assert_eq!(log.replayed().get(1).unwrap(), [0u8; 20].as_slice());
}

/// Test Objective: Verify the consumed bytes of all records add up to the buffer length
/// Expected Result: Sum of record sizes and the iterator's consumed count equal the buffer length
#[test]
fn test_consumed_bytes_cover_buffer() {
    let sha256 = DigestAlgorithm::Sha256;
    let buffer = [
        measured_record(sha256, 0, EV_SEPARATOR, &[0u8; 4]),
        measured_record(sha256, 4, EV_EFI_ACTION, b"Calling EFI Application from Boot Option"),
        log_record(5, 0x1234_5678, &[0x11; 32], &[]),
        log_record(0xFFFF_FFFF, EV_NO_ACTION, &[0u8; 32], &[0xAA; 17]),
    ]
    .concat();

    let mut iter = LogIterator::new(&buffer, sha256);
    let mut total = 0;
    let mut expected_offset = 0;
    for item in iter.by_ref() {
        let event = item.unwrap();
        assert_eq!(event.offset, expected_offset);
        expected_offset += event.size;
        total += event.size;
    }
    assert_eq!(total, buffer.len());
    assert_eq!(iter.consumed(), buffer.len());
    assert!(iter.next().is_none());
}

/// Test Objective: Verify unknown event types are preserved
/// Expected Result: The raw code survives and the name shows it
#[test]
fn test_unknown_event_type_is_not_an_error() {
    let buffer = log_record(5, 0x1234_5678, &[0x11; 20], b"future");
    let log = EventLog::decode(&buffer, DigestAlgorithm::Sha1, &OpenSslHashProvider, &DecoderConfig::default()).unwrap();
    let event = &log.events()[0];
    assert_eq!(event.event.event_type, EventType::Unknown(0x1234_5678));
    assert_eq!(event.integrity, Some(IntegrityStatus::Mismatched));
    assert!(!event.digest_covers_event_data);
    assert_eq!(log.suspicious_events().count(), 0);
}

/// Test Objective: Verify an eventDataSize past the end of the buffer
/// Expected Result: MalformedLog at the size field, earlier events still yielded
#[test]
fn test_event_size_past_end_is_malformed_log() {
    let sha1 = DigestAlgorithm::Sha1;
    let first = measured_record(sha1, 0, EV_SEPARATOR, &[0u8; 4]);
    let mut second = measured_record(sha1, 1, EV_EFI_ACTION, b"action");
    // eventDataSize sits after pcrIndex, eventType and the digest
    second[28..32].copy_from_slice(&7u32.to_le_bytes());
    let buffer = [first.clone(), second].concat();

    let mut iter = LogIterator::new(&buffer, sha1);
    assert!(iter.next().unwrap().is_ok());
    match iter.next().unwrap() {
        Err(DecodeError::MalformedLog { offset, .. }) => assert_eq!(offset, first.len() + 28),
        other => panic!("unexpected {:?}", other),
    }
    assert!(iter.next().is_none());

    let err = EventLog::decode(&buffer, sha1, &OpenSslHashProvider, &DecoderConfig::default()).unwrap_err();
    assert!(matches!(err, DecodeError::MalformedLog { .. }), "{:?}", err);
}

/// Test Objective: Verify randomly corrupted logs never panic or read out of bounds
/// Expected Result: Every event yielded lies inside the buffer, errors are MalformedLog
#[test]
fn test_random_corruption_never_panics() {
    let sha256 = DigestAlgorithm::Sha256;
    let seed_log = [
        measured_record(sha256, 0, EV_SEPARATOR, &[0u8; 4]),
        measured_record(sha256, 7, EV_EFI_ACTION, b"Exit Boot Services Invocation"),
        log_record(12, EV_EVENT_TAG, &[0u8; 32], &sipa_record(0x4001_0001, &sipa_record(0x0003_0001, &[1]))),
        measured_record(sha256, 4, EV_EFI_BOOT_SERVICES_APPLICATION, &[0x5A; 64]),
    ]
    .concat();
    let config = DecoderConfig::default();
    let mut rng = StdRng::seed_from_u64(0x5443_4731);

    for _ in 0..2000 {
        let mut buffer = seed_log.clone();
        for _ in 0..rng.gen_range(1..4) {
            // Aim at length fields as often as at arbitrary bytes
            let index = rng.gen_range(0..buffer.len());
            let value: u32 = if rng.gen_bool(0.5) { rng.gen() } else { rng.gen_range(0..256) };
            let end = (index + 4).min(buffer.len());
            buffer[index..end].copy_from_slice(&value.to_le_bytes()[..end - index]);
        }
        let cut = rng.gen_range(0..=buffer.len());
        buffer.truncate(cut);

        for item in LogIterator::new(&buffer, sha256) {
            match item {
                Ok(event) => assert!(event.offset + event.size <= buffer.len()),
                Err(e) => assert!(matches!(e, DecodeError::MalformedLog { .. }), "{:?}", e),
            }
        }
        let _ = EventLog::decode(&buffer, sha256, &OpenSslHashProvider, &config);
    }
}

/// Test Objective: Verify the startup locality event seeds PCR 0 and is never extended
/// Expected Result: PCR 0 starts at 00..03, EV_NO_ACTION leaves its PCR untouched
#[test]
fn test_startup_locality_sets_pcr0() {
    let sha256 = DigestAlgorithm::Sha256;
    let mut locality_data = STARTUP_LOCALITY_SIGNATURE.to_vec();
    locality_data.push(3);
    let crtm_digest = vec![0x42u8; 32];
    let buffer = [
        log_record(0, EV_NO_ACTION, &[0u8; 32], &locality_data),
        log_record(0, 0x0000_0008, &crtm_digest, b"version"),
        log_record(3, EV_NO_ACTION, &[0x99; 32], b"vendor data"),
    ]
    .concat();

    let log = EventLog::decode(&buffer, sha256, &OpenSslHashProvider, &DecoderConfig::default()).unwrap();
    assert_eq!(log.startup_locality(), Some(3));

    let mut initial = vec![0u8; 32];
    initial[31] = 3;
    let expected = digest(sha256, &[initial, crtm_digest].concat());
    assert_eq!(log.replayed().get(0).unwrap(), expected.as_slice());
    assert_eq!(log.replayed().get(3).unwrap(), [0u8; 32].as_slice());
}

/// Test Objective: Verify a startup locality after PCR 0 was extended
/// Expected Result: The locality is ignored
#[test]
fn test_late_startup_locality_is_ignored() {
    let sha1 = DigestAlgorithm::Sha1;
    let mut locality_data = STARTUP_LOCALITY_SIGNATURE.to_vec();
    locality_data.push(4);
    let separator = measured_record(sha1, 0, EV_SEPARATOR, &[0u8; 4]);
    let buffer = [separator, log_record(0, EV_NO_ACTION, &[0u8; 20], &locality_data)].concat();

    let log = EventLog::decode(&buffer, sha1, &OpenSslHashProvider, &DecoderConfig::default()).unwrap();
    assert_eq!(log.startup_locality(), None);
    let expected = replay(sha1, &[(0, digest(sha1, &[0u8; 4]))]);
    assert_eq!(log.replayed().get(0).unwrap(), expected[0].as_slice());
}

/// Test Objective: Verify SIPA records carried by EV_EVENT_TAG are decoded
/// Expected Result: Booleans follow the nonzero rule and offsets are absolute
#[test]
fn test_event_tag_carries_sipa_records() {
    let sha1 = DigestAlgorithm::Sha1;
    let stream = sipa_record(
        0x4001_0001,
        &[
            sipa_record(0x0003_0001, &[0]),
            sipa_record(0x0004_0001, &[1]),
            sipa_record(0x0004_0002, &[2]),
        ]
        .concat(),
    );
    let buffer = [
        measured_record(sha1, 0, EV_SEPARATOR, &[0u8; 4]),
        measured_record(sha1, 12, EV_EVENT_TAG, &stream),
    ]
    .concat();

    let log = EventLog::decode(&buffer, sha1, &OpenSslHashProvider, &DecoderConfig::default()).unwrap();
    assert!(log.events()[0].sipa.is_none());
    let tagged = &log.events()[1];
    assert_eq!(tagged.integrity, Some(IntegrityStatus::Matched));
    let sipa = tagged.sipa.as_ref().unwrap();
    assert_eq!(sipa.len(), 1);

    let data_offset = 36 + 32;
    assert_eq!(sipa[0].offset, data_offset);
    let values: Vec<&SipaPayload> = sipa[0].children().iter().map(|child| &child.payload).collect();
    assert_eq!(
        values,
        vec![&SipaPayload::Boolean(false), &SipaPayload::Boolean(true), &SipaPayload::Boolean(true)]
    );
    assert_eq!(sipa[0].children()[2].offset, data_offset + 8 + 9 + 9);
}

/// Test Objective: Verify a malformed SIPA stream aborts the log decode
/// Expected Result: MalformedPayload at an offset inside the event data
#[test]
fn test_malformed_sipa_stream_aborts_decode() {
    let sha1 = DigestAlgorithm::Sha1;
    let mut stream = sipa_record(0x0003_0001, &[1]);
    stream.extend_from_slice(&[0xFF, 0xFF, 0xFF]);
    let buffer = log_record(12, EV_EVENT_TAG, &[0u8; 20], &stream);

    let err = EventLog::decode(&buffer, sha1, &OpenSslHashProvider, &DecoderConfig::default()).unwrap_err();
    match err {
        DecodeError::MalformedPayload { offset, .. } => assert_eq!(offset, 32 + 9),
        other => panic!("unexpected {:?}", other),
    }
}

/// Test Objective: Verify configuration limits are applied
/// Expected Result: Oversized input is rejected, integrity checking can be disabled
#[test]
fn test_config_limits() {
    let sha1 = DigestAlgorithm::Sha1;
    let buffer = measured_record(sha1, 0, EV_SEPARATOR, &[0u8; 4]);

    let config = DecoderConfig::from_yaml_str("max_buffer_size: 16\n").unwrap();
    let err = EventLog::decode(&buffer, sha1, &OpenSslHashProvider, &config).unwrap_err();
    assert_eq!(err, DecodeError::Oversized { size: buffer.len(), limit: 16 });

    let config = DecoderConfig::from_yaml_str("verify_integrity: false\n").unwrap();
    let log = EventLog::decode(&buffer, sha1, &OpenSslHashProvider, &config).unwrap();
    assert_eq!(log.events()[0].integrity, None);
}

/// Test Objective: Verify base64 transport decoding and JSON output
/// Expected Result: The decoded log renders one JSON object per event
#[test]
fn test_base64_and_json_output() {
    let sha1 = DigestAlgorithm::Sha1;
    let raw = [
        measured_record(sha1, 0, EV_SEPARATOR, &[0u8; 4]),
        measured_record(sha1, 12, EV_EVENT_TAG, &sipa_record(0x0007_0001, &utils::utf16("\\boot.efi"))),
    ]
    .concat();
    let config = DecoderConfig::default();

    let bytes = EventLog::decode_base64(&BASE64.encode(&raw), &config).unwrap();
    assert_eq!(bytes, raw);
    assert!(matches!(
        EventLog::decode_base64("not base64!", &config),
        Err(DecodeError::MalformedLog { offset: 0, .. })
    ));

    let log = EventLog::decode(&bytes, sha1, &OpenSslHashProvider, &config).unwrap();
    let json = log.to_json_value().unwrap();
    let events = json.as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["event_type"], "EV_SEPARATOR");
    assert_eq!(events[0]["digest"], hex::encode(digest(sha1, &[0u8; 4])));
    assert_eq!(events[0]["integrity"], "matched");
    assert!(events[0].get("sipa").is_none());
    assert_eq!(events[1]["pcr_index"], 12);
    assert_eq!(events[1]["sipa"][0]["name"], "SIPAEVENT_FILEPATH");
    assert_eq!(events[1]["sipa"][0]["payload"]["kind"], "Utf16String");
    assert_eq!(events[1]["sipa"][0]["payload"]["value"], "\\boot.efi");
}
