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

//! Key attestation blob
//!
//! Bundles a TPM certify structure over a key, its signature, and the attested key blob.

use serde::Serialize;
use tpm_common_decoder::DecodeError;

use crate::container::{
    ContainerBlobParser, SectionField, Sections, ShapeDescriptor, TpmVersion, DISCRIMINANT_OFFSET,
};
use crate::key_blob::KeyBlob;

/// `'SDAK'`, stored as the bytes `KADS`
pub const KEY_ATTESTATION_MAGIC: u32 = 0x5344_414B;
pub const KEY_ATTESTATION_HEADER_SIZE: usize = 24;

pub const SECTION_KEY_ATTEST: &str = "keyAttest";
pub const SECTION_SIGNATURE: &str = "signature";
pub const SECTION_KEY_BLOB: &str = "keyBlob";

const KEY_ATTESTATION_SECTIONS: [SectionField; 3] = [
    SectionField { name: SECTION_KEY_ATTEST, size_offset: 12 },
    SectionField { name: SECTION_SIGNATURE, size_offset: 16 },
    SectionField { name: SECTION_KEY_BLOB, size_offset: 20 },
];

pub const KEY_ATTESTATION_SHAPE: ShapeDescriptor = ShapeDescriptor {
    name: "KeyAttestation",
    min_header_size: KEY_ATTESTATION_HEADER_SIZE,
    sections: &KEY_ATTESTATION_SECTIONS,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyAttestationHeader {
    pub magic: u32,
    pub platform: TpmVersion,
    pub header_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyAttestationBlob<'a> {
    pub header: KeyAttestationHeader,
    pub sections: Sections<'a>,
}

impl<'a> KeyAttestationBlob<'a> {
    /// Parse a key attestation blob; the nested key blob is decoded on demand by [`key_blob`](Self::key_blob)
    ///
    /// # Errors
    /// * `DecodeError::BadMagic` - If the magic is not the key attestation magic
    /// * `DecodeError::UnknownShape` - If the platform version is unknown or the header too short
    /// * `DecodeError::TruncatedBuffer` - If the declared sections run past the buffer end
    pub fn parse(buffer: &'a [u8]) -> Result<Self, DecodeError> {
        let magic = ContainerBlobParser::read_magic(buffer, 0)?;
        if magic != KEY_ATTESTATION_MAGIC {
            return Err(DecodeError::BadMagic { offset: 0, magic });
        }
        let platform = TpmVersion::from_u32(
            ContainerBlobParser::read_u32_at(buffer, DISCRIMINANT_OFFSET, 0)?,
            DISCRIMINANT_OFFSET,
        )?;
        let sections = ContainerBlobParser::parse(buffer, &KEY_ATTESTATION_SHAPE)?;

        Ok(Self {
            header: KeyAttestationHeader {
                magic,
                platform,
                header_size: sections.header_size(),
            },
            sections,
        })
    }

    pub fn key_attest(&self) -> &'a [u8] {
        self.sections.bytes(SECTION_KEY_ATTEST)
    }

    pub fn signature(&self) -> &'a [u8] {
        self.sections.bytes(SECTION_SIGNATURE)
    }

    pub fn key_blob_bytes(&self) -> &'a [u8] {
        self.sections.bytes(SECTION_KEY_BLOB)
    }

    /// Decode the embedded key blob; errors report offsets within this attestation blob.
    pub fn key_blob(&self) -> Result<KeyBlob<'a>, DecodeError> {
        let offset = self
            .sections
            .section(SECTION_KEY_BLOB)
            .map_or(self.header.header_size, |section| section.offset);
        KeyBlob::parse_at(self.key_blob_bytes(), offset)
    }
}
