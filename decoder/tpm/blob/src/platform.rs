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

//! Platform attestation blob
//!
//! Bundles the PCR values, the TPM quote over them, the quote signature and the measured-boot
//! log that explains the PCR values. Two header versions exist; the second appends the TPM_ALG_ID
//! of the PCR bank.

use log::debug;
use serde::Serialize;
use tpm_common_decoder::{DecodeError, DigestAlgorithm, PcrBank, PCR_COUNT};

use crate::container::{
    ContainerBlobParser, SectionField, Sections, ShapeDescriptor, TpmVersion, DISCRIMINANT_OFFSET,
};

/// `'SDAP'`, stored as the bytes `PADS`
pub const PLATFORM_ATTESTATION_MAGIC: u32 = 0x5344_4150;
/// `'SDA2'`, stored as the bytes `2ADS`; the header carries the PCR algorithm
pub const PLATFORM_ATTESTATION_MAGIC_V2: u32 = 0x5344_4132;

pub const PLATFORM_ATTESTATION_HEADER_SIZE_V1: usize = 28;
pub const PLATFORM_ATTESTATION_HEADER_SIZE_V2: usize = 32;
const PCR_ALG_ID_OFFSET: usize = 28;

pub const SECTION_PCR_VALUES: &str = "pcrValues";
pub const SECTION_QUOTE: &str = "quote";
pub const SECTION_SIGNATURE: &str = "signature";
pub const SECTION_LOG: &str = "log";

const PLATFORM_SECTIONS: [SectionField; 4] = [
    SectionField { name: SECTION_PCR_VALUES, size_offset: 12 },
    SectionField { name: SECTION_QUOTE, size_offset: 16 },
    SectionField { name: SECTION_SIGNATURE, size_offset: 20 },
    SectionField { name: SECTION_LOG, size_offset: 24 },
];

pub const PLATFORM_ATTESTATION_SHAPE_V1: ShapeDescriptor = ShapeDescriptor {
    name: "PlatformAttestationV1",
    min_header_size: PLATFORM_ATTESTATION_HEADER_SIZE_V1,
    sections: &PLATFORM_SECTIONS,
};

pub const PLATFORM_ATTESTATION_SHAPE_V2: ShapeDescriptor = ShapeDescriptor {
    name: "PlatformAttestationV2",
    min_header_size: PLATFORM_ATTESTATION_HEADER_SIZE_V2,
    sections: &PLATFORM_SECTIONS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlatformAttestationVersion {
    V1,
    V2,
}

impl PlatformAttestationVersion {
    /// Resolve the header version from the magic constant.
    pub fn from_magic(magic: u32, offset: usize) -> Result<Self, DecodeError> {
        match magic {
            PLATFORM_ATTESTATION_MAGIC => Ok(PlatformAttestationVersion::V1),
            PLATFORM_ATTESTATION_MAGIC_V2 => Ok(PlatformAttestationVersion::V2),
            _ => Err(DecodeError::BadMagic { offset, magic }),
        }
    }

    pub fn shape(&self) -> &'static ShapeDescriptor {
        match self {
            PlatformAttestationVersion::V1 => &PLATFORM_ATTESTATION_SHAPE_V1,
            PlatformAttestationVersion::V2 => &PLATFORM_ATTESTATION_SHAPE_V2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformAttestationHeader {
    pub magic: u32,
    pub version: PlatformAttestationVersion,
    pub platform: TpmVersion,
    pub header_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pcr_alg_id: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformAttestationBlob<'a> {
    pub header: PlatformAttestationHeader,
    pub sections: Sections<'a>,
}

impl<'a> PlatformAttestationBlob<'a> {
    /// Parse a platform attestation blob
    ///
    /// # Errors
    /// * `DecodeError::BadMagic` - If the magic is neither accepted constant
    /// * `DecodeError::UnknownShape` - If the platform version is unknown or the header too short
    /// * `DecodeError::TruncatedBuffer` - If the declared sections run past the buffer end
    pub fn parse(buffer: &'a [u8]) -> Result<Self, DecodeError> {
        let magic = ContainerBlobParser::read_magic(buffer, 0)?;
        let version = PlatformAttestationVersion::from_magic(magic, 0)?;
        let platform = TpmVersion::from_u32(
            ContainerBlobParser::read_u32_at(buffer, DISCRIMINANT_OFFSET, 0)?,
            DISCRIMINANT_OFFSET,
        )?;

        let sections = ContainerBlobParser::parse(buffer, version.shape())?;
        let pcr_alg_id = match version {
            PlatformAttestationVersion::V1 => None,
            PlatformAttestationVersion::V2 => Some(ContainerBlobParser::read_u32_at(buffer, PCR_ALG_ID_OFFSET, 0)?),
        };
        debug!(
            "Platform attestation {:?} for {:?}, header {} bytes, declared {} bytes",
            version,
            platform,
            sections.header_size(),
            sections.declared_size()
        );

        Ok(Self {
            header: PlatformAttestationHeader {
                magic,
                version,
                platform,
                header_size: sections.header_size(),
                pcr_alg_id,
            },
            sections,
        })
    }

    /// PCR bank algorithm: the header's `pcrAlgId` for V2, SHA-1 for V1.
    pub fn algorithm(&self) -> Result<DigestAlgorithm, DecodeError> {
        match self.header.pcr_alg_id {
            Some(alg_id) => DigestAlgorithm::from_alg_id(alg_id, PCR_ALG_ID_OFFSET),
            None => Ok(DigestAlgorithm::Sha1),
        }
    }

    pub fn pcr_values(&self) -> &'a [u8] {
        self.sections.bytes(SECTION_PCR_VALUES)
    }

    pub fn quote(&self) -> &'a [u8] {
        self.sections.bytes(SECTION_QUOTE)
    }

    pub fn signature(&self) -> &'a [u8] {
        self.sections.bytes(SECTION_SIGNATURE)
    }

    pub fn log(&self) -> &'a [u8] {
        self.sections.bytes(SECTION_LOG)
    }

    /// Offset of the log section within the blob.
    pub fn log_offset(&self) -> usize {
        self.sections
            .section(SECTION_LOG)
            .map_or(self.header.header_size, |section| section.offset)
    }

    /// The PCR bank reported by the platform.
    ///
    /// The width of each value, `cbPcrValues / 24`, must name the same algorithm as the header.
    ///
    /// # Errors
    /// * `DecodeError::UnsupportedAlgorithm` - If the header algorithm or the value width is unknown
    /// * `DecodeError::MalformedPayload` - If the width disagrees with the header algorithm, or the
    ///   section does not hold exactly 24 values
    pub fn pcr_bank(&self) -> Result<PcrBank, DecodeError> {
        let offset = self
            .sections
            .section(SECTION_PCR_VALUES)
            .map_or(self.header.header_size, |section| section.offset);
        let algorithm = self.algorithm()?;
        let values = self.pcr_values();
        if values.len() % PCR_COUNT == 0 {
            let width_algorithm = DigestAlgorithm::from_digest_size(values.len() / PCR_COUNT, offset)?;
            if width_algorithm != algorithm {
                return Err(DecodeError::malformed_payload(
                    offset,
                    format!("PCR values are {} wide, header declares {}", width_algorithm, algorithm),
                ));
            }
        }
        PcrBank::from_bytes(algorithm, values, offset)
    }
}
