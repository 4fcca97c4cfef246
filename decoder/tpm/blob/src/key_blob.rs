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

//! Key blob
//!
//! Serialized PCP key. The `pcpType` discriminant selects TPM1.2 or TPM2.0; TPM2.0 blobs come
//! in two header sizes, the larger one appending the PCR bank algorithm used by the key's PCR
//! binding.

use log::debug;
use serde::Serialize;
use tpm_common_decoder::{DecodeError, DigestAlgorithm};

use crate::container::{
    ContainerBlobParser, SectionField, Sections, ShapeDescriptor, TpmVersion, DISCRIMINANT_OFFSET,
    HEADER_SIZE_OFFSET,
};

/// `'MPCP'`, stored as the bytes `PCPM`
pub const PCP_KEY_MAGIC: u32 = 0x4D50_4350;

pub const KEY_BLOB_HEADER_SIZE_TPM12: usize = 20;
pub const KEY_BLOB_HEADER_SIZE_WIN8: usize = 52;
pub const KEY_BLOB_HEADER_SIZE_PCP20: usize = 56;

const FLAGS_OFFSET: usize = 12;
const PCR_ALG_ID_OFFSET: usize = 52;

pub const SECTION_TPM_KEY: &str = "tpmKey";
pub const SECTION_PUBLIC: &str = "public";
pub const SECTION_PRIVATE: &str = "private";
pub const SECTION_MIGRATION_PUBLIC: &str = "migrationPublic";
pub const SECTION_MIGRATION_PRIVATE: &str = "migrationPrivate";
pub const SECTION_POLICY_DIGEST_LIST: &str = "policyDigestList";
pub const SECTION_PCR_BINDING: &str = "pcrBinding";
pub const SECTION_PCR_DIGEST: &str = "pcrDigest";
pub const SECTION_ENCRYPTED_SECRET: &str = "encryptedSecret";
pub const SECTION_TPM12_HOSTAGE_BLOB: &str = "tpm12HostageBlob";

const TPM12_SECTIONS: [SectionField; 1] = [SectionField { name: SECTION_TPM_KEY, size_offset: 16 }];

const TPM20_SECTIONS: [SectionField; 9] = [
    SectionField { name: SECTION_PUBLIC, size_offset: 16 },
    SectionField { name: SECTION_PRIVATE, size_offset: 20 },
    SectionField { name: SECTION_MIGRATION_PUBLIC, size_offset: 24 },
    SectionField { name: SECTION_MIGRATION_PRIVATE, size_offset: 28 },
    SectionField { name: SECTION_POLICY_DIGEST_LIST, size_offset: 32 },
    SectionField { name: SECTION_PCR_BINDING, size_offset: 36 },
    SectionField { name: SECTION_PCR_DIGEST, size_offset: 40 },
    SectionField { name: SECTION_ENCRYPTED_SECRET, size_offset: 44 },
    SectionField { name: SECTION_TPM12_HOSTAGE_BLOB, size_offset: 48 },
];

pub const KEY_BLOB_SHAPE_TPM12: ShapeDescriptor = ShapeDescriptor {
    name: "KeyBlobTpm12",
    min_header_size: KEY_BLOB_HEADER_SIZE_TPM12,
    sections: &TPM12_SECTIONS,
};

pub const KEY_BLOB_SHAPE_WIN8: ShapeDescriptor = ShapeDescriptor {
    name: "KeyBlobTpm20Win8",
    min_header_size: KEY_BLOB_HEADER_SIZE_WIN8,
    sections: &TPM20_SECTIONS,
};

pub const KEY_BLOB_SHAPE_PCP20: ShapeDescriptor = ShapeDescriptor {
    name: "KeyBlobTpm20Pcp20",
    min_header_size: KEY_BLOB_HEADER_SIZE_PCP20,
    sections: &TPM20_SECTIONS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KeyBlobShape {
    Tpm12,
    Tpm20Win8,
    Tpm20Pcp20,
}

impl KeyBlobShape {
    /// The single place where the key blob layout is chosen.
    ///
    /// `pcpType` picks the TPM family; within TPM2.0 the header size picks the sub-shape.
    pub fn select(pcp_type: TpmVersion, header_size: usize, base_offset: usize) -> Result<Self, DecodeError> {
        match pcp_type {
            TpmVersion::Tpm12 => Ok(KeyBlobShape::Tpm12),
            TpmVersion::Tpm20 if header_size >= KEY_BLOB_HEADER_SIZE_PCP20 => Ok(KeyBlobShape::Tpm20Pcp20),
            TpmVersion::Tpm20 if header_size >= KEY_BLOB_HEADER_SIZE_WIN8 => Ok(KeyBlobShape::Tpm20Win8),
            TpmVersion::Tpm20 => Err(DecodeError::unknown_shape(
                base_offset + HEADER_SIZE_OFFSET,
                format!("TPM2.0 key blob header size {} matches no known shape", header_size),
            )),
        }
    }

    pub fn descriptor(&self) -> &'static ShapeDescriptor {
        match self {
            KeyBlobShape::Tpm12 => &KEY_BLOB_SHAPE_TPM12,
            KeyBlobShape::Tpm20Win8 => &KEY_BLOB_SHAPE_WIN8,
            KeyBlobShape::Tpm20Pcp20 => &KEY_BLOB_SHAPE_PCP20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyBlobHeader {
    pub magic: u32,
    pub pcp_type: TpmVersion,
    pub header_size: usize,
    pub flags: u32,
    pub shape: KeyBlobShape,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pcr_alg_id: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyBlob<'a> {
    pub header: KeyBlobHeader,
    pub sections: Sections<'a>,
    #[serde(skip)]
    base_offset: usize,
}

impl<'a> KeyBlob<'a> {
    /// Parse a key blob
    ///
    /// # Parameters
    /// * `buffer` - The key blob, starting at its magic
    ///
    /// # Returns
    /// * `Result<Self, DecodeError>` - Header fields and the sections of the selected shape
    ///
    /// # Errors
    /// * `DecodeError::BadMagic` - If the blob does not start with the PCP key magic
    /// * `DecodeError::UnknownShape` - If `pcpType` is unknown or a TPM2.0 header is too short
    /// * `DecodeError::TruncatedBuffer` - If the declared sections run past the buffer end
    pub fn parse(buffer: &'a [u8]) -> Result<Self, DecodeError> {
        Self::parse_at(buffer, 0)
    }

    /// Parse a key blob nested at `base_offset` of an outer container.
    pub fn parse_at(buffer: &'a [u8], base_offset: usize) -> Result<Self, DecodeError> {
        let magic = ContainerBlobParser::read_magic(buffer, base_offset)?;
        if magic != PCP_KEY_MAGIC {
            return Err(DecodeError::BadMagic { offset: base_offset, magic });
        }
        let pcp_type = TpmVersion::from_u32(
            ContainerBlobParser::read_u32_at(buffer, DISCRIMINANT_OFFSET, base_offset)?,
            base_offset + DISCRIMINANT_OFFSET,
        )?;
        let header_size = ContainerBlobParser::read_u32_at(buffer, HEADER_SIZE_OFFSET, base_offset)? as usize;
        let shape = KeyBlobShape::select(pcp_type, header_size, base_offset)?;

        let sections = ContainerBlobParser::parse_at(buffer, shape.descriptor(), base_offset)?;
        let flags = ContainerBlobParser::read_u32_at(buffer, FLAGS_OFFSET, base_offset)?;
        let pcr_alg_id = match shape {
            KeyBlobShape::Tpm20Pcp20 => {
                let raw = ContainerBlobParser::read_u32_at(buffer, PCR_ALG_ID_OFFSET, base_offset)?;
                Some((raw & 0xFFFF) as u16)
            }
            _ => None,
        };
        debug!("Key blob {:?}, {} sections", shape, sections.len());

        Ok(Self {
            header: KeyBlobHeader {
                magic,
                pcp_type,
                header_size: sections.header_size(),
                flags,
                shape,
                pcr_alg_id,
            },
            sections,
            base_offset,
        })
    }

    /// Offset of the blob's magic within the buffer handed to the top-level parse.
    pub fn base_offset(&self) -> usize {
        self.base_offset
    }

    /// Algorithm of the PCR bank the key is bound to, for `Tpm20Pcp20` blobs.
    ///
    /// # Errors
    /// * `DecodeError::UnsupportedAlgorithm` - If `pcrAlgId` is not a known algorithm; the offset
    ///   is that of the field in the outer buffer
    pub fn pcr_algorithm(&self) -> Option<Result<DigestAlgorithm, DecodeError>> {
        self.header
            .pcr_alg_id
            .map(|alg_id| DigestAlgorithm::from_alg_id(alg_id as u32, self.base_offset + PCR_ALG_ID_OFFSET))
    }

    pub fn section(&self, name: &str) -> Option<&'a [u8]> {
        self.sections.get(name)
    }

    pub fn tpm_key(&self) -> Option<&'a [u8]> {
        self.section(SECTION_TPM_KEY)
    }

    pub fn public(&self) -> Option<&'a [u8]> {
        self.section(SECTION_PUBLIC)
    }

    pub fn private(&self) -> Option<&'a [u8]> {
        self.section(SECTION_PRIVATE)
    }

    pub fn pcr_binding(&self) -> Option<&'a [u8]> {
        self.section(SECTION_PCR_BINDING)
    }

    pub fn pcr_digest(&self) -> Option<&'a [u8]> {
        self.section(SECTION_PCR_DIGEST)
    }
}
