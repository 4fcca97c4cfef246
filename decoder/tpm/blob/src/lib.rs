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

mod container;
mod key_attestation;
mod key_blob;
mod platform;

pub use container::{
    ContainerBlobParser, Section, SectionField, Sections, ShapeDescriptor, TpmVersion,
    TPM_VERSION_12, TPM_VERSION_20,
};
pub use key_attestation::{
    KeyAttestationBlob, KeyAttestationHeader, KEY_ATTESTATION_HEADER_SIZE, KEY_ATTESTATION_MAGIC,
    KEY_ATTESTATION_SHAPE,
};
pub use key_blob::{
    KeyBlob, KeyBlobHeader, KeyBlobShape, KEY_BLOB_HEADER_SIZE_PCP20, KEY_BLOB_HEADER_SIZE_TPM12,
    KEY_BLOB_HEADER_SIZE_WIN8, PCP_KEY_MAGIC,
};
pub use platform::{
    PlatformAttestationBlob, PlatformAttestationHeader, PlatformAttestationVersion,
    PLATFORM_ATTESTATION_HEADER_SIZE_V1, PLATFORM_ATTESTATION_HEADER_SIZE_V2,
    PLATFORM_ATTESTATION_MAGIC, PLATFORM_ATTESTATION_MAGIC_V2, PLATFORM_ATTESTATION_SHAPE_V1,
    PLATFORM_ATTESTATION_SHAPE_V2,
};
