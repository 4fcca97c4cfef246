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

//! SIPA type codes
//!
//! Stateless lookup of a SIPA type code to its name and payload layout. Codes missing from the
//! table are still decoded, as raw bytes.

/// Set on every aggregation type
pub const SIPA_AGGREGATION_FLAG: u32 = 0x4000_0000;
pub const SIPA_CATEGORY_MASK: u32 = 0x000F_0000;
/// Category of aggregations that contain nested records
pub const SIPA_CONTAINER_CATEGORY: u32 = 0x0001_0000;

/// Payload layout of a SIPA type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SipaKind {
    Aggregation,
    Boolean,
    UInt32,
    UInt64,
    Utf16String,
    SiPolicy,
    RevocationList,
    VsmIdkInfo,
    Raw,
}

impl SipaKind {
    /// Payload width of the fixed-width leaf kinds.
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            SipaKind::Boolean => Some(1),
            SipaKind::UInt32 => Some(4),
            SipaKind::UInt64 => Some(8),
            _ => None,
        }
    }
}

struct SipaTypeInfo {
    code: u32,
    name: &'static str,
    kind: SipaKind,
}

macro_rules! sipa_types {
    ($($code:literal => $name:literal, $kind:ident;)*) => {
        const SIPA_TYPES: &[SipaTypeInfo] = &[
            $(SipaTypeInfo { code: $code, name: $name, kind: SipaKind::$kind },)*
        ];
    };
}

sipa_types! {
    0x4001_0001 => "SIPAEVENT_TRUSTBOUNDARY", Aggregation;
    0x4001_0002 => "SIPAEVENT_ELAM_AGGREGATION", Aggregation;
    0x4001_0003 => "SIPAEVENT_LOADEDMODULE_AGGREGATION", Aggregation;
    0xC001_0004 => "SIPAEVENT_TRUSTPOINT_AGGREGATION", Aggregation;
    0x4001_0005 => "SIPAEVENT_KSR_AGGREGATION", Aggregation;
    0x4001_0006 => "SIPAEVENT_KSR_SIGNED_MEASUREMENT_AGGREGATION", Aggregation;

    0x0002_0001 => "SIPAEVENT_INFORMATION", Utf16String;
    0x0002_0002 => "SIPAEVENT_BOOTCOUNTER", UInt64;
    0x0002_0003 => "SIPAEVENT_TRANSFER_CONTROL", UInt32;
    0x0002_0004 => "SIPAEVENT_APPLICATION_RETURN", UInt32;
    0x0002_0005 => "SIPAEVENT_BITLOCKER_UNLOCK", UInt32;
    0x0002_0006 => "SIPAEVENT_EVENTCOUNTER", UInt64;
    0x0002_0007 => "SIPAEVENT_COUNTERID", UInt64;
    0x0002_0009 => "SIPAEVENT_APPLICATION_SVN", UInt32;

    0x0003_0001 => "SIPAEVENT_BOOTDEBUGGING", Boolean;
    0x0003_0002 => "SIPAEVENT_BOOT_REVOCATION_LIST", RevocationList;

    0x0004_0001 => "SIPAEVENT_OSKERNELDEBUG", Boolean;
    0x0004_0002 => "SIPAEVENT_CODEINTEGRITY", Boolean;
    0x0004_0003 => "SIPAEVENT_TESTSIGNING", Boolean;
    0x0004_0004 => "SIPAEVENT_DATAEXECUTIONPREVENTION", UInt64;
    0x0004_0005 => "SIPAEVENT_SAFEMODE", Boolean;
    0x0004_0006 => "SIPAEVENT_WINPE", Boolean;
    0x0004_0007 => "SIPAEVENT_PHYSICALADDRESSEXTENSION", UInt64;
    0x0004_0008 => "SIPAEVENT_OSDEVICE", UInt32;
    0x0004_0009 => "SIPAEVENT_SYSTEMROOT", Utf16String;
    0x0004_000A => "SIPAEVENT_HYPERVISOR_LAUNCH_TYPE", UInt64;
    0x0004_000B => "SIPAEVENT_HYPERVISOR_PATH", Utf16String;
    0x0004_000C => "SIPAEVENT_HYPERVISOR_IOMMU_POLICY", UInt64;
    0x0004_000D => "SIPAEVENT_HYPERVISOR_DEBUG", Boolean;
    0x0004_000E => "SIPAEVENT_DRIVER_LOAD_POLICY", UInt32;
    0x0004_000F => "SIPAEVENT_SI_POLICY", SiPolicy;
    0x0004_0010 => "SIPAEVENT_HYPERVISOR_MMIO_NX_POLICY", UInt64;
    0x0004_0011 => "SIPAEVENT_HYPERVISOR_MSR_FILTER_POLICY", UInt64;
    0x0004_0012 => "SIPAEVENT_VSM_LAUNCH_TYPE", UInt64;
    0x0004_0013 => "SIPAEVENT_OS_REVOCATION_LIST", RevocationList;
    0x0004_0014 => "SIPAEVENT_SMT_STATUS", UInt32;
    0x0004_0020 => "SIPAEVENT_VSM_IDK_INFO", VsmIdkInfo;
    0x0004_0021 => "SIPAEVENT_FLIGHTSIGNING", Boolean;
    0x0004_0022 => "SIPAEVENT_PAGEFILE_ENCRYPTION_ENABLED", Boolean;
    0x0004_0024 => "SIPAEVENT_HIBERNATION_DISABLED", Boolean;
    0x0004_0025 => "SIPAEVENT_DUMPS_DISABLED", Boolean;
    0x0004_0026 => "SIPAEVENT_DUMP_ENCRYPTION_ENABLED", Boolean;
    0x0004_0028 => "SIPAEVENT_LSAISO_CONFIG", UInt32;
    0x0004_0030 => "SIPAEVENT_HYPERVISOR_BOOT_DMA_PROTECTION", UInt32;

    0x0007_0001 => "SIPAEVENT_FILEPATH", Utf16String;
    0x0007_0002 => "SIPAEVENT_IMAGESIZE", UInt64;
    0x0007_0003 => "SIPAEVENT_HASHALGORITHMID", UInt32;
    0x0007_0005 => "SIPAEVENT_AUTHORITYISSUER", Utf16String;
    0x0007_0007 => "SIPAEVENT_IMAGEBASE", UInt64;
    0x0007_0008 => "SIPAEVENT_AUTHORITYPUBLISHER", Utf16String;
    0x0007_000A => "SIPAEVENT_IMAGEVALIDATED", Boolean;
    0x0007_000B => "SIPAEVENT_MODULE_SVN", UInt32;

    0x0009_0001 => "SIPAEVENT_ELAM_KEYNAME", Utf16String;

    0x000A_0001 => "SIPAEVENT_VBS_VSM_REQUIRED", Boolean;
    0x000A_0002 => "SIPAEVENT_VBS_SECUREBOOT_REQUIRED", Boolean;
    0x000A_0003 => "SIPAEVENT_VBS_IOMMU_REQUIRED", Boolean;
    0x000A_0004 => "SIPAEVENT_VBS_MMIO_NX_REQUIRED", Boolean;
    0x000A_0005 => "SIPAEVENT_VBS_MSR_FILTERING_REQUIRED", Boolean;
    0x000A_0006 => "SIPAEVENT_VBS_MANDATORY_ENFORCEMENT", Boolean;
    0x000A_0007 => "SIPAEVENT_VBS_HVCI_POLICY", UInt64;
    0x000A_0008 => "SIPAEVENT_VBS_MICROSOFT_BOOT_CHAIN_REQUIRED", Boolean;
    0x000A_0009 => "SIPAEVENT_VBS_DUMP_USES_AMEROOT", Boolean;
    0x000A_000A => "SIPAEVENT_VBS_VSM_NOSECRETS_ENFORCED", Boolean;
}

/// Aggregation records carry a nested record stream instead of a leaf payload.
pub fn is_aggregation(type_code: u32) -> bool {
    type_code & SIPA_AGGREGATION_FLAG != 0 && type_code & SIPA_CATEGORY_MASK == SIPA_CONTAINER_CATEGORY
}

/// Payload layout of `type_code`; unlisted leaf codes are `Raw`.
pub fn sipa_kind(type_code: u32) -> SipaKind {
    if is_aggregation(type_code) {
        return SipaKind::Aggregation;
    }
    SIPA_TYPES
        .iter()
        .find(|info| info.code == type_code)
        .map_or(SipaKind::Raw, |info| info.kind)
}

/// Display name of `type_code`, for presentation only.
pub fn sipa_type_name(type_code: u32) -> Option<&'static str> {
    SIPA_TYPES.iter().find(|info| info.code == type_code).map(|info| info.name)
}
