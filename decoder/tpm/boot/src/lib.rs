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

mod event_type;
mod log_iterator;
mod sipa_type;
mod sipa;
mod integrity;
mod event_log;
mod evidence;

pub use event_type::{EventType, LogEvent, STARTUP_LOCALITY_SIGNATURE};
pub use log_iterator::LogIterator;
pub use sipa_type::{
    is_aggregation, sipa_kind, sipa_type_name, SipaKind,
    SIPA_AGGREGATION_FLAG, SIPA_CATEGORY_MASK, SIPA_CONTAINER_CATEGORY,
};
pub use sipa::{
    RevocationList, SiPolicy, SipaDecoder, SipaEvent, SipaPayload, VsmIdkInfo,
    SIPA_RECORD_HEADER_SIZE,
};
pub use integrity::{IntegrityChecker, IntegrityStatus};
pub use event_log::{DecodedEvent, EventLog};
pub use evidence::{PcrComparison, PlatformEvidence};
