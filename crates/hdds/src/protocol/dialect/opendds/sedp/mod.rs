// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! OpenDDS SEDP Builder
//!
//! Builds SEDP endpoint announcements for OpenDDS interoperability.
//!
//!
//! # OpenDDS Interop Requirements
//!
//! OpenDDS (vendor 0x0103) uses XTypes and requires:
//! - PID_DATA_REPRESENTATION (0x0073) with XCDR2 support
//! - PID_TYPE_INFORMATION (0x0075) for XTypes matching
//!
//! Without these PIDs, OpenDDS won't send user DATA even after matching.
//!
//! # PID Order
//!
//! The PID order follows standard RTPS conventions:
//! 1. CDR encapsulation header (PL_CDR_LE)
//! 2. Locators (PID_UNICAST_LOCATOR)
//! 3. Identity (PID_PARTICIPANT_GUID, PID_ENDPOINT_GUID)
//! 4. Strings (PID_TOPIC_NAME, PID_TYPE_NAME)
//! 5. Version (PID_PROTOCOL_VERSION, PID_VENDOR_ID)
//! 6. XTypes (PID_DATA_REPRESENTATION, PID_TYPE_INFORMATION)
//! 7. QoS (RELIABILITY, DURABILITY, HISTORY, etc.)
//! 8. PID_SENTINEL

mod locators;
mod metadata;
mod qos;
mod type_info;

use crate::protocol::dialect::error::{EncodeError, EncodeResult};
use crate::protocol::dialect::SedpEndpointData;

/// PID constants
mod pids {
    pub const PID_SENTINEL: u16 = 0x0001;
}

/// Build SEDP discovery announcement for OpenDDS.
///
/// Includes PID_TYPE_INFORMATION (0x0075) for XTypes compatibility.
// @audit-ok: Sequential builder (cyclo 19, cogni 2) - linear write_xxx calls without complex branching
pub fn build_sedp(data: &SedpEndpointData) -> EncodeResult<Vec<u8>> {
    // Pre-allocate buffer (2KB - typical SEDP with TypeInfo)
    let mut buf = vec![0u8; 2048];
    let mut offset = 0;

    // CDR encapsulation header (PL_CDR_LE = 0x0003)
    if buf.len() < 4 {
        return Err(EncodeError::BufferTooSmall);
    }
    buf[0..4].copy_from_slice(&[0x00, 0x03, 0x00, 0x00]);
    offset += 4;

    // ===== LOCATORS SECTION =====
    for locator in data.unicast_locators {
        locators::write_unicast_locator(locator, &mut buf, &mut offset)?;
    }

    // ===== IDENTITY SECTION =====
    metadata::write_participant_guid(&data.participant_guid, &mut buf, &mut offset)?;
    metadata::write_endpoint_guid(&data.endpoint_guid, &mut buf, &mut offset)?;

    // ===== STRING SECTION =====
    metadata::write_topic_name(data.topic_name, &mut buf, &mut offset)?;
    metadata::write_type_name(data.type_name, &mut buf, &mut offset)?;

    // ===== VERSION SECTION =====
    metadata::write_protocol_version(&mut buf, &mut offset)?;
    metadata::write_vendor_id(&mut buf, &mut offset)?;

    // ===== XTYPES SECTION =====
    // PID_DATA_REPRESENTATION (0x0073) - CRITICAL for OpenDDS
    // OpenDDS writer advertises XCDR2, reader must support it
    metadata::write_data_representation_xcdr2(&mut buf, &mut offset)?;

    // Info: PID_TYPE_CONSISTENCY (0x0074) removed - OpenDDS doesn't send it in DATA(w)
    // and may not expect it in DATA(r). The TypeInformation hash matching should suffice.
    // metadata::write_type_consistency(&mut buf, &mut offset)?;

    // PID_TYPE_INFORMATION (0x0075) - XTypes TypeInformation
    // Required for OpenDDS XTypes matching - TYPE_CONSISTENCY fallback doesn't work
    type_info::write_type_information(&mut buf, &mut offset)?;

    // ===== QOS SECTION =====
    qos::write_durability(data.qos, &mut buf, &mut offset)?;
    qos::write_reliability(data.qos, &mut buf, &mut offset)?;
    qos::write_history(data.qos, &mut buf, &mut offset)?;
    qos::write_deadline(&mut buf, &mut offset)?;
    qos::write_liveliness(&mut buf, &mut offset)?;
    qos::write_ownership(&mut buf, &mut offset)?;

    // ===== SENTINEL =====
    write_sentinel(&mut buf, &mut offset)?;

    // Truncate to actual size
    buf.truncate(offset);
    Ok(buf)
}

/// Write PID_SENTINEL (0x0001)
fn write_sentinel(buf: &mut [u8], offset: &mut usize) -> EncodeResult<()> {
    if *offset + 4 > buf.len() {
        return Err(EncodeError::BufferTooSmall);
    }
    buf[*offset..*offset + 2].copy_from_slice(&pids::PID_SENTINEL.to_le_bytes());
    buf[*offset + 2..*offset + 4].copy_from_slice(&0u16.to_le_bytes());
    *offset += 4;
    Ok(())
}
