// Copyright (c) 2022 by Rivos Inc.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

/// The privilege level a hart is executing at.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
#[repr(u8)]
pub enum PrivilegeLevel {
    User = 0,
    Supervisor = 1,
    Machine = 3,
}

impl PrivilegeLevel {
    /// Decodes the two-bit privilege encoding used by `mstatus.MPP`. The value 2 is reserved.
    pub fn from_bits(bits: u64) -> Option<Self> {
        match bits {
            0 => Some(PrivilegeLevel::User),
            1 => Some(PrivilegeLevel::Supervisor),
            3 => Some(PrivilegeLevel::Machine),
            _ => None,
        }
    }

    /// Returns true for the most-privileged level, which is never subject to the MTT.
    pub fn is_machine(&self) -> bool {
        matches!(self, PrivilegeLevel::Machine)
    }
}
