// SPDX-FileCopyrightText: 2023 Rivos Inc.
//
// SPDX-License-Identifier: Apache-2.0

use flagset::{flags, FlagSet};

flags! {
    /// Access rights an MTT entry can grant.
    #[repr(u8)]
    pub enum Permission: u8 {
        Read = 1,
        Write = 2,
        Execute = 4,
    }
}

const NONE: u8 = 0;
const RX: u8 = Permission::Read as u8 | Permission::Execute as u8;
const RW: u8 = Permission::Read as u8 | Permission::Write as u8;
const RWX: u8 = Permission::Read as u8 | Permission::Write as u8 | Permission::Execute as u8;

/// Returns the set holding every permission.
pub fn all_permissions() -> FlagSet<Permission> {
    FlagSet::full()
}

/// Maps the 2-bit permission codes found in bitmap entries to access rights.
///
/// A `None` slot marks the code as undefined; decoding it denies the access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PermissionCodes([Option<u8>; 4]);

impl PermissionCodes {
    /// The encoding shared by every terminal level:
    /// 00b disallow, 01b read+execute, 10b read+write, 11b read+write+execute.
    pub const UNIFORM: PermissionCodes = PermissionCodes([Some(NONE), Some(RX), Some(RW), Some(RWX)]);

    /// Builds a custom code table from raw `Permission` bit patterns.
    pub const fn new(codes: [Option<u8>; 4]) -> Self {
        Self(codes)
    }

    /// Returns the permissions for `code`, or `None` if the code is out of range or undefined.
    pub fn decode(&self, code: u64) -> Option<FlagSet<Permission>> {
        let bits = (*self.0.get(code as usize)?)?;
        Some(FlagSet::new_truncated(bits))
    }
}

/// Adjustments applied to the permissions found in the table before the request is checked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PermissionPolicy {
    /// Grant execute wherever read is granted, leaving execute control to other parts of the
    /// memory hierarchy.
    pub read_implies_execute: bool,
}

impl PermissionPolicy {
    /// Permissions are reported exactly as encoded.
    pub const STRICT: PermissionPolicy = PermissionPolicy {
        read_implies_execute: false,
    };

    /// Read permission also grants execute.
    pub const READ_IMPLIES_EXECUTE: PermissionPolicy = PermissionPolicy {
        read_implies_execute: true,
    };

    /// Applies the policy to the permissions decoded from the table.
    pub fn apply(&self, allowed: FlagSet<Permission>) -> FlagSet<Permission> {
        if self.read_implies_execute && allowed.contains(Permission::Read) {
            allowed | Permission::Execute
        } else {
            allowed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_codes() {
        let codes = PermissionCodes::UNIFORM;
        assert!(codes.decode(0).unwrap().is_empty());
        assert_eq!(codes.decode(1).unwrap(), Permission::Read | Permission::Execute);
        assert_eq!(codes.decode(2).unwrap(), Permission::Read | Permission::Write);
        assert_eq!(codes.decode(3).unwrap(), all_permissions());
        assert_eq!(codes.decode(4), None);
    }

    #[test]
    fn undefined_code() {
        let codes = PermissionCodes::new([Some(NONE), Some(RX), None, Some(RWX)]);
        assert_eq!(codes.decode(2), None);
        assert_eq!(codes.decode(3).unwrap(), all_permissions());
    }

    #[test]
    fn read_implies_execute() {
        let rw = Permission::Read | Permission::Write;
        assert_eq!(PermissionPolicy::STRICT.apply(rw), rw);
        assert_eq!(
            PermissionPolicy::READ_IMPLIES_EXECUTE.apply(rw),
            all_permissions()
        );
        let write_only = FlagSet::from(Permission::Write);
        assert_eq!(
            PermissionPolicy::READ_IMPLIES_EXECUTE.apply(write_only),
            write_only
        );
        assert_eq!(PermissionPolicy::default(), PermissionPolicy::STRICT);
    }
}
