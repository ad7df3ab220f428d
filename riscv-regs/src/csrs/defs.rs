// Copyright (c) 2022 by Rivos Inc.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

use riscv_pages::Pfn;
use tock_registers::register_bitfields;
use tock_registers::LocalRegisterCopy;

// Memory tracking table pointer, RV32 layout.
register_bitfields![u32,
    pub mttp32 [
        // Physical page number of the root MTT.
        ppn OFFSET(0) NUMBITS(22) [],
        // Must be zero.
        reserved OFFSET(22) NUMBITS(2) [],
        // Supervisor domain ID.
        sdid OFFSET(24) NUMBITS(6) [],
        // Table walk mode.
        mode OFFSET(30) NUMBITS(2) [
            Bare = 0,
            Smmtt34 = 1,
            Smmtt34Rw = 2,
        ],
    ]
];

// Memory tracking table pointer, RV64 layout.
register_bitfields![u64,
    pub mttp64 [
        // Physical page number of the root MTT.
        ppn OFFSET(0) NUMBITS(44) [],
        // Must be zero.
        reserved OFFSET(44) NUMBITS(10) [],
        // Supervisor domain ID.
        sdid OFFSET(54) NUMBITS(6) [],
        // Table walk mode.
        mode OFFSET(60) NUMBITS(4) [
            Bare = 0,
            Smmtt46 = 1,
            Smmtt46Rw = 2,
            Smmtt56 = 3,
            Smmtt56Rw = 4,
        ],
    ]
];

pub trait MttpHelpers {
    /// Returns the page frame number of the root table.
    fn root_pfn(&self) -> Pfn;

    /// Returns the supervisor domain ID.
    fn sdid(&self) -> u8;

    /// Returns true if any reserved bit is set.
    fn has_reserved_bits(&self) -> bool;
}

impl MttpHelpers for LocalRegisterCopy<u32, mttp32::Register> {
    fn root_pfn(&self) -> Pfn {
        Pfn::supervisor(self.read(mttp32::ppn) as u64)
    }

    fn sdid(&self) -> u8 {
        self.read(mttp32::sdid) as u8
    }

    fn has_reserved_bits(&self) -> bool {
        self.read(mttp32::reserved) != 0
    }
}

impl MttpHelpers for LocalRegisterCopy<u64, mttp64::Register> {
    fn root_pfn(&self) -> Pfn {
        Pfn::supervisor(self.read(mttp64::ppn))
    }

    fn sdid(&self) -> u8 {
        self.read(mttp64::sdid) as u8
    }

    fn has_reserved_bits(&self) -> bool {
        self.read(mttp64::reserved) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mttp64_fields() {
        let mut mttp = LocalRegisterCopy::<u64, mttp64::Register>::new(0);
        mttp.modify(mttp64::mode::Smmtt56 + mttp64::sdid.val(0x2a) + mttp64::ppn.val(0x9_0000));
        assert_eq!(mttp.get(), 0x3a80_0000_0009_0000);
        assert_eq!(mttp.root_pfn().bits(), 0x9_0000);
        assert_eq!(mttp.sdid(), 0x2a);
        assert!(!mttp.has_reserved_bits());
        assert_eq!(
            mttp.read_as_enum::<mttp64::mode::Value>(mttp64::mode),
            Some(mttp64::mode::Value::Smmtt56)
        );
    }

    #[test]
    fn mttp64_undefined_mode() {
        let mttp = LocalRegisterCopy::<u64, mttp64::Register>::new(0x7000_0000_0000_0000);
        assert!(mttp
            .read_as_enum::<mttp64::mode::Value>(mttp64::mode)
            .is_none());
    }

    #[test]
    fn mttp32_fields() {
        let mttp = LocalRegisterCopy::<u32, mttp32::Register>::new(0x4540_0001 | 0x0080_0000);
        assert_eq!(mttp.root_pfn().bits(), 1);
        assert_eq!(mttp.sdid(), 5);
        assert!(mttp.has_reserved_bits());
        assert_eq!(
            mttp.read_as_enum::<mttp32::mode::Value>(mttp32::mode),
            Some(mttp32::mode::Value::Smmtt34)
        );
    }
}
