// Copyright (c) 2021 by Rivos Inc.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

use core::fmt;

/// Number of bits in the offset of a 4kB page; a PFN is an address shifted right by this amount.
pub const PFN_SHIFT: u64 = 12;

/// Sizes of the physical ranges an MTT decision can apply to.
#[repr(u64)]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum PageSize {
    Size4k = 4 * 1024,
    Size2M = 2 * 1024 * 1024,
    Size4M = 4 * 1024 * 1024,
    Size32M = 32 * 1024 * 1024,
}

impl PageSize {
    /// Checks if the given quantity is aligned to this page size.
    pub const fn is_aligned(&self, val: u64) -> bool {
        (val & (*self as u64 - 1)) == 0
    }

    /// Rounds down the quantity to the nearest multiple of this page size.
    pub const fn round_down(&self, val: u64) -> u64 {
        val & !(*self as u64 - 1)
    }

    /// Returns true if the `len` bytes starting at `addr` extend past the page containing `addr`.
    pub fn crosses_boundary(&self, addr: u64, len: u64) -> bool {
        if len == 0 {
            return false;
        }
        let last = addr.saturating_add(len - 1);
        self.round_down(addr) != self.round_down(last)
    }
}

/// A supervisor physical address.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SupervisorPhysAddr(u64);

impl SupervisorPhysAddr {
    /// Creates an address from its raw bits.
    pub const fn supervisor(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the inner 64 address.
    pub const fn bits(&self) -> u64 {
        self.0
    }

    /// Returns the address incremented by the given number of bytes.
    /// Returns None if the result would overlfow.
    pub fn checked_increment(&self, increment: u64) -> Option<Self> {
        let addr = self.0.checked_add(increment)?;
        Some(Self(addr))
    }

    /// Returns true if the address is a multiple of `align`, which must be a power of two.
    pub const fn is_aligned_to(&self, align: u64) -> bool {
        self.0 & (align - 1) == 0
    }
}

impl fmt::LowerHex for SupervisorPhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// A supervisor physical page frame number, as held in `mttp` and MTT directory entries.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Pfn(u64);

impl Pfn {
    /// Creates a PFN from its raw bits.
    pub const fn supervisor(bits: u64) -> Self {
        Self(bits)
    }

    /// Returns the PFN of the page containing `addr`.
    pub const fn containing(addr: SupervisorPhysAddr) -> Self {
        Self(addr.bits() >> PFN_SHIFT)
    }

    /// Returns the raw PFN.
    pub const fn bits(&self) -> u64 {
        self.0
    }
}

impl From<Pfn> for SupervisorPhysAddr {
    fn from(pfn: Pfn) -> SupervisorPhysAddr {
        SupervisorPhysAddr(pfn.0 << PFN_SHIFT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_alignment() {
        assert!(PageSize::Size2M.is_aligned(0x8420_0000));
        assert!(!PageSize::Size4M.is_aligned(0x8420_0000));
        assert_eq!(PageSize::Size32M.round_down(0x8420_3000), 0x8400_0000);
        assert_eq!(PageSize::Size4k.round_down(0x8420_3fff), 0x8420_3000);
    }

    #[test]
    fn boundary_crossing() {
        assert!(!PageSize::Size4k.crosses_boundary(0x1000, 0x1000));
        assert!(PageSize::Size4k.crosses_boundary(0x1ffc, 8));
        assert!(!PageSize::Size4k.crosses_boundary(0x1ffc, 0));
        assert!(!PageSize::Size2M.crosses_boundary(u64::MAX - 4, 16));
    }

    #[test]
    fn pfn_conversion() {
        let addr = SupervisorPhysAddr::from(Pfn::supervisor(0x8_0000));
        assert_eq!(addr.bits(), 0x8000_0000);
        assert_eq!(Pfn::containing(SupervisorPhysAddr::supervisor(0x8000_0fff)).bits(), 0x8_0000);
        assert_eq!(
            SupervisorPhysAddr::supervisor(u64::MAX).checked_increment(1),
            None
        );
        assert!(addr.is_aligned_to(4096));
    }
}
