// SPDX-FileCopyrightText: 2023 Rivos Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Bit layouts of the MTT for each supported `mttp` mode.
//!
//! A `Profile` is a small data table: where each level's index sits in the physical address,
//! how wide table entries are, and where the fields of each entry type live. The walker itself
//! is written once against `Profile` rather than once per address width.

use core::fmt;

use riscv_pages::{PageSize, PFN_SHIFT};
use static_assertions::const_assert;

use crate::config::AddressWidth;
use crate::permission::PermissionCodes;

/// A contiguous range of bits within an address or a table entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitField {
    shift: u32,
    width: u32,
}

impl BitField {
    /// Creates the field covering bits `hi` down to `lo`, inclusive.
    pub const fn from_range(hi: u32, lo: u32) -> Self {
        Self {
            shift: lo,
            width: hi - lo + 1,
        }
    }

    /// Returns the position of the lowest bit.
    pub const fn shift(&self) -> u32 {
        self.shift
    }

    /// Returns the number of bits in the field.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Returns the position of the first bit above the field.
    pub const fn end(&self) -> u32 {
        self.shift + self.width
    }

    /// Returns the field's bits in place.
    pub const fn mask(&self) -> u64 {
        low_bits(self.width) << self.shift
    }

    /// Returns the field's value from `val`, shifted down to bit 0.
    pub const fn extract(&self, val: u64) -> u64 {
        (val & self.mask()) >> self.shift
    }
}

const fn low_bits(count: u32) -> u64 {
    if count >= u64::BITS {
        u64::MAX
    } else {
        (1 << count) - 1
    }
}

/// Levels of the MTT, ordered from the root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MttLevel {
    /// Directory level above L2, present only in 3-level tables.
    L3,
    /// Holds directory, region or super-page bitmap entries.
    L2,
    /// Flat table of 2-bit permission codes for 4kB pages.
    L1,
}

impl MttLevel {
    /// Returns the next level towards the leaves, or `None` for the leaf level.
    pub fn next(&self) -> Option<Self> {
        match self {
            MttLevel::L3 => Some(MttLevel::L2),
            MttLevel::L2 => Some(MttLevel::L1),
            MttLevel::L1 => None,
        }
    }

    /// Returns if this is the leaf bitmap level.
    pub fn is_leaf(&self) -> bool {
        matches!(self, MttLevel::L1)
    }
}

impl fmt::Display for MttLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MttLevel::L3 => write!(f, "MTTL3"),
            MttLevel::L2 => write!(f, "MTTL2"),
            MttLevel::L1 => write!(f, "MTTL1"),
        }
    }
}

/// Field layout of an L2 entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct L2EntryLayout {
    /// Table PPN for directories, permission bitmap for super-pages, zero for regions.
    pub info: BitField,
    /// Entry type code.
    pub entry_type: BitField,
    /// Must be zero.
    pub reserved: BitField,
}

/// The complete description of one MTT format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Profile {
    width: AddressWidth,
    pa_bits: u32,
    l3_index: Option<BitField>,
    l2_index: BitField,
    super_page_index: BitField,
    super_page_size: PageSize,
    l1_index: BitField,
    code_index: BitField,
    l3_ppn: BitField,
    l2_entry: L2EntryLayout,
    codes: PermissionCodes,
}

/// Two-level table for 34-bit physical addresses with 32-bit entries.
pub const SMMTT34: Profile = Profile {
    width: AddressWidth::Rv32,
    pa_bits: 34,
    l3_index: None,
    l2_index: BitField::from_range(33, 25),
    super_page_index: BitField::from_range(24, 22),
    super_page_size: PageSize::Size4M,
    l1_index: BitField::from_range(24, 15),
    code_index: BitField::from_range(14, 12),
    l3_ppn: BitField::from_range(21, 0),
    l2_entry: L2EntryLayout {
        info: BitField::from_range(21, 0),
        entry_type: BitField::from_range(24, 22),
        reserved: BitField::from_range(31, 25),
    },
    codes: PermissionCodes::UNIFORM,
};

const RV64_L2_ENTRY: L2EntryLayout = L2EntryLayout {
    info: BitField::from_range(43, 0),
    entry_type: BitField::from_range(47, 44),
    reserved: BitField::from_range(63, 48),
};

/// Two-level table for 46-bit physical addresses with 64-bit entries.
pub const SMMTT46: Profile = Profile {
    width: AddressWidth::Rv64,
    pa_bits: 46,
    l3_index: None,
    l2_index: BitField::from_range(45, 25),
    super_page_index: BitField::from_range(24, 21),
    super_page_size: PageSize::Size2M,
    l1_index: BitField::from_range(24, 17),
    code_index: BitField::from_range(16, 12),
    l3_ppn: BitField::from_range(43, 0),
    l2_entry: RV64_L2_ENTRY,
    codes: PermissionCodes::UNIFORM,
};

/// Three-level table for 56-bit physical addresses with 64-bit entries.
pub const SMMTT56: Profile = Profile {
    width: AddressWidth::Rv64,
    pa_bits: 56,
    l3_index: Some(BitField::from_range(55, 46)),
    ..SMMTT46
};

const_assert!(SMMTT34.is_well_formed());
const_assert!(SMMTT46.is_well_formed());
const_assert!(SMMTT56.is_well_formed());

impl Profile {
    /// Checks that the level indices partition the covered address bits above the page offset,
    /// that the entry fields tile the entry, and that each bitmap fits in its container.
    pub const fn is_well_formed(&self) -> bool {
        let entry_bits = self.entry_bytes() as u32 * 8;
        let top = match self.l3_index {
            Some(l3) => {
                if l3.shift() != self.l2_index.end() || self.l3_ppn.end() > entry_bits {
                    return false;
                }
                l3.end()
            }
            None => self.l2_index.end(),
        };
        let l2 = &self.l2_entry;
        top == self.pa_bits
            && self.code_index.shift() == PFN_SHIFT as u32
            && self.l1_index.shift() == self.code_index.end()
            && self.l2_index.shift() == self.l1_index.end()
            && self.super_page_index.end() == self.l2_index.shift()
            && (1u64 << self.super_page_index.shift()) == self.super_page_size as u64
            && l2.info.shift() == 0
            && l2.entry_type.shift() == l2.info.end()
            && l2.reserved.shift() == l2.entry_type.end()
            && l2.reserved.end() == entry_bits
            && self.bitmap_bits() <= l2.info.width()
            && self.leaf_bitmap_bits() <= entry_bits
            && self.l2_entry.info.width() + (PFN_SHIFT as u32) >= self.pa_bits
    }

    /// Returns the address width this profile is defined for.
    pub const fn width(&self) -> AddressWidth {
        self.width
    }

    /// Returns the number of physical address bits the table covers.
    pub const fn pa_bits(&self) -> u32 {
        self.pa_bits
    }

    /// Returns the size in bytes of one table entry.
    pub const fn entry_bytes(&self) -> u64 {
        match self.width {
            AddressWidth::Rv32 => 4,
            AddressWidth::Rv64 => 8,
        }
    }

    /// Returns the number of levels in the walk.
    pub const fn level_count(&self) -> usize {
        if self.l3_index.is_some() {
            3
        } else {
            2
        }
    }

    /// Returns the level the walk starts at.
    pub const fn root_level(&self) -> MttLevel {
        if self.l3_index.is_some() {
            MttLevel::L3
        } else {
            MttLevel::L2
        }
    }

    /// Returns the address bits selecting the entry read at `level`.
    pub fn table_index(&self, level: MttLevel) -> Option<BitField> {
        match level {
            MttLevel::L3 => self.l3_index,
            MttLevel::L2 => Some(self.l2_index),
            MttLevel::L1 => Some(self.l1_index),
        }
    }

    /// Returns the address bits selecting a code within a super-page bitmap.
    pub const fn super_page_index(&self) -> BitField {
        self.super_page_index
    }

    /// Returns the address bits selecting a code within a leaf entry.
    pub const fn code_index(&self) -> BitField {
        self.code_index
    }

    /// Returns the PPN field of an L3 entry.
    pub const fn l3_ppn(&self) -> BitField {
        self.l3_ppn
    }

    /// Returns the field layout of L2 entries.
    pub const fn l2_entry(&self) -> &L2EntryLayout {
        &self.l2_entry
    }

    /// Returns the mask of bits of an L3 entry that must be zero.
    pub const fn l3_reserved_mask(&self) -> u64 {
        low_bits(self.entry_bytes() as u32 * 8) & !self.l3_ppn.mask()
    }

    /// Returns the mask of L2 info bits beyond the super-page bitmap.
    pub const fn bitmap_reserved_mask(&self) -> u64 {
        self.l2_entry.info.mask() & !low_bits(self.bitmap_bits())
    }

    /// Returns the mask of leaf entry bits beyond the permission codes.
    pub const fn leaf_reserved_mask(&self) -> u64 {
        low_bits(self.entry_bytes() as u32 * 8) & !low_bits(self.leaf_bitmap_bits())
    }

    /// Returns the size of the range covered by one L2 entry.
    pub const fn region_size(&self) -> PageSize {
        PageSize::Size32M
    }

    /// Returns the size of the range covered by one super-page bitmap code.
    pub const fn super_page_size(&self) -> PageSize {
        self.super_page_size
    }

    /// Returns the 2-bit code table.
    pub const fn codes(&self) -> &PermissionCodes {
        &self.codes
    }

    /// Returns this profile with the 2-bit codes decoded through `codes`.
    pub const fn with_codes(self, codes: PermissionCodes) -> Self {
        Self { codes, ..self }
    }

    const fn bitmap_bits(&self) -> u32 {
        2 << self.super_page_index.width()
    }

    const fn leaf_bitmap_bits(&self) -> u32 {
        2 << self.code_index.width()
    }
}
