// SPDX-FileCopyrightText: 2023 Rivos Inc.
//
// SPDX-License-Identifier: Apache-2.0

use flagset::FlagSet;
use riscv_pages::{Pfn, SupervisorPhysAddr};

use crate::error::{Error, Result};
use crate::permission::{all_permissions, Permission};
use crate::profile::{BitField, MttLevel, Profile};

// Each code occupies 2 bits of a bitmap.
const CODE_BITS: u64 = 2;
const CODE_MASK: u64 = 0b11;

/// What a single table entry resolved to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decoded {
    /// Continue the walk at the table at this address.
    Directory(SupervisorPhysAddr),
    /// The whole range covered by the entry has these permissions.
    Region(FlagSet<Permission>),
    /// The code selected from a bitmap grants these permissions.
    Bitmap(FlagSet<Permission>),
}

// Enumeration of the defined L2 entry types.
// The entries are encoded as follows:
// |------------------------------------------------
// | Reserved (zero) | Type | Info
// |------------------------------------------------
// The encoding for Type is as follows:
// 0: Disallow the range
// 1: Allow read+execute on the range
// 2: Allow read+write on the range
// 3: Allow read+write+execute on the range
// 4: Info is the PPN of an L1 table of 2-bit codes per 4kB page
// 5: Info holds one 2-bit code per super-page of the range
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum L2EntryType {
    Disallow,
    AllowRx,
    AllowRw,
    AllowRwx,
    L1Directory,
    SuperPages,
}

impl L2EntryType {
    fn from_code(code: u64) -> Option<Self> {
        use L2EntryType::*;
        match code {
            0 => Some(Disallow),
            1 => Some(AllowRx),
            2 => Some(AllowRw),
            3 => Some(AllowRwx),
            4 => Some(L1Directory),
            5 => Some(SuperPages),
            _ => None,
        }
    }

    fn region_permissions(&self) -> Option<FlagSet<Permission>> {
        use L2EntryType::*;
        match self {
            Disallow => Some(FlagSet::default()),
            AllowRx => Some(Permission::Read | Permission::Execute),
            AllowRw => Some(Permission::Read | Permission::Write),
            AllowRwx => Some(all_permissions()),
            L1Directory | SuperPages => None,
        }
    }
}

/// Decodes `raw`, read from the table at `level`, for the access to `addr`.
pub fn decode(profile: &Profile, level: MttLevel, addr: u64, raw: u64) -> Result<Decoded> {
    match level {
        MttLevel::L3 => decode_l3(profile, raw),
        MttLevel::L2 => decode_l2(profile, addr, raw),
        MttLevel::L1 => decode_l1(profile, addr, raw),
    }
}

fn decode_l3(profile: &Profile, raw: u64) -> Result<Decoded> {
    if raw & profile.l3_reserved_mask() != 0 {
        return Err(Error::ReservedBitsSet {
            level: MttLevel::L3,
            entry: raw,
        });
    }
    let pfn = Pfn::supervisor(profile.l3_ppn().extract(raw));
    Ok(Decoded::Directory(pfn.into()))
}

fn decode_l2(profile: &Profile, addr: u64, raw: u64) -> Result<Decoded> {
    use L2EntryType::*;
    let level = MttLevel::L2;
    let layout = profile.l2_entry();
    if layout.reserved.extract(raw) != 0 {
        return Err(Error::ReservedBitsSet { level, entry: raw });
    }
    let type_code = layout.entry_type.extract(raw);
    let entry_type = L2EntryType::from_code(type_code).ok_or(Error::InvalidEntryType {
        level,
        entry_type: type_code,
    })?;
    let info = layout.info.extract(raw);
    match entry_type {
        L1Directory => Ok(Decoded::Directory(Pfn::supervisor(info).into())),
        SuperPages => {
            if info & profile.bitmap_reserved_mask() != 0 {
                return Err(Error::InvalidBitmap { level, entry: raw });
            }
            let code = select_code(info, profile.super_page_index(), addr);
            permissions_for_code(profile, level, code).map(Decoded::Bitmap)
        }
        // Regions apply uniformly; there's nothing for info to describe.
        _ if info != 0 => Err(Error::NonZeroRegionInfo { level, entry: raw }),
        region => region
            .region_permissions()
            .map(Decoded::Region)
            .ok_or(Error::InvalidEntryType {
                level,
                entry_type: type_code,
            }),
    }
}

fn decode_l1(profile: &Profile, addr: u64, raw: u64) -> Result<Decoded> {
    let level = MttLevel::L1;
    if raw & profile.leaf_reserved_mask() != 0 {
        return Err(Error::InvalidBitmap { level, entry: raw });
    }
    let code = select_code(raw, profile.code_index(), addr);
    permissions_for_code(profile, level, code).map(Decoded::Bitmap)
}

// Returns the 2-bit code in `bitmap` for the sub-range `index` selects from `addr`.
fn select_code(bitmap: u64, index: BitField, addr: u64) -> u64 {
    let shift = index.extract(addr) * CODE_BITS;
    (bitmap >> shift) & CODE_MASK
}

fn permissions_for_code(
    profile: &Profile,
    level: MttLevel,
    code: u64,
) -> Result<FlagSet<Permission>> {
    profile
        .codes()
        .decode(code)
        .ok_or(Error::InvalidPermissionCode { level, code })
}
