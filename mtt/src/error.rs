// SPDX-FileCopyrightText: 2023 Rivos Inc.
//
// SPDX-License-Identifier: Apache-2.0

use core::{fmt, result};

use crate::config::MttMode;
use crate::profile::MttLevel;

/// MTT walk errors. Every variant denies the access; the variant only matters for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// The mode field of `mttp` holds a value that isn't defined for the address width.
    InvalidMode(u64),
    /// The mode selects the combined read/write entry encoding, which has been superseded.
    SupersededMode(MttMode),
    /// Reserved bits of the `mttp` value are set.
    ReservedMttpBits(u64),
    /// A reserved field of a table entry was non-zero.
    ReservedBitsSet { level: MttLevel, entry: u64 },
    /// The type field of an L2 entry holds an undefined encoding.
    InvalidEntryType { level: MttLevel, entry_type: u64 },
    /// A region entry carried a non-zero info field.
    NonZeroRegionInfo { level: MttLevel, entry: u64 },
    /// Bits beyond the permission bitmap of a super-page or leaf entry were set.
    InvalidBitmap { level: MttLevel, entry: u64 },
    /// A 2-bit permission code isn't defined by the active profile.
    InvalidPermissionCode { level: MttLevel, code: u64 },
    /// The address has bits set above the range covered by the table.
    AddressOutOfRange(u64),
    /// Reading the table entry at `addr` faulted.
    MemoryRead { level: MttLevel, addr: u64 },
    /// The walk ran out of levels without reaching a terminal entry.
    LevelsExhausted,
}

/// Coarse classification of `Error`s.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// `mttp` doesn't describe a usable configuration.
    Configuration,
    /// A table entry or address is malformed.
    Decode,
    /// The memory holding a table entry couldn't be read.
    MemoryRead,
    /// The table is structurally incomplete.
    LevelExhaustion,
}

impl Error {
    /// Returns the class of this error.
    pub fn kind(&self) -> ErrorKind {
        use Error::*;
        match self {
            InvalidMode(_) | SupersededMode(_) | ReservedMttpBits(_) => ErrorKind::Configuration,
            ReservedBitsSet { .. }
            | InvalidEntryType { .. }
            | NonZeroRegionInfo { .. }
            | InvalidBitmap { .. }
            | InvalidPermissionCode { .. }
            | AddressOutOfRange(_) => ErrorKind::Decode,
            MemoryRead { .. } => ErrorKind::MemoryRead,
            LevelsExhausted => ErrorKind::LevelExhaustion,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        match self {
            Error::InvalidMode(mode) => write!(f, "Invalid mttp mode {}", mode),
            Error::SupersededMode(mode) => write!(f, "Superseded mttp mode {:?}", mode),
            Error::ReservedMttpBits(raw) => write!(f, "Reserved mttp bits set in {:#x}", raw),
            Error::ReservedBitsSet { level, entry } => {
                write!(f, "Reserved bits set in {} entry {:#x}", level, entry)
            }
            Error::InvalidEntryType { level, entry_type } => {
                write!(f, "Invalid {} entry type {:#x}", level, entry_type)
            }
            Error::NonZeroRegionInfo { level, entry } => {
                write!(f, "Non-zero info in {} region entry {:#x}", level, entry)
            }
            Error::InvalidBitmap { level, entry } => {
                write!(f, "Bits set beyond {} bitmap in {:#x}", level, entry)
            }
            Error::InvalidPermissionCode { level, code } => {
                write!(f, "Invalid {} permission code {:#b}", level, code)
            }
            Error::AddressOutOfRange(addr) => write!(f, "Address {:#x} outside the MTT", addr),
            Error::MemoryRead { level, addr } => {
                write!(f, "Fault reading {} entry at {:#x}", level, addr)
            }
            Error::LevelsExhausted => write!(f, "MTT walk ended without a terminal entry"),
        }
    }
}

/// Holds the result of a MTT operation.
pub type Result<T> = result::Result<T, Error>;
