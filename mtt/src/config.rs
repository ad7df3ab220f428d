// SPDX-FileCopyrightText: 2023 Rivos Inc.
//
// SPDX-License-Identifier: Apache-2.0

use riscv_pages::SupervisorPhysAddr;
use riscv_regs::{mttp32, mttp64, LocalRegisterCopy, MttpHelpers};

use crate::error::{Error, Result};
use crate::profile::{Profile, SMMTT34, SMMTT46, SMMTT56};

/// Width of the hart's physical addresses and of `mttp`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressWidth {
    Rv32,
    Rv64,
}

/// Table walk modes selectable through `mttp`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MttMode {
    /// No table; every access is allowed.
    Bare,
    Smmtt34,
    Smmtt34Rw,
    Smmtt46,
    Smmtt46Rw,
    Smmtt56,
    Smmtt56Rw,
}

impl MttMode {
    /// Returns the number of table levels walked in this mode.
    pub fn level_count(&self) -> usize {
        use MttMode::*;
        match self {
            Bare => 0,
            Smmtt34 | Smmtt34Rw | Smmtt46 | Smmtt46Rw => 2,
            Smmtt56 | Smmtt56Rw => 3,
        }
    }

    /// Returns true for the modes using the combined read/write type encoding, which the uniform
    /// 2-bit permission scheme replaces.
    pub fn is_superseded(&self) -> bool {
        use MttMode::*;
        matches!(self, Smmtt34Rw | Smmtt46Rw | Smmtt56Rw)
    }

    /// Returns the table layout for this mode, or `None` if the mode doesn't walk a table.
    pub fn profile(&self) -> Option<&'static Profile> {
        use MttMode::*;
        match self {
            Smmtt34 => Some(&SMMTT34),
            Smmtt46 => Some(&SMMTT46),
            Smmtt56 => Some(&SMMTT56),
            Bare | Smmtt34Rw | Smmtt46Rw | Smmtt56Rw => None,
        }
    }
}

/// Provides the hart state a walk is configured from.
pub trait MttpSource {
    /// Returns whether the Smmtt extension is enabled on the hart.
    fn extension_enabled(&self) -> bool;

    /// Returns the raw value of `mttp`. For RV32 harts only the low 32 bits may be set.
    fn mttp(&self) -> u64;
}

/// A captured copy of the hart's Smmtt state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MttpSnapshot {
    pub extension_enabled: bool,
    pub mttp: u64,
}

impl MttpSnapshot {
    /// Creates a snapshot of an enabled extension with the given `mttp` value.
    pub fn enabled(mttp: u64) -> Self {
        Self {
            extension_enabled: true,
            mttp,
        }
    }

    /// Creates a snapshot of a hart without the extension enabled.
    pub fn disabled() -> Self {
        Self {
            extension_enabled: false,
            mttp: 0,
        }
    }
}

impl MttpSource for MttpSnapshot {
    fn extension_enabled(&self) -> bool {
        self.extension_enabled
    }

    fn mttp(&self) -> u64 {
        self.mttp
    }
}

impl<T: MttpSource + ?Sized> MttpSource for &T {
    fn extension_enabled(&self) -> bool {
        (**self).extension_enabled()
    }

    fn mttp(&self) -> u64 {
        (**self).mttp()
    }
}

/// A validated `mttp` value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WalkConfig {
    mode: MttMode,
    sdid: u8,
    root: SupervisorPhysAddr,
}

impl WalkConfig {
    /// Decodes `raw` as an `mttp` value for the given address width.
    ///
    /// Fails for undefined or superseded modes and for any set reserved bit.
    pub fn from_mttp(raw: u64, width: AddressWidth) -> Result<Self> {
        let config = match width {
            AddressWidth::Rv32 => Self::from_mttp32(raw)?,
            AddressWidth::Rv64 => Self::from_mttp64(raw)?,
        };
        if config.mode.is_superseded() {
            return Err(Error::SupersededMode(config.mode));
        }
        Ok(config)
    }

    fn from_mttp32(raw: u64) -> Result<Self> {
        let raw32 = u32::try_from(raw).map_err(|_| Error::ReservedMttpBits(raw))?;
        let mttp = LocalRegisterCopy::<u32, mttp32::Register>::new(raw32);
        if mttp.has_reserved_bits() {
            return Err(Error::ReservedMttpBits(raw));
        }
        use mttp32::mode::Value;
        let mode = match mttp.read_as_enum(mttp32::mode) {
            Some(Value::Bare) => MttMode::Bare,
            Some(Value::Smmtt34) => MttMode::Smmtt34,
            Some(Value::Smmtt34Rw) => MttMode::Smmtt34Rw,
            None => return Err(Error::InvalidMode(mttp.read(mttp32::mode) as u64)),
        };
        Ok(Self {
            mode,
            sdid: mttp.sdid(),
            root: mttp.root_pfn().into(),
        })
    }

    fn from_mttp64(raw: u64) -> Result<Self> {
        let mttp = LocalRegisterCopy::<u64, mttp64::Register>::new(raw);
        if mttp.has_reserved_bits() {
            return Err(Error::ReservedMttpBits(raw));
        }
        use mttp64::mode::Value;
        let mode = match mttp.read_as_enum(mttp64::mode) {
            Some(Value::Bare) => MttMode::Bare,
            Some(Value::Smmtt46) => MttMode::Smmtt46,
            Some(Value::Smmtt46Rw) => MttMode::Smmtt46Rw,
            Some(Value::Smmtt56) => MttMode::Smmtt56,
            Some(Value::Smmtt56Rw) => MttMode::Smmtt56Rw,
            None => return Err(Error::InvalidMode(mttp.read(mttp64::mode))),
        };
        Ok(Self {
            mode,
            sdid: mttp.sdid(),
            root: mttp.root_pfn().into(),
        })
    }

    /// Returns the walk mode.
    pub fn mode(&self) -> MttMode {
        self.mode
    }

    /// Returns the supervisor domain ID the table belongs to.
    pub fn sdid(&self) -> u8 {
        self.sdid
    }

    /// Returns the physical address of the root table.
    pub fn root_table(&self) -> SupervisorPhysAddr {
        self.root
    }

    /// Returns the number of levels walked; 0 means no table is consulted.
    pub fn level_count(&self) -> usize {
        self.mode.level_count()
    }

    /// Returns the table layout, or `None` for `Bare`.
    pub fn profile(&self) -> Option<&'static Profile> {
        self.mode.profile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn decode_smmtt46() {
        let config = WalkConfig::from_mttp(0x1000_0000_0008_0000, AddressWidth::Rv64).unwrap();
        assert_eq!(config.mode(), MttMode::Smmtt46);
        assert_eq!(config.root_table().bits(), 0x8000_0000);
        assert_eq!(config.level_count(), 2);
        assert_eq!(config.sdid(), 0);
        assert_eq!(config.profile(), Some(&SMMTT46));
    }

    #[test]
    fn decode_smmtt56_with_sdid() {
        let config = WalkConfig::from_mttp(0x3a80_0000_0009_0000, AddressWidth::Rv64).unwrap();
        assert_eq!(config.mode(), MttMode::Smmtt56);
        assert_eq!(config.sdid(), 0x2a);
        assert_eq!(config.root_table().bits(), 0x9000_0000);
        assert_eq!(config.level_count(), 3);
    }

    #[test]
    fn decode_bare() {
        let config = WalkConfig::from_mttp(0, AddressWidth::Rv64).unwrap();
        assert_eq!(config.mode(), MttMode::Bare);
        assert_eq!(config.level_count(), 0);
        assert!(config.profile().is_none());
    }

    #[test]
    fn decode_smmtt34() {
        let config = WalkConfig::from_mttp(0x4008_0000, AddressWidth::Rv32).unwrap();
        assert_eq!(config.mode(), MttMode::Smmtt34);
        assert_eq!(config.root_table().bits(), 0x8000_0000);
        assert_eq!(config.profile(), Some(&SMMTT34));
    }

    #[test]
    fn undefined_modes() {
        let err = WalkConfig::from_mttp(0x5000_0000_0000_0000, AddressWidth::Rv64).unwrap_err();
        assert_eq!(err, Error::InvalidMode(5));
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(
            WalkConfig::from_mttp(0xc000_0000, AddressWidth::Rv32),
            Err(Error::InvalidMode(3))
        );
    }

    #[test]
    fn superseded_modes() {
        assert_eq!(
            WalkConfig::from_mttp(0x2000_0000_0008_0000, AddressWidth::Rv64),
            Err(Error::SupersededMode(MttMode::Smmtt46Rw))
        );
        assert_eq!(
            WalkConfig::from_mttp(0x4000_0000_0008_0000, AddressWidth::Rv64),
            Err(Error::SupersededMode(MttMode::Smmtt56Rw))
        );
        assert_eq!(
            WalkConfig::from_mttp(0x8000_0000, AddressWidth::Rv32),
            Err(Error::SupersededMode(MttMode::Smmtt34Rw))
        );
    }

    #[test]
    fn reserved_mttp_bits() {
        let raw = 0x1000_1000_0008_0000;
        assert_eq!(
            WalkConfig::from_mttp(raw, AddressWidth::Rv64),
            Err(Error::ReservedMttpBits(raw))
        );
        assert_eq!(
            WalkConfig::from_mttp(0x4048_0000, AddressWidth::Rv32),
            Err(Error::ReservedMttpBits(0x4048_0000))
        );
        // A 64-bit value never fits an RV32 mttp.
        assert_eq!(
            WalkConfig::from_mttp(0x1_4008_0000, AddressWidth::Rv32),
            Err(Error::ReservedMttpBits(0x1_4008_0000))
        );
    }

    #[test]
    fn snapshot_source() {
        let snapshot = MttpSnapshot::enabled(0x1000_0000_0008_0000);
        let by_ref = &snapshot;
        assert!(by_ref.extension_enabled());
        assert_eq!(by_ref.mttp(), 0x1000_0000_0008_0000);
        assert!(!MttpSnapshot::disabled().extension_enabled());
    }
}
