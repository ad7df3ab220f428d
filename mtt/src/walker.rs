// SPDX-FileCopyrightText: 2023 Rivos Inc.
//
// SPDX-License-Identifier: Apache-2.0

use flagset::FlagSet;
use log::{debug, warn};
use riscv_pages::{PageSize, SupervisorPhysAddr};
use riscv_regs::PrivilegeLevel;

use crate::config::{AddressWidth, MttpSource, WalkConfig};
use crate::entry::{self, Decoded};
use crate::error::{Error, Result};
use crate::memory::PhysMemoryReader;
use crate::permission::{all_permissions, Permission, PermissionPolicy};
use crate::profile::{MttLevel, Profile};

/// The outcome of checking one access against the MTT.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// True if every requested permission is allowed.
    pub granted: bool,
    /// The permissions the table allows for the address.
    pub allowed: FlagSet<Permission>,
    /// The size of the naturally aligned range the decision applies to, if a table entry
    /// decided it.
    pub granule: Option<PageSize>,
}

impl Resolution {
    /// A resolution that denies everything.
    pub fn denied() -> Self {
        Self {
            granted: false,
            allowed: FlagSet::default(),
            granule: None,
        }
    }

    fn unrestricted() -> Self {
        Self {
            granted: true,
            allowed: all_permissions(),
            granule: None,
        }
    }
}

/// The terminal result of a successful walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Walk {
    /// Permissions found in the table, before any policy is applied.
    pub allowed: FlagSet<Permission>,
    /// The level of the terminal entry; `None` if no table was walked.
    pub level: Option<MttLevel>,
    /// The size of the range covered by the terminal entry or code.
    pub granule: Option<PageSize>,
}

/// Walks the MTT held in the memory read through `M`.
///
/// The walker keeps no state between walks; every entry is read fresh.
pub struct TableWalker<M> {
    memory: M,
    width: AddressWidth,
    policy: PermissionPolicy,
}

impl<M: PhysMemoryReader> TableWalker<M> {
    /// Creates a walker for harts with the given address width, applying the strict
    /// permission policy.
    pub fn new(memory: M, width: AddressWidth) -> Self {
        Self {
            memory,
            width,
            policy: PermissionPolicy::STRICT,
        }
    }

    /// Returns the walker with `policy` applied to every walk.
    pub fn with_policy(self, policy: PermissionPolicy) -> Self {
        Self { policy, ..self }
    }

    /// Returns the memory the tables are read from.
    pub fn memory(&self) -> &M {
        &self.memory
    }

    /// Returns the address width `mttp` values are decoded for.
    pub fn width(&self) -> AddressWidth {
        self.width
    }

    /// Returns the permission policy.
    pub fn policy(&self) -> PermissionPolicy {
        self.policy
    }

    /// Checks an access of `size` bytes at `addr` requesting `requested` against the MTT
    /// configured by `source`.
    ///
    /// Machine mode and harts without the extension enabled bypass the table. Any error
    /// denies the access with no permissions. `size` is only used to note accesses that
    /// straddle the decided granule; such accesses are not split.
    pub fn resolve(
        &self,
        source: &impl MttpSource,
        addr: SupervisorPhysAddr,
        size: u64,
        requested: FlagSet<Permission>,
        privilege: PrivilegeLevel,
    ) -> Resolution {
        if !source.extension_enabled() || privilege.is_machine() {
            return Resolution::unrestricted();
        }
        let walk = WalkConfig::from_mttp(source.mttp(), self.width)
            .and_then(|config| self.walk(&config, addr));
        let walk = match walk {
            Ok(walk) => walk,
            Err(e) => {
                warn!("MTT denied access to {:#x}: {}", addr, e);
                return Resolution::denied();
            }
        };
        if let Some(granule) = walk.granule {
            if granule.crosses_boundary(addr.bits(), size) {
                debug!(
                    "MTT access of {} bytes at {:#x} crosses a {:?} granule",
                    size, addr, granule
                );
            }
        }
        let allowed = self.policy.apply(walk.allowed);
        Resolution {
            granted: allowed.contains(requested),
            allowed,
            granule: walk.granule,
        }
    }

    /// Walks the table described by `config` for `addr`, returning the permissions encoded
    /// in the table or the reason the walk failed.
    pub fn walk(&self, config: &WalkConfig, addr: SupervisorPhysAddr) -> Result<Walk> {
        let Some(profile) = config.profile() else {
            // Bare: there's no table to consult.
            return Ok(Walk {
                allowed: all_permissions(),
                level: None,
                granule: None,
            });
        };
        if addr.bits() >> profile.pa_bits() != 0 {
            return Err(Error::AddressOutOfRange(addr.bits()));
        }

        let mut table = config.root_table();
        let mut level = Some(profile.root_level());
        while let Some(current) = level {
            let raw = self.read_entry(profile, current, table, addr)?;
            let (allowed, granule) = match entry::decode(profile, current, addr.bits(), raw)? {
                Decoded::Directory(next) => {
                    table = next;
                    level = current.next();
                    continue;
                }
                Decoded::Region(allowed) => (allowed, profile.region_size()),
                Decoded::Bitmap(allowed) if current.is_leaf() => (allowed, PageSize::Size4k),
                Decoded::Bitmap(allowed) => (allowed, profile.super_page_size()),
            };
            return Ok(Walk {
                allowed,
                level: Some(current),
                granule: Some(granule),
            });
        }
        Err(Error::LevelsExhausted)
    }

    // Reads the entry `addr` selects from the table at `table`.
    fn read_entry(
        &self,
        profile: &Profile,
        level: MttLevel,
        table: SupervisorPhysAddr,
        addr: SupervisorPhysAddr,
    ) -> Result<u64> {
        let index = profile
            .table_index(level)
            .ok_or(Error::LevelsExhausted)?
            .extract(addr.bits());
        let entry_addr = table
            .checked_increment(index * profile.entry_bytes())
            .ok_or(Error::MemoryRead {
                level,
                addr: table.bits(),
            })?;
        let fault = |_| Error::MemoryRead {
            level,
            addr: entry_addr.bits(),
        };
        match profile.width() {
            AddressWidth::Rv32 => self.memory.read_u32(entry_addr).map(u64::from).map_err(fault),
            AddressWidth::Rv64 => self.memory.read_u64(entry_addr).map_err(fault),
        }
    }
}
