// SPDX-FileCopyrightText: 2023 Rivos Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! This crate interprets the Memory Tracking Table (MTT) of the RISC-V Smmtt extension.
//! The MTT is built by a privileged monitor and consulted on every physical access made by a
//! less privileged hart to decide which of read, write and execute the access may use.
//!
//! The entry point is `TableWalker::resolve()`. The walker decodes `mttp`, reads at most one
//! entry per table level through a `PhysMemoryReader` and fails closed: a malformed or
//! unreadable table denies the access.
#![no_std]

// For testing use the std crate.
#[cfg(test)]
#[macro_use]
extern crate std;

mod config;
mod entry;
mod error;
mod memory;
mod permission;
mod profile;
#[cfg(test)]
mod test_stubs;
mod walker;

pub use config::{AddressWidth, MttMode, MttpSnapshot, MttpSource, WalkConfig};
pub use error::{Error, ErrorKind, Result};
pub use flagset::FlagSet;
pub use memory::{PhysMemoryReader, ReadFault, VolatileMemory};
pub use permission::{all_permissions, Permission, PermissionCodes, PermissionPolicy};
pub use profile::{BitField, L2EntryLayout, MttLevel, Profile, SMMTT34, SMMTT46, SMMTT56};
pub use walker::{Resolution, TableWalker, Walk};
