// Copyright (c) 2021 by Rivos Inc.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

#![no_std]
#![allow(missing_docs)]

//! Crate for handling the RISC-V registers consulted by the Smmtt extension.
//! csrs - `mttp` field layouts for RV32 and RV64
//! privilege - hart privilege levels

mod csrs;
mod privilege;

pub use csrs::*;
pub use privilege::*;
