// Copyright (c) 2022 by Rivos Inc.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Tock Register layouts for the Smmtt CSRs.

pub mod defs;

pub use tock_registers::LocalRegisterCopy;

pub use defs::*;
