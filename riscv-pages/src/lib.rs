// Copyright (c) 2022 by Rivos Inc.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! # RiscV physical address types
//!
//! - `SupervisorPhysAddr` is a raw supervisor physical address, as checked against the MTT.
//! - `Pfn` is a page frame number, the form in which table pointers are stored.
//! - `PageSize` names the granules an MTT decision can cover.
#![no_std]

mod page;

pub use page::*;
