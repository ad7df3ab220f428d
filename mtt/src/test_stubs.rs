// SPDX-FileCopyrightText: 2023 Rivos Inc.
//
// SPDX-License-Identifier: Apache-2.0

use core::sync::atomic::{AtomicUsize, Ordering};
use std::collections::{BTreeMap, BTreeSet};

use riscv_pages::SupervisorPhysAddr;

use crate::memory::{PhysMemoryReader, ReadFault};

/// Sparse table memory for tests. Words that were never written read as zero.
#[derive(Default)]
pub struct StubMemory {
    words: BTreeMap<u64, u64>,
    faults: BTreeSet<u64>,
    reads: AtomicUsize,
}

impl StubMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_u64(&mut self, addr: u64, val: u64) {
        self.words.insert(addr, val);
    }

    pub fn set_u32(&mut self, addr: u64, val: u32) {
        self.words.insert(addr, val as u64);
    }

    /// Makes any read of `addr` fault.
    pub fn set_fault(&mut self, addr: u64) {
        self.faults.insert(addr);
    }

    /// Returns the number of reads issued so far, including faulting ones.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    fn read(&self, addr: SupervisorPhysAddr, size: u64) -> Result<u64, ReadFault> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        if !addr.is_aligned_to(size) || self.faults.contains(&addr.bits()) {
            return Err(ReadFault);
        }
        Ok(self.words.get(&addr.bits()).copied().unwrap_or(0))
    }
}

impl PhysMemoryReader for StubMemory {
    fn read_u32(&self, addr: SupervisorPhysAddr) -> Result<u32, ReadFault> {
        self.read(addr, 4).map(|val| val as u32)
    }

    fn read_u64(&self, addr: SupervisorPhysAddr) -> Result<u64, ReadFault> {
        self.read(addr, 8)
    }
}

/// Encodes an RV64 L2 entry.
pub fn l2_entry64(entry_type: u64, info: u64) -> u64 {
    (entry_type << 44) | info
}

/// Encodes an RV32 L2 entry.
pub fn l2_entry32(entry_type: u32, info: u32) -> u32 {
    (entry_type << 22) | info
}

/// Encodes an L3 directory entry pointing at the table at `addr`.
pub fn l3_entry(addr: u64) -> u64 {
    addr >> 12
}
