// SPDX-FileCopyrightText: 2023 Rivos Inc.
//
// SPDX-License-Identifier: Apache-2.0

use riscv_pages::SupervisorPhysAddr;

/// The word at the requested address couldn't be read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadFault;

/// Reads naturally aligned words of physical memory holding the MTT.
pub trait PhysMemoryReader {
    /// Reads the 32-bit word at `addr`.
    fn read_u32(&self, addr: SupervisorPhysAddr) -> Result<u32, ReadFault>;

    /// Reads the 64-bit word at `addr`.
    fn read_u64(&self, addr: SupervisorPhysAddr) -> Result<u64, ReadFault>;
}

impl<T: PhysMemoryReader + ?Sized> PhysMemoryReader for &T {
    fn read_u32(&self, addr: SupervisorPhysAddr) -> Result<u32, ReadFault> {
        (**self).read_u32(addr)
    }

    fn read_u64(&self, addr: SupervisorPhysAddr) -> Result<u64, ReadFault> {
        (**self).read_u64(addr)
    }
}

/// An identity-mapped window of physical memory.
///
/// Reads outside `[base, base + len)` or not aligned to their width fault.
#[derive(Debug)]
pub struct VolatileMemory {
    base: u64,
    len: u64,
}

impl VolatileMemory {
    /// Creates a reader for the `len` bytes of memory starting at `base`.
    ///
    /// # Safety
    ///
    /// The caller must guarantee that the range is mapped at its physical address, readable
    /// and remains so for the lifetime of the returned reader.
    pub unsafe fn new(base: SupervisorPhysAddr, len: u64) -> Self {
        Self {
            base: base.bits(),
            len,
        }
    }

    /// Returns the first address of the window.
    pub fn base(&self) -> SupervisorPhysAddr {
        SupervisorPhysAddr::supervisor(self.base)
    }

    /// Returns the size of the window in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns true if the window is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn contains(&self, addr: SupervisorPhysAddr, size: u64) -> bool {
        let Some(offset) = addr.bits().checked_sub(self.base) else {
            return false;
        };
        offset
            .checked_add(size)
            .map_or(false, |end| end <= self.len)
    }

    fn read_volatile<T: Copy>(&self, addr: SupervisorPhysAddr) -> Result<T, ReadFault> {
        let size = core::mem::size_of::<T>() as u64;
        if !addr.is_aligned_to(size) || !self.contains(addr, size) {
            return Err(ReadFault);
        }
        // Safety: The window is mapped and readable per the contract of `new()`, and `addr` was
        // checked to be aligned and within it.
        Ok(unsafe { core::ptr::read_volatile(addr.bits() as *const T) })
    }
}

impl PhysMemoryReader for VolatileMemory {
    fn read_u32(&self, addr: SupervisorPhysAddr) -> Result<u32, ReadFault> {
        self.read_volatile(addr)
    }

    fn read_u64(&self, addr: SupervisorPhysAddr) -> Result<u64, ReadFault> {
        self.read_volatile(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    fn leaked_window(words: &[u64]) -> VolatileMemory {
        let backing: &'static mut [u64] = Vec::from(words).leak();
        // Not safe - just a test
        unsafe {
            VolatileMemory::new(
                SupervisorPhysAddr::supervisor(backing.as_ptr() as u64),
                core::mem::size_of_val(backing) as u64,
            )
        }
    }

    #[test]
    fn reads_in_window() {
        let mem = leaked_window(&[0x1122_3344_5566_7788, 0xdead_beef]);
        let base = mem.base();
        assert_eq!(mem.read_u64(base), Ok(0x1122_3344_5566_7788));
        assert_eq!(mem.read_u64(base.checked_increment(8).unwrap()), Ok(0xdead_beef));
        if cfg!(target_endian = "little") {
            assert_eq!(mem.read_u32(base), Ok(0x5566_7788));
            assert_eq!(mem.read_u32(base.checked_increment(4).unwrap()), Ok(0x1122_3344));
        }
        assert_eq!(mem.len(), 16);
        assert!(!mem.is_empty());
    }

    #[test]
    fn faults_outside_window() {
        let mem = leaked_window(&[0; 2]);
        let base = mem.base();
        assert_eq!(mem.read_u64(base.checked_increment(16).unwrap()), Err(ReadFault));
        assert_eq!(mem.read_u32(base.checked_increment(16).unwrap()), Err(ReadFault));
        assert_eq!(
            mem.read_u64(SupervisorPhysAddr::supervisor(base.bits() - 8)),
            Err(ReadFault)
        );
    }

    #[test]
    fn faults_misaligned() {
        let mem = leaked_window(&[0; 2]);
        let base = mem.base();
        assert_eq!(mem.read_u64(base.checked_increment(4).unwrap()), Err(ReadFault));
        assert_eq!(mem.read_u32(base.checked_increment(2).unwrap()), Err(ReadFault));
    }

    #[test]
    fn read_through_reference() {
        let mem = leaked_window(&[7]);
        let reader: &dyn PhysMemoryReader = &mem;
        assert_eq!(reader.read_u64(mem.base()), Ok(7));
    }
}
