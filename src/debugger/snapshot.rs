use std::{fs, path::Path};

use super::Process;
use crate::Error;

struct MemoryRegion {
    base: u64,
    bytes: Vec<u8>,
}

impl MemoryRegion {
    fn slice(&self, address: u64, size: usize) -> Option<&[u8]> {
        let offset = usize::try_from(address.checked_sub(self.base)?).ok()?;
        let end = offset.checked_add(size)?;
        self.bytes.get(offset..end)
    }
}

/// Captured memory of a debuggee, made of disjoint regions.
#[derive(Default)]
pub struct MemorySnapshot {
    regions: Vec<MemoryRegion>,
}

impl MemorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a raw memory dump that was taken starting at `base`.
    pub fn from_dump_file(path: &Path, base: u64) -> crate::Result<Self> {
        let bytes = fs::read(path)
            .map_err(|e| Error::UnableToReadDumpFile(path.display().to_string(), e))?;
        log::info!(
            "Loaded {} bytes from '{}' at {:#x}",
            bytes.len(),
            path.display(),
            base
        );
        let mut snapshot = Self::new();
        snapshot.add_region(base, bytes);
        Ok(snapshot)
    }

    pub fn add_region(&mut self, base: u64, bytes: Vec<u8>) -> &mut Self {
        self.regions.push(MemoryRegion { base, bytes });
        self
    }
}

impl Process for MemorySnapshot {
    fn read_memory(&self, address: u64, size: usize) -> crate::Result<Vec<u8>> {
        self.regions
            .iter()
            .find_map(|region| region.slice(address, size))
            .map(<[u8]>::to_vec)
            .ok_or(Error::MemoryReadFailed(address, size))
    }
}
