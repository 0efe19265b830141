use std::fs::File;

use super::Process;
use crate::Error;

/// A running process, read through `/proc/<pid>/mem`.
///
/// Reading requires ptrace access to the process, which is granted to the
/// debugger that is attached to it or to a privileged user.
pub struct LiveProcess {
    pid: u32,
    #[cfg_attr(not(target_os = "linux"), allow(dead_code))]
    memory: File,
}

impl LiveProcess {
    #[cfg(target_os = "linux")]
    pub fn attach(pid: u32) -> crate::Result<Self> {
        let path = format!("/proc/{}/mem", pid);
        let memory = File::open(path).map_err(|e| Error::UnableToOpenProcessMemory(pid, e))?;
        log::info!("Attached to memory of process {}", pid);
        Ok(Self { pid, memory })
    }

    #[cfg(not(target_os = "linux"))]
    pub fn attach(_pid: u32) -> crate::Result<Self> {
        Err(Error::UnsupportedPlatform("Reading live process memory"))
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Checks that `size` bytes from `address` lie in readable mappings of
    /// the process.
    #[cfg(target_os = "linux")]
    fn check_mapped(&self, address: u64, size: usize) -> crate::Result<()> {
        let unreadable = || Error::MemoryReadFailed(address, size);
        let end = address.checked_add(size as u64).ok_or_else(unreadable)?;
        let maps = std::fs::read_to_string(format!("/proc/{}/maps", self.pid)).map_err(|e| {
            log::error!("Reading mappings of process {} failed: {}", self.pid, e);
            unreadable()
        })?;
        // mappings are listed in ascending address order
        let mut covered = address;
        for (start, stop) in maps.lines().filter_map(readable_range) {
            if start <= covered && covered < stop {
                covered = stop;
            }
            if covered >= end {
                return Ok(());
            }
        }
        log::error!(
            "{} bytes at {:#x} are not mapped readable in process {}",
            size,
            address,
            self.pid
        );
        Err(unreadable())
    }
}

/// Address range of a readable line of `/proc/<pid>/maps`.
#[cfg(target_os = "linux")]
fn readable_range(line: &str) -> Option<(u64, u64)> {
    let mut fields = line.split_whitespace();
    let (start, stop) = fields.next()?.split_once('-')?;
    if !fields.next()?.starts_with('r') {
        return None;
    }
    Some((
        u64::from_str_radix(start, 16).ok()?,
        u64::from_str_radix(stop, 16).ok()?,
    ))
}

#[cfg(target_os = "linux")]
impl Process for LiveProcess {
    fn read_memory(&self, address: u64, size: usize) -> crate::Result<Vec<u8>> {
        use std::os::unix::fs::FileExt;

        self.check_mapped(address, size)?;
        let mut buffer = Vec::new();
        buffer.try_reserve_exact(size).map_err(|e| {
            log::error!("Allocating {} bytes failed: {}", size, e);
            Error::MemoryReadFailed(address, size)
        })?;
        buffer.resize(size, 0);
        self.memory.read_exact_at(&mut buffer, address).map_err(|e| {
            log::error!(
                "Reading {} bytes at {:#x} from process {} failed: {}",
                size,
                address,
                self.pid,
                e
            );
            Error::MemoryReadFailed(address, size)
        })?;
        Ok(buffer)
    }
}

#[cfg(not(target_os = "linux"))]
impl Process for LiveProcess {
    fn read_memory(&self, address: u64, size: usize) -> crate::Result<Vec<u8>> {
        Err(Error::MemoryReadFailed(address, size))
    }
}
