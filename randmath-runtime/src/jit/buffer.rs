//! Executable memory management.
//!
//! Generated machine code lives in an anonymous private mapping that moves
//! through a one-way lifecycle: writable while code is being emitted, then
//! sealed read+execute before the first call. The two phases are tracked
//! explicitly so that a write after sealing is a typed error instead of a
//! segfault, and the mapping is never writable and executable at the same
//! time.

use crate::error::{Result, RuntimeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BufferState {
    Writable,
    Executable,
}

/// An append-only buffer of machine code backed by an mmap'd region.
///
/// `write` appends while the buffer is in its writable phase; `freeze`
/// flips page protection to read+execute and permanently ends that phase.
/// The mapping is unmapped on drop.
pub struct ExecutableBuffer {
    ptr: *mut u8,
    len: usize,
    capacity: usize,
    state: BufferState,
}

// The buffer owns its mapping exclusively, so it can move between threads.
// Deliberately not Sync: the compiling worker owns its code region, and
// cross-thread sharing requires external synchronization.
unsafe impl Send for ExecutableBuffer {}

impl ExecutableBuffer {
    #[cfg(unix)]
    pub fn new(capacity: usize) -> Result<Self> {
        use std::ptr;

        // Round up to page size.
        let page_size = 4096;
        let capacity = (capacity + page_size - 1) & !(page_size - 1);

        // SAFETY: anonymous private mapping, initially read+write only.
        let ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                capacity,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };

        if ptr == libc::MAP_FAILED {
            return Err(RuntimeError::ExecMapFailed { size: capacity });
        }

        Ok(Self {
            ptr: ptr as *mut u8,
            len: 0,
            capacity,
            state: BufferState::Writable,
        })
    }

    #[cfg(not(unix))]
    pub fn new(_capacity: usize) -> Result<Self> {
        Err(RuntimeError::UnsupportedPlatform)
    }

    /// Appends raw machine code bytes.
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if self.state != BufferState::Writable {
            return Err(RuntimeError::BufferFrozen);
        }
        if self.len + bytes.len() > self.capacity {
            return Err(RuntimeError::CodeCapacityExceeded {
                used: self.len,
                requested: bytes.len(),
                capacity: self.capacity,
            });
        }

        // SAFETY: bounds checked above; the region is mapped read+write.
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), self.ptr.add(self.len), bytes.len());
        }
        self.len += bytes.len();
        Ok(())
    }

    /// Seals the buffer: page protection becomes read+execute and all
    /// further writes fail with [`RuntimeError::BufferFrozen`].
    #[cfg(unix)]
    pub fn freeze(&mut self) -> Result<()> {
        if self.state == BufferState::Executable {
            return Ok(());
        }

        let result = unsafe {
            libc::mprotect(
                self.ptr as *mut libc::c_void,
                self.capacity,
                libc::PROT_READ | libc::PROT_EXEC,
            )
        };

        if result != 0 {
            return Err(RuntimeError::ExecMapFailed {
                size: self.capacity,
            });
        }
        self.state = BufferState::Executable;
        Ok(())
    }

    #[cfg(not(unix))]
    pub fn freeze(&mut self) -> Result<()> {
        Err(RuntimeError::UnsupportedPlatform)
    }

    /// Entry point of the generated code. Only meaningful once frozen.
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr
    }

    pub fn is_executable(&self) -> bool {
        self.state == BufferState::Executable
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Drop for ExecutableBuffer {
    #[cfg(unix)]
    fn drop(&mut self) {
        // SAFETY: ptr/capacity came from a successful mmap in `new`.
        unsafe {
            libc::munmap(self.ptr as *mut libc::c_void, self.capacity);
        }
    }

    #[cfg(not(unix))]
    fn drop(&mut self) {}
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_len() {
        let mut buf = ExecutableBuffer::new(4096).unwrap();
        assert!(buf.is_empty());
        buf.write(&[0xC3]).unwrap();
        buf.write(&[0x90, 0x90]).unwrap();
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn test_capacity_is_enforced() {
        let mut buf = ExecutableBuffer::new(4096).unwrap();
        let chunk = vec![0x90u8; 4096];
        buf.write(&chunk).unwrap();
        let err = buf.write(&[0xC3]).unwrap_err();
        match err {
            RuntimeError::CodeCapacityExceeded {
                used,
                requested,
                capacity,
            } => {
                assert_eq!(used, 4096);
                assert_eq!(requested, 1);
                assert_eq!(capacity, 4096);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_write_after_freeze_is_rejected() {
        let mut buf = ExecutableBuffer::new(4096).unwrap();
        buf.write(&[0xC3]).unwrap();
        buf.freeze().unwrap();
        assert!(buf.is_executable());
        assert!(matches!(
            buf.write(&[0x90]),
            Err(RuntimeError::BufferFrozen)
        ));
    }

    #[test]
    fn test_freeze_is_idempotent() {
        let mut buf = ExecutableBuffer::new(4096).unwrap();
        buf.write(&[0xC3]).unwrap();
        buf.freeze().unwrap();
        buf.freeze().unwrap();
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_frozen_code_is_callable() {
        let mut buf = ExecutableBuffer::new(4096).unwrap();
        buf.write(&[0xC3]).unwrap(); // ret
        buf.freeze().unwrap();
        let f: extern "C" fn() = unsafe { std::mem::transmute(buf.as_ptr()) };
        f();
    }
}
