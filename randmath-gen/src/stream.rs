//! Deterministic pseudorandom byte stream
//!
//! A 32-byte buffer seeded from the block height. When a read would run
//! past the end, the whole buffer is replaced by a one-way hash of its
//! current contents and the cursor resets. The cursor starts past the end,
//! so the first read always hashes the seed before any byte is handed out.
//!
//! The refresh hash is an injected dependency: protocol deployments pin a
//! specific function, and everything downstream (the generated programs)
//! depends bit-for-bit on its output.

use randmath_spec::variant::{SALT_BYTE_INDEX, SALT_BYTE_VALUE};
use randmath_spec::Variant;
use sha2::{Digest, Sha256};

/// Size of the stream buffer in bytes. The refresh hash must produce
/// exactly this many bytes.
pub const STREAM_BUFFER_SIZE: usize = 32;

/// One-way refresh function for the byte stream.
pub trait StreamHash {
    /// Replace `data` with a hash of its current contents.
    fn refresh(&self, data: &mut [u8; STREAM_BUFFER_SIZE]);
}

/// Default refresh function based on SHA-256, whose digest width matches
/// the buffer exactly.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Refresh;

impl StreamHash for Sha256Refresh {
    fn refresh(&self, data: &mut [u8; STREAM_BUFFER_SIZE]) {
        let digest = Sha256::digest(&data[..]);
        data.copy_from_slice(&digest);
    }
}

/// Deterministic byte source for one generation run.
///
/// Identical `(height, variant, hash)` inputs always yield identical byte
/// sequences; this determinism is load-bearing for protocol verifiability.
pub struct ByteStream<'h, H: StreamHash> {
    data: [u8; STREAM_BUFFER_SIZE],
    index: usize,
    hasher: &'h H,
}

impl<'h, H: StreamHash> ByteStream<'h, H> {
    /// Seed the stream from a block height.
    ///
    /// The height is encoded as 8 little-endian bytes and zero-padded; the
    /// salted variant then overwrites its salt byte. The cursor starts past
    /// the last byte so the first read triggers a full refresh.
    pub fn new(height: u64, variant: Variant, hasher: &'h H) -> Self {
        let mut data = [0u8; STREAM_BUFFER_SIZE];
        data[..8].copy_from_slice(&height.to_le_bytes());
        if variant == Variant::Salted {
            data[SALT_BYTE_INDEX] = SALT_BYTE_VALUE;
        }
        Self {
            data,
            index: STREAM_BUFFER_SIZE,
            hasher,
        }
    }

    /// Guarantee at least `n` unread bytes remain, refreshing if not.
    pub fn ensure(&mut self, n: usize) {
        debug_assert!(n <= STREAM_BUFFER_SIZE);
        if self.index + n > STREAM_BUFFER_SIZE {
            self.hasher.refresh(&mut self.data);
            self.index = 0;
        }
    }

    /// Read the next byte.
    pub fn next_byte(&mut self) -> u8 {
        self.ensure(1);
        let byte = self.data[self.index];
        self.index += 1;
        byte
    }

    /// Read the next 4 bytes as a little-endian u32.
    pub fn next_u32_le(&mut self) -> u32 {
        self.ensure(4);
        let bytes = [
            self.data[self.index],
            self.data[self.index + 1],
            self.data[self.index + 2],
            self.data[self.index + 3],
        ];
        self.index += 4;
        u32::from_le_bytes(bytes)
    }
}
