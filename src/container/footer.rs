//! Byte-exact `.dcz` footer serialization.
//!
//! Container layout, all integers big-endian:
//!
//! ```text
//!   [body region]     chunk bitstreams in ascending index order; chunk i
//!                     begins at file offset compressed_offset[i]
//!   [footer region]   file-level metadata + chunk metadata array
//!   [last 8 bytes]    u64 offset at which the footer region begins
//! ```
//!
//! Footer region:
//!
//! ```text
//!   off  size  field
//!   0    4     magic 0x44435A46 ("DCZF")
//!   4    4     format version = 1
//!   8    4     filename length L
//!   12   L     filename (UTF-8, no terminator)
//!   12+L 8     original file size
//!   +8   8     original mtime, unix millis
//!   +8   4     chunk size in bytes
//!   +4   32    global SHA-256 (over the per-chunk digests, in order)
//!   +32  4     chunk count N
//!   then N entries of exactly 572 bytes:
//!   0    4     chunk_index
//!   4    8     original_offset
//!   12   4     original_size
//!   16   8     compressed_offset (body region starts at file offset 0)
//!   24   4     compressed_size
//!   28   32    sha256 of the uncompressed chunk
//!   60   512   code_lengths, 256 × u16
//! ```
//!
//! Bit 15 of the first length field flags a stored-uncompressed chunk;
//! legitimate lengths never exceed 32, so the bit is otherwise dead.

use crate::chunk::ChunkDescriptor;
use crate::error::{Error, Result};
use crate::freq::SYMBOL_COUNT;

/// `"DCZF"` big-endian.
pub const DCZ_MAGIC: u32 = 0x4443_5A46;
/// Container format version written and accepted.
pub const FORMAT_VERSION: u32 = 1;
/// Serialized size of one chunk metadata entry.
pub const CHUNK_META_SIZE: usize = 572;
/// Size of the trailing footer pointer.
pub const FOOTER_POINTER_SIZE: usize = 8;
/// Footer size excluding the variable-length filename.
pub const FIXED_FOOTER_SIZE: usize = 68;
/// Stored-uncompressed marker, bit 15 of the symbol-0 length field.
pub const RAW_CHUNK_FLAG: u16 = 0x8000;

/// One chunk's footer entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkMeta {
    pub index: u32,
    pub original_offset: u64,
    pub original_size: u32,
    pub compressed_offset: u64,
    pub compressed_size: u32,
    pub sha256: [u8; 32],
    /// Stored length fields with [`RAW_CHUNK_FLAG`] already masked out.
    pub code_lengths: [u16; SYMBOL_COUNT],
    pub stored_raw: bool,
}

impl ChunkMeta {
    /// View handed to the chunk decoder.
    pub fn descriptor(&self) -> ChunkDescriptor<'_> {
        ChunkDescriptor {
            index: self.index,
            original_size: self.original_size,
            code_lengths: &self.code_lengths,
            stored_raw: self.stored_raw,
            sha256: &self.sha256,
        }
    }
}

/// Parsed footer region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footer {
    pub filename: String,
    pub original_size: u64,
    pub original_mtime_ms: u64,
    pub chunk_size: u32,
    pub global_sha256: [u8; 32],
    pub chunks: Vec<ChunkMeta>,
}

impl Footer {
    pub fn serialized_len(&self) -> usize {
        FIXED_FOOTER_SIZE + self.filename.len() + self.chunks.len() * CHUNK_META_SIZE
    }

    /// Serializes the footer region (without the trailing pointer).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.serialized_len());
        out.extend_from_slice(&DCZ_MAGIC.to_be_bytes());
        out.extend_from_slice(&FORMAT_VERSION.to_be_bytes());
        out.extend_from_slice(&(self.filename.len() as u32).to_be_bytes());
        out.extend_from_slice(self.filename.as_bytes());
        out.extend_from_slice(&self.original_size.to_be_bytes());
        out.extend_from_slice(&self.original_mtime_ms.to_be_bytes());
        out.extend_from_slice(&self.chunk_size.to_be_bytes());
        out.extend_from_slice(&self.global_sha256);
        out.extend_from_slice(&(self.chunks.len() as u32).to_be_bytes());
        for m in &self.chunks {
            out.extend_from_slice(&m.index.to_be_bytes());
            out.extend_from_slice(&m.original_offset.to_be_bytes());
            out.extend_from_slice(&m.original_size.to_be_bytes());
            out.extend_from_slice(&m.compressed_offset.to_be_bytes());
            out.extend_from_slice(&m.compressed_size.to_be_bytes());
            out.extend_from_slice(&m.sha256);
            for (s, &len) in m.code_lengths.iter().enumerate() {
                let field = if s == 0 && m.stored_raw {
                    len | RAW_CHUNK_FLAG
                } else {
                    len
                };
                out.extend_from_slice(&field.to_be_bytes());
            }
        }
        debug_assert_eq!(out.len(), self.serialized_len());
        out
    }

    /// Parses and validates a footer region.
    pub fn parse(buf: &[u8]) -> Result<Footer> {
        let mut c = Cursor { buf, pos: 0 };
        if c.u32()? != DCZ_MAGIC {
            return Err(Error::BadFormat("bad magic"));
        }
        if c.u32()? != FORMAT_VERSION {
            return Err(Error::BadFormat("unsupported format version"));
        }
        let name_len = c.u32()? as usize;
        let filename = String::from_utf8(c.bytes(name_len)?.to_vec())
            .map_err(|_| Error::BadFormat("filename is not UTF-8"))?;
        let original_size = c.u64()?;
        let original_mtime_ms = c.u64()?;
        let chunk_size = c.u32()?;
        let mut global_sha256 = [0u8; 32];
        global_sha256.copy_from_slice(c.bytes(32)?);
        let chunk_count = c.u32()? as usize;

        if buf.len() - c.pos != chunk_count * CHUNK_META_SIZE {
            return Err(Error::BadFormat("chunk metadata size mismatch"));
        }

        let mut chunks = Vec::with_capacity(chunk_count);
        for i in 0..chunk_count {
            let index = c.u32()?;
            if index as usize != i {
                return Err(Error::BadFormat("chunk index out of order"));
            }
            let original_offset = c.u64()?;
            let original_size = c.u32()?;
            let compressed_offset = c.u64()?;
            let compressed_size = c.u32()?;
            let mut sha256 = [0u8; 32];
            sha256.copy_from_slice(c.bytes(32)?);
            let mut code_lengths = [0u16; SYMBOL_COUNT];
            for slot in code_lengths.iter_mut() {
                *slot = c.u16()?;
            }
            let stored_raw = code_lengths[0] & RAW_CHUNK_FLAG != 0;
            code_lengths[0] &= !RAW_CHUNK_FLAG;
            chunks.push(ChunkMeta {
                index,
                original_offset,
                original_size,
                compressed_offset,
                compressed_size,
                sha256,
                code_lengths,
                stored_raw,
            });
        }

        Ok(Footer {
            filename,
            original_size,
            original_mtime_ms,
            chunk_size,
            global_sha256,
            chunks,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Bounds-checked big-endian cursor
// ─────────────────────────────────────────────────────────────────────────────

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&e| e <= self.buf.len())
            .ok_or(Error::BadFormat("footer truncated"))?;
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn u16(&mut self) -> Result<u16> {
        let b = self.bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u64(&mut self) -> Result<u64> {
        let b = self.bytes(8)?;
        let mut a = [0u8; 8];
        a.copy_from_slice(b);
        Ok(u64::from_be_bytes(a))
    }
}
