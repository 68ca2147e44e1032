//! Table-based canonical decoding.
//!
//! The decoder is rebuilt from code lengths alone. Every code no longer
//! than the table width resolves in one probe of a direct lookup table;
//! longer codes (possible only when the encoder's length limit exceeds the
//! configured table width) fall back to the canonical bit-walk, which
//! needs only the per-length first-code and symbol arrays.

use crate::bitio::BitReader;
use crate::freq::SYMBOL_COUNT;
use crate::huffman::canonical::assign_codes;
use crate::huffman::{CodebookError, CodeLengths, MODEL_MAX_CODE_LEN};

/// Widest supported direct-lookup table (2^16 entries, 128 KiB).
pub const MAX_TABLE_BITS: u32 = 16;

const LEN_SLOTS: usize = MODEL_MAX_CODE_LEN as usize + 1;

/// Symbol-lookup structure for one chunk's code.
pub struct DecodeTable {
    /// Lookup width K: one probe resolves any code of ≤ K bits.
    bits: u32,
    /// `2^bits` entries of `(len << 8) | symbol`; 0 marks an unused prefix.
    lut: Vec<u16>,
    /// Canonical walk state, indexed by length.
    first_code: [u32; LEN_SLOTS],
    count: [u32; LEN_SLOTS],
    sym_base: [u32; LEN_SLOTS],
    /// Symbols in ascending (length, symbol) order.
    syms: Vec<u8>,
    max_len: u8,
}

impl DecodeTable {
    /// Rebuilds the codebook from `lengths` and lays out the lookup table.
    ///
    /// `table_bits` is clamped to `1..=`[`MAX_TABLE_BITS`]. Tables narrower
    /// than the longest code still decode through the fallback walk.
    pub fn new(lengths: &CodeLengths, table_bits: u32) -> Result<Self, CodebookError> {
        let code = assign_codes(lengths)?;
        let bits = table_bits.clamp(1, MAX_TABLE_BITS);

        let mut first_code = [0u32; LEN_SLOTS];
        let mut count = [0u32; LEN_SLOTS];
        let mut sym_base = [0u32; LEN_SLOTS];
        let mut syms = Vec::new();
        let mut max_len = 0u8;
        for s in 0..SYMBOL_COUNT {
            let l = lengths[s];
            if l > 0 {
                count[l as usize] += 1;
                max_len = max_len.max(l);
            }
        }
        for l in 1..LEN_SLOTS {
            if l > 1 {
                first_code[l] = (first_code[l - 1] + count[l - 1]) << 1;
            }
            sym_base[l] = syms.len() as u32;
            for s in 0..SYMBOL_COUNT {
                if lengths[s] as usize == l {
                    syms.push(s as u8);
                }
            }
        }

        let mut lut = vec![0u16; 1usize << bits];
        for s in 0..SYMBOL_COUNT {
            let l = lengths[s] as u32;
            if l == 0 || l > bits {
                continue;
            }
            let prefix = (code.code(s as u8) << (bits - l)) as usize;
            let span = 1usize << (bits - l);
            let entry = ((l as u16) << 8) | s as u16;
            for slot in &mut lut[prefix..prefix + span] {
                *slot = entry;
            }
        }

        Ok(DecodeTable {
            bits,
            lut,
            first_code,
            count,
            sym_base,
            syms,
            max_len,
        })
    }

    /// Lookup width actually in use.
    pub fn table_bits(&self) -> u32 {
        self.bits
    }

    /// Decodes one symbol, advancing the reader past its code.
    ///
    /// Returns `None` when no canonical code matches the upcoming bits —
    /// corrupt input, or a probe into zero padding that does not spell a
    /// valid code.
    pub fn decode(&self, r: &mut BitReader<'_>) -> Option<u8> {
        let probe = self.lut[r.peek_bits(self.bits).ok()? as usize];
        if probe != 0 {
            r.skip_bits((probe >> 8) as u32);
            return Some((probe & 0xFF) as u8);
        }
        // Code longer than the table width: canonical walk, one bit at a
        // time, matching against each length's code block.
        let mut codeword: u32 = 0;
        for l in 1..=self.max_len as usize {
            codeword = (codeword << 1) | r.read_bit();
            let c = self.count[l];
            if c > 0 && codeword >= self.first_code[l] && codeword - self.first_code[l] < c {
                let at = self.sym_base[l] + (codeword - self.first_code[l]);
                return Some(self.syms[at as usize]);
            }
        }
        None
    }
}
