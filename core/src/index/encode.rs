use byteorder::{LittleEndian, WriteBytesExt};

use crate::constants::{
    chunk_ids, index_markers::{HEADER, MAX_ENTRIES, TRAILER}, CHUNK_HEADER_SIZE, MAX_CHUNK_SIZE,
};
use crate::index::types::{Index, IndexError};
use crate::utils::append_varint;

impl Index {
    /// Serialize as a complete index chunk.
    ///
    /// Layout:
    ///
    /// ```text
    /// [ 0x99 ][ chunk length (3) ]
    /// [ "s2idx\0" ]
    /// [ varint total uncompressed ][ varint total compressed ]
    /// [ varint estimated block size ][ varint entry count ]
    /// [ has uncompressed offsets (1) ]
    /// [ varint uncompressed deltas ]?  [ varint compressed deltas ]
    /// [ total size u32 LE ][ "\0xdi2s" ]
    /// ```
    pub fn save(&self) -> Result<Vec<u8>, IndexError> {
        let mut out = Vec::with_capacity(32 + self.entries.len() * 4);
        self.append_to(&mut out)?;
        Ok(out)
    }

    /// Append the serialized chunk to `out`, returning its length.
    pub fn append_to(&self, out: &mut Vec<u8>) -> Result<usize, IndexError> {
        if self.entries.len() > MAX_ENTRIES {
            return Err(IndexError::TooManyEntries(self.entries.len()));
        }
        let start = out.len();
        out.extend_from_slice(&[chunk_ids::INDEX, 0, 0, 0]);
        out.extend_from_slice(&HEADER);
        append_varint(out, self.total_uncompressed);
        append_varint(out, self.total_compressed);
        append_varint(out, self.est_block_uncomp);
        append_varint(out, self.entries.len() as i64);

        // Uncompressed offsets are implied when every block has the estimated size.
        let implied = self.entries.iter().enumerate().all(|(i, e)| match i {
            0 => e.uncompressed == 0,
            _ => e.uncompressed == self.entries[i - 1].uncompressed + self.est_block_uncomp,
        });
        out.push(u8::from(!implied));
        if !implied {
            for (i, e) in self.entries.iter().enumerate() {
                let mut delta = e.uncompressed;
                if i > 0 {
                    delta -= self.entries[i - 1].uncompressed + self.est_block_uncomp;
                }
                append_varint(out, delta);
            }
        }

        let mut predict = self.est_block_uncomp / 2;
        for (i, e) in self.entries.iter().enumerate() {
            let mut delta = e.compressed;
            if i > 0 {
                delta -= self.entries[i - 1].compressed + predict;
                predict += delta / 2;
            }
            append_varint(out, delta);
        }

        let total = out.len() - start + 4 + TRAILER.len();
        let chunk_len = total - CHUNK_HEADER_SIZE;
        if chunk_len > MAX_CHUNK_SIZE {
            out.truncate(start);
            return Err(IndexError::TooManyEntries(self.entries.len()));
        }
        out.write_u32::<LittleEndian>(total as u32)
            .map_err(|_| IndexError::Corrupt("size write"))?;
        out.extend_from_slice(&TRAILER);
        out[start + 1..start + 4].copy_from_slice(&(chunk_len as u32).to_le_bytes()[..3]);
        Ok(total)
    }
}
