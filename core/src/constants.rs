//! Stream-level constants shared by the framing, writer, reader and index layers.

/// Stream identifier payload written at the start of every S2 stream.
pub const MAGIC_BODY: [u8; 6] = *b"S2sTwO";
/// Stream identifier payload used by the Snappy framing format.
pub const MAGIC_BODY_SNAPPY: [u8; 6] = *b"sNaPpY";

/// Chunk header: 1 byte type + 3 byte little-endian length.
pub const CHUNK_HEADER_SIZE: usize = 4;
/// Masked CRC-32C that prefixes every data chunk payload.
pub const CHECKSUM_SIZE: usize = 4;
/// Largest length representable in a chunk header.
pub const MAX_CHUNK_SIZE: usize = (1 << 24) - 1;

/// Default uncompressed block size.
pub const DEFAULT_BLOCK_SIZE: usize = 1 << 20; // 1 MiB
/// Smallest block size a writer may be configured with.
pub const MIN_BLOCK_SIZE: usize = 4 << 10; // 4 KiB
/// Largest block size for S2 streams.
pub const MAX_BLOCK_SIZE: usize = 4 << 20; // 4 MiB
/// Largest block size a Snappy framed stream may carry.
pub const MAX_SNAPPY_BLOCK_SIZE: usize = 1 << 16; // 64 KiB

/// Largest padding multiple accepted by the writer.
pub const MAX_PADDING: usize = MAX_BLOCK_SIZE;

/// Chunk type identifiers.
pub mod chunk_ids {
    pub const COMPRESSED_DATA: u8 = 0x00;
    pub const UNCOMPRESSED_DATA: u8 = 0x01;
    pub const INDEX: u8 = 0x99;
    pub const PADDING: u8 = 0xfe;
    pub const STREAM_IDENTIFIER: u8 = 0xff;

    /// Reserved chunk types that a reader must refuse.
    pub const RESERVED_UNSKIPPABLE: std::ops::RangeInclusive<u8> = 0x02..=0x7f;
    /// Reserved chunk types that a reader skips.
    pub const RESERVED_SKIPPABLE: std::ops::RangeInclusive<u8> = 0x80..=0xfd;
}

/// Index chunk layout markers.
pub mod index_markers {
    pub const HEADER: [u8; 6] = *b"s2idx\x00";
    pub const TRAILER: [u8; 6] = *b"\x00xdi2s";
    /// Upper bound on entries in a serialized index.
    pub const MAX_ENTRIES: usize = 1 << 16;
    /// Preferred uncompressed distance between entries after downsampling.
    pub const MIN_ENTRY_DISTANCE: i64 = 1 << 20;
    /// Downsampling never goes below this many entries.
    pub const MIN_KEPT_ENTRIES: usize = 1000;
}
