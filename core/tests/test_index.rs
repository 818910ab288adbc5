#[cfg(test)]
mod index_tests {
    use std::io::{Cursor, Write};

    use rand::{rngs::StdRng, Rng, SeedableRng};

    use s2_core::compression::CompressionLevel;
    use s2_core::index::{Index, IndexError};
    use s2_core::stream::framing::encode::{encode_data_chunk, stream_identifier};
    use s2_core::stream::{Writer, WriterConfig};
    use s2_core::types::StreamError;

    fn sample_index() -> Index {
        let mut index = Index::new(100);
        index.add(0, 10).unwrap();
        index.add(100, 60).unwrap();
        index.add(200, 110).unwrap();
        index.finalize(300, 150);
        index
    }

    fn compressible(seed: u64, len: usize) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..len).map(|_| b"abcdefgh"[rng.gen_range(0..8)]).collect()
    }

    fn indexed_stream(data: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let cfg = WriterConfig::new()
            .with_block_size(4096)
            .with_concurrency(1)
            .with_level(CompressionLevel::Better)
            .with_index(true);
        let mut w = Writer::with_config(Vec::new(), cfg).unwrap();
        w.write_all(data).unwrap();
        let idx = w.close_index().unwrap();
        (w.into_inner().unwrap(), idx)
    }

    // --- construction ---

    #[test]
    fn add_requires_increasing_offsets() {
        let mut index = Index::new(1 << 20);
        assert!(index.is_empty());
        index.add(0, 10).unwrap();
        assert_eq!(
            index.add(0, 20),
            Err(IndexError::NotMonotonic {
                prev_uncompressed: 0,
                prev_compressed: 10,
                uncompressed: 0,
                compressed: 20
            })
        );
        assert!(matches!(index.add(100, 10), Err(IndexError::NotMonotonic { .. })));
        assert!(matches!(index.add(-5, 30), Err(IndexError::Corrupt(_))));
        index.add(100, 20).unwrap();
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn reset_clears_everything() {
        let mut index = sample_index();
        index.reset(4096);
        assert!(index.is_empty());
        assert_eq!(index.total_uncompressed, -1);
        assert_eq!(index.total_compressed, -1);
        assert_eq!(index.estimated_block_size(), 4096);
    }

    // --- lookup ---

    #[test]
    fn find_nearest_preceding_entry() {
        let index = sample_index();
        assert_eq!(index.find(0), Ok((10, 0)));
        assert_eq!(index.find(99), Ok((10, 0)));
        assert_eq!(index.find(100), Ok((60, 100)));
        assert_eq!(index.find(150), Ok((60, 100)));
        assert_eq!(index.find(300), Ok((110, 200)));
        assert_eq!(
            index.find(301),
            Err(IndexError::OutOfRange { offset: 301, total: 300 })
        );
    }

    #[test]
    fn find_relative_to_end() {
        let index = sample_index();
        assert_eq!(index.find(-50), Ok((110, 200)));
        assert_eq!(index.find(-300), Ok((10, 0)));
        assert_eq!(
            index.find(-301),
            Err(IndexError::OutOfRange { offset: -1, total: 300 })
        );

        let mut unknown = Index::new(100);
        unknown.add(0, 10).unwrap();
        assert_eq!(unknown.find(-1), Err(IndexError::UnknownSize));
        assert_eq!(unknown.find(5000), Ok((10, 0)));
    }

    #[test]
    fn find_errors() {
        assert_eq!(Index::new(100).find(5), Err(IndexError::Empty));

        let mut late = Index::new(100);
        late.add(100, 10).unwrap();
        assert_eq!(late.find(50), Err(IndexError::BeforeFirstEntry(50)));
    }

    // --- downsampling ---

    #[test]
    fn reduce_small_blocks() {
        let mut index = Index::new(1000);
        for i in 0..5000i64 {
            index.add(i * 1000, 10 + i * 500).unwrap();
        }
        index.finalize(5_000_000, 2_500_010);
        assert_eq!(index.len(), 1250);
        assert_eq!(index.estimated_block_size(), 4000);
        assert_eq!(index.entries()[1].uncompressed, 4000);
        assert_eq!(index.find(4_100), Ok((10 + 4 * 500, 4000)));
    }

    #[test]
    fn reduce_keeps_large_blocks() {
        let mut index = Index::new(1 << 20);
        for i in 0..100i64 {
            index.add(i << 20, 10 + i * 1000).unwrap();
        }
        let before = index.clone();
        index.reduce();
        assert_eq!(index, before);
    }

    // --- serialization ---

    #[test]
    fn save_load_roundtrip() {
        let index = sample_index();
        let bytes = index.save().unwrap();
        assert_eq!(bytes[0], 0x99);
        assert_eq!(&bytes[4..10], b"s2idx\x00");
        assert_eq!(&bytes[bytes.len() - 6..], b"\x00xdi2s");
        let size = u32::from_le_bytes(bytes[bytes.len() - 10..bytes.len() - 6].try_into().unwrap());
        assert_eq!(size as usize, bytes.len());

        let mut loaded = Index::default();
        assert_eq!(loaded.load(&bytes), Ok(bytes.len()));
        assert_eq!(loaded, index);
        assert_eq!(loaded.save().unwrap(), bytes);
    }

    #[test]
    fn irregular_offsets_roundtrip() {
        let mut index = Index::new(4096);
        let mut rng = StdRng::seed_from_u64(7);
        let (mut u, mut c) = (0i64, 10i64);
        for _ in 0..500 {
            index.add(u, c).unwrap();
            u += rng.gen_range(1..8192);
            c += rng.gen_range(1..9000);
        }
        index.finalize(u, c);
        let bytes = index.save().unwrap();
        let mut loaded = Index::default();
        loaded.load(&bytes).unwrap();
        assert_eq!(loaded, index);
    }

    #[test]
    fn implied_offsets_are_smaller() {
        let mut regular = Index::new(1000);
        let mut irregular = Index::new(1000);
        for i in 0..50i64 {
            regular.add(i * 1000, 10 + i * 400).unwrap();
            irregular.add(i * 1000 + i % 3, 10 + i * 400).unwrap();
        }
        let a = regular.save().unwrap();
        let b = irregular.save().unwrap();
        assert!(a.len() < b.len());
        let mut loaded = Index::default();
        loaded.load(&a).unwrap();
        assert_eq!(loaded.entries(), regular.entries());
    }

    #[test]
    fn load_rejects_damage() {
        let bytes = sample_index().save().unwrap();
        let mut index = Index::default();

        assert_eq!(index.load(&bytes[..8]), Err(IndexError::UnexpectedEof));
        assert_eq!(index.load(&bytes[..bytes.len() - 1]), Err(IndexError::UnexpectedEof));

        let mut wrong_id = bytes.clone();
        wrong_id[0] = 0x00;
        assert_eq!(index.load(&wrong_id), Err(IndexError::Unsupported));

        let mut wrong_header = bytes.clone();
        wrong_header[4] = b'x';
        assert_eq!(index.load(&wrong_header), Err(IndexError::Unsupported));

        let mut wrong_trailer = bytes.clone();
        let last = wrong_trailer.len() - 1;
        wrong_trailer[last] = b'x';
        assert!(matches!(index.load(&wrong_trailer), Err(IndexError::Corrupt(_))));
    }

    #[test]
    fn too_many_entries() {
        let mut index = Index::new(1 << 20);
        for i in 0..65_537i64 {
            index.add(i << 20, 10 + i * 100).unwrap();
        }
        assert_eq!(index.save(), Err(IndexError::TooManyEntries(65_537)));
        index.finalize(65_537 << 20, 10 + 65_537 * 100);
        assert!(index.len() <= 65_536);
        assert!(index.save().is_ok());
    }

    // --- streams ---

    #[test]
    fn load_from_stream_tail() {
        let data = compressible(1, 100_000);
        let (stream, idx) = indexed_stream(&data);
        assert!(stream.ends_with(&idx));

        let mut expected = Index::default();
        expected.load(&idx).unwrap();
        assert_eq!(expected.total_uncompressed, data.len() as i64);
        assert_eq!(expected.entries()[0].uncompressed, 0);
        assert_eq!(expected.entries()[0].compressed, 10);

        let mut loaded = Index::default();
        loaded.load_stream(&mut Cursor::new(&stream)).unwrap();
        assert_eq!(loaded, expected);
    }

    #[test]
    fn load_stream_without_index() {
        let cfg = WriterConfig::new().with_concurrency(1);
        let mut w = Writer::with_config(Vec::new(), cfg).unwrap();
        w.write_all(b"no index here").unwrap();
        let stream = w.into_inner().unwrap();

        let mut index = Index::default();
        let err = index.load_stream(&mut Cursor::new(&stream)).unwrap_err();
        assert!(matches!(err, StreamError::Index(IndexError::Unsupported)));
        let err = index.load_stream(&mut Cursor::new(&stream[..5])).unwrap_err();
        assert!(matches!(err, StreamError::Index(IndexError::Unsupported)));
    }

    #[test]
    fn rebuild_from_stream_matches_writer() {
        let data = compressible(2, 100_000);
        let (stream, idx) = indexed_stream(&data);
        let mut written = Index::default();
        written.load(&idx).unwrap();

        let rebuilt = Index::from_stream(Cursor::new(&stream)).unwrap();
        assert_eq!(rebuilt.entries(), written.entries());
        assert_eq!(rebuilt.total_uncompressed, data.len() as i64);
        assert_eq!(rebuilt.total_compressed, stream.len() as i64);
        assert_eq!(rebuilt.estimated_block_size(), 4096);
    }

    #[test]
    fn rebuild_thins_out_tiny_blocks() {
        // identifier (10 bytes) then 70000 one-byte raw chunks of 9 bytes each
        let mut stream = stream_identifier(false).to_vec();
        for i in 0..70_000u32 {
            encode_data_chunk(&mut stream, &[i as u8], None).unwrap();
        }

        let rebuilt = Index::from_stream(Cursor::new(&stream)).unwrap();
        assert_eq!(rebuilt.len(), 1015);
        assert_eq!(rebuilt.estimated_block_size(), 69);
        assert_eq!(rebuilt.total_uncompressed, 70_000);
        assert_eq!(rebuilt.total_compressed, stream.len() as i64);
        assert_eq!(rebuilt.find(69_999), Ok((10 + 9 * 69_966, 69_966)));

        let saved = rebuilt.save().unwrap();
        let mut loaded = Index::default();
        loaded.load(&saved).unwrap();
        assert_eq!(loaded, rebuilt);
    }

    #[test]
    fn rebuild_requires_identifier() {
        let err = Index::from_stream(Cursor::new(vec![0x01, 0x05, 0, 0, 0, 0, 0, 0, b'a'])).unwrap_err();
        assert!(matches!(
            err,
            StreamError::Frame(s2_core::stream::framing::FrameError::MissingStreamIdentifier)
        ));
    }

    // --- diagnostics ---

    #[test]
    fn json_dump() {
        let json = sample_index().to_json().unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["total_uncompressed"], 300);
        assert_eq!(v["total_compressed"], 150);
        assert_eq!(v["est_block_uncompressed"], 100);
        assert_eq!(v["offsets"].as_array().unwrap().len(), 3);
        assert_eq!(v["offsets"][1]["uncompressed"], 100);
        assert_eq!(v["offsets"][1]["compressed"], 60);
    }
}
