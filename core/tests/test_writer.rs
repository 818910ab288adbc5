#[cfg(test)]
mod writer_tests {
    use std::io::{self, Cursor, Read, Write};
    use std::sync::Arc;

    use bytes::Bytes;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use s2_core::compression::{CompressionLevel, Dictionary};
    use s2_core::stream::config::ConfigError;
    use s2_core::stream::framing::encode::padding_needed;
    use s2_core::stream::{
        compress_stream, decompress_stream, PaddingSource, Reader, ReaderConfig, Writer,
        WriterConfig,
    };
    use s2_core::types::StreamError;

    const LEVELS: [CompressionLevel; 4] = [
        CompressionLevel::Uncompressed,
        CompressionLevel::Fast,
        CompressionLevel::Better,
        CompressionLevel::Best,
    ];

    fn mixed_data(seed: u64, len: usize) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut out = Vec::with_capacity(len);
        while out.len() < len {
            let run = rng.gen_range(16..2048);
            if rng.gen_bool(0.3) {
                out.extend((0..run).map(|_| rng.gen::<u8>()));
            } else {
                out.extend((0..run).map(|_| b"the quick brown fox "[rng.gen_range(0..20)]));
            }
        }
        out.truncate(len);
        out
    }

    fn decode_all(stream: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        Reader::new(Cursor::new(stream)).read_to_end(&mut out).unwrap();
        out
    }

    fn encode_all(cfg: WriterConfig, data: &[u8]) -> Vec<u8> {
        let mut w = Writer::with_config(Vec::new(), cfg).unwrap();
        w.write_all(data).unwrap();
        w.into_inner().unwrap()
    }

    // --- round trips ---

    #[test]
    fn option_matrix_roundtrip() {
        let data = mixed_data(1, 300_000);
        for level in LEVELS {
            for concurrency in [1, 4] {
                for padding in [1, 17] {
                    for snappy in [false, true] {
                        let cfg = WriterConfig::new()
                            .with_level(level)
                            .with_block_size(64 << 10)
                            .with_concurrency(concurrency)
                            .with_padding(padding)
                            .with_snappy_compat(snappy)
                            .with_index(true);
                        let stream = encode_all(cfg, &data);
                        let ctx = format!("{level:?} c={concurrency} pad={padding} snappy={snappy}");
                        assert_eq!(stream.len() % padding, 0, "{ctx}");
                        let expected_id: &[u8] = if snappy { b"sNaPpY" } else { b"S2sTwO" };
                        assert_eq!(&stream[4..10], expected_id, "{ctx}");
                        assert_eq!(decode_all(&stream), data, "{ctx}");
                    }
                }
            }
        }
    }

    #[test]
    fn empty_stream_has_identifier() {
        let w = Writer::with_config(Vec::new(), WriterConfig::new().with_concurrency(1)).unwrap();
        let stream = w.into_inner().unwrap();
        assert_eq!(stream, b"\xff\x06\x00\x00S2sTwO");
        assert!(decode_all(&stream).is_empty());
    }

    #[test]
    fn write_chunking_does_not_change_output() {
        let data = mixed_data(2, 200_000);
        let cfg = || {
            WriterConfig::new()
                .with_block_size(16 << 10)
                .with_concurrency(4)
                .with_index(true)
        };
        let whole = encode_all(cfg(), &data);

        let mut rng = StdRng::seed_from_u64(3);
        let mut w = Writer::with_config(Vec::new(), cfg()).unwrap();
        let mut rest = &data[..];
        while !rest.is_empty() {
            let n = rng.gen_range(1..5000).min(rest.len());
            w.write_all(&rest[..n]).unwrap();
            rest = &rest[n..];
        }
        let pieces = w.into_inner().unwrap();
        assert_eq!(pieces, whole);

        let inline = encode_all(cfg().with_concurrency(1), &data);
        assert_eq!(inline, whole);
    }

    #[test]
    fn flush_emits_partial_block() {
        let mut w = Writer::with_config(Vec::new(), WriterConfig::new().with_concurrency(2)).unwrap();
        w.write_all(b"hello, ").unwrap();
        w.flush().unwrap();
        let after_first = w.written();
        assert!(after_first > 10);
        assert_eq!(decode_all(w.get_ref()), b"hello, ");

        w.write_all(b"world").unwrap();
        let stream = w.into_inner().unwrap();
        assert!(stream.len() as u64 > after_first);
        assert_eq!(decode_all(&stream), b"hello, world");
    }

    #[test]
    fn flush_on_write() {
        let cfg = WriterConfig::new().with_concurrency(1).with_flush_on_write(true);
        let mut w = Writer::with_config(Vec::new(), cfg).unwrap();
        w.write_all(b"abc").unwrap();
        assert_eq!(decode_all(w.get_ref()), b"abc");
        w.write_all(b"def").unwrap();
        assert_eq!(decode_all(w.get_ref()), b"abcdef");
    }

    #[test]
    fn dictionary_stream() {
        let data = mixed_data(4, 50_000);
        let dict = Arc::new(Dictionary::from_parts(data[..20_000].to_vec(), 0).unwrap());
        let cfg = WriterConfig::new()
            .with_concurrency(2)
            .with_block_size(8 << 10)
            .with_dict(dict.clone());
        let stream = encode_all(cfg, &data);

        let mut out = Vec::new();
        Reader::with_config(Cursor::new(&stream), ReaderConfig::new().with_dict(dict))
            .read_to_end(&mut out)
            .unwrap();
        assert_eq!(out, data);
    }

    // --- close ---

    #[test]
    fn close_is_idempotent() {
        let mut w = Writer::with_config(Vec::new(), WriterConfig::new().with_index(true)).unwrap();
        w.write_all(&mixed_data(5, 10_000)).unwrap();
        let first = w.close_index().unwrap();
        let len = w.get_ref().len();
        w.close().unwrap();
        assert_eq!(w.close_index().unwrap(), first);
        assert_eq!(w.get_ref().len(), len);
        w.flush().unwrap();

        assert!(matches!(w.encode_buffer(Bytes::from_static(b"x")), Err(StreamError::Closed)));
        let err = w.write(b"more").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        // Writing after close does not poison close.
        assert_eq!(w.close_index().unwrap(), first);
    }

    #[test]
    fn close_index_without_appending() {
        let mut w = Writer::with_config(Vec::new(), WriterConfig::new().with_concurrency(1)).unwrap();
        w.write_all(&mixed_data(6, 10_000)).unwrap();
        let idx = w.close_index().unwrap();
        assert_eq!(idx[0], 0x99);
        assert!(!w.get_ref().ends_with(&idx));
    }

    #[test]
    fn snappy_never_appends_index() {
        let cfg = WriterConfig::new().with_snappy_compat(true).with_index(true);
        let mut w = Writer::with_config(Vec::new(), cfg).unwrap();
        w.write_all(&mixed_data(7, 10_000)).unwrap();
        let idx = w.close_index().unwrap();
        assert!(!w.get_ref().ends_with(&idx));
    }

    // --- padding ---

    #[test]
    fn padding_fills_to_multiple() {
        let data = mixed_data(8, 30_000);
        let plain = encode_all(WriterConfig::new().with_concurrency(1), &data);
        let multiple = if plain.len() % 1000 == 0 { 999 } else { 1000 };
        let pad = padding_needed(plain.len() as u64, multiple as u64);
        assert!(pad >= 4);

        let fill = PaddingSource::from_reader(io::repeat(0x55));
        let cfg = WriterConfig::new()
            .with_concurrency(1)
            .with_padding(multiple)
            .with_padding_source(fill);
        let padded = encode_all(cfg, &data);
        assert_eq!(padded.len() % multiple, 0);
        assert_eq!(padded.len(), plain.len() + pad);
        assert_eq!(&padded[..plain.len()], &plain[..]);
        assert_eq!(padded[plain.len()], 0xfe);
        assert!(padded[plain.len() + 4..].iter().all(|&b| b == 0x55));
        assert_eq!(decode_all(&padded), data);
    }

    #[test]
    fn padding_accounts_for_index() {
        let cfg = WriterConfig::new()
            .with_padding(4096)
            .with_padding_source(PaddingSource::Random)
            .with_index(true);
        let stream = encode_all(cfg, &mixed_data(9, 100_000));
        assert_eq!(stream.len() % 4096, 0);
        assert!(stream.ends_with(b"\x00xdi2s"));
    }

    // --- reuse ---

    #[test]
    fn reset_starts_a_new_stream() {
        let cfg = WriterConfig::new().with_concurrency(3).with_block_size(16 << 10);
        let mut w = Writer::with_config(Vec::new(), cfg).unwrap();
        let data = mixed_data(10, 100_000);
        w.write_all(&data).unwrap();
        w.flush().unwrap();
        let old = w.reset(Vec::new());
        assert_eq!(decode_all(&old), data);

        // Blocks still in flight are dropped.
        w.write_all(&data).unwrap();
        w.reset(Vec::new());

        w.write_all(b"second stream").unwrap();
        w.close().unwrap();
        assert_eq!(decode_all(w.get_ref()), b"second stream");

        // A closed writer is usable again after reset.
        let first = w.reset(Vec::new());
        assert_eq!(decode_all(&first), b"second stream");
        w.write_all(b"third").unwrap();
        assert_eq!(decode_all(&w.into_inner().unwrap()), b"third");
    }

    #[test]
    fn read_from_copies_everything() {
        let data = mixed_data(11, 123_457);
        let mut w = Writer::with_config(Vec::new(), WriterConfig::new().with_block_size(32 << 10)).unwrap();
        assert_eq!(w.read_from(Cursor::new(&data)).unwrap(), data.len() as u64);
        assert_eq!(decode_all(&w.into_inner().unwrap()), data);
    }

    // --- caller owned buffers ---

    #[test]
    fn encode_buffer_inline_releases_buffer() {
        let data = mixed_data(12, 200_000);
        let buf = Bytes::from(data.clone());
        let cfg = WriterConfig::new().with_concurrency(1).with_block_size(64 << 10);
        let mut w = Writer::with_config(Vec::new(), cfg).unwrap();
        w.write_all(b"prefix:").unwrap();
        w.encode_buffer(buf.clone()).unwrap();
        let reclaimed = buf.try_into_mut().expect("buffer still referenced");
        assert_eq!(&reclaimed[..], &data[..]);

        let mut expected = b"prefix:".to_vec();
        expected.extend_from_slice(&data);
        assert_eq!(decode_all(&w.into_inner().unwrap()), expected);
    }

    #[test]
    fn encode_buffer_concurrent_released_after_flush() {
        let data = mixed_data(13, 200_000);
        let buf = Bytes::from(data.clone());
        let cfg = WriterConfig::new().with_concurrency(4).with_block_size(16 << 10);
        let mut w = Writer::with_config(Vec::new(), cfg).unwrap();
        w.encode_buffer(buf.clone()).unwrap();
        w.flush().unwrap();
        assert!(buf.try_into_mut().is_ok());
        assert_eq!(decode_all(&w.into_inner().unwrap()), data);
    }

    // --- configuration ---

    #[test]
    fn invalid_configurations() {
        let dict = Arc::new(Dictionary::from_parts(vec![1u8; 64], 0).unwrap());
        let cases = [
            (
                WriterConfig::new().with_snappy_compat(true).with_dict(dict),
                ConfigError::DictionaryWithSnappy,
            ),
            (
                WriterConfig::new().with_padding(0),
                ConfigError::InvalidPadding { got: 0, max: 4 << 20 },
            ),
            (
                WriterConfig::new().with_padding((4 << 20) + 1),
                ConfigError::InvalidPadding {
                    got: (4 << 20) + 1,
                    max: 4 << 20,
                },
            ),
            (WriterConfig::new().with_concurrency(0), ConfigError::ZeroConcurrency),
        ];
        for (cfg, expected) in cases {
            match Writer::with_config(Vec::new(), cfg) {
                Err(StreamError::Config(e)) => assert_eq!(e, expected),
                Err(e) => panic!("unexpected error {e}"),
                Ok(_) => panic!("accepted {expected:?}"),
            }
        }
    }

    #[test]
    fn block_size_is_clamped() {
        assert_eq!(WriterConfig::new().with_block_size(1).block_size, 4 << 10);
        assert_eq!(WriterConfig::new().with_block_size(1 << 30).block_size, 4 << 20);
        let snappy = WriterConfig::new().with_block_size(1 << 20).with_snappy_compat(true);
        assert_eq!(snappy.effective_block_size(), 64 << 10);
        let w = Writer::with_config(Vec::new(), snappy).unwrap();
        assert_eq!(w.block_size(), 64 << 10);
    }

    // --- destination failures ---

    struct FailingSink {
        budget: usize,
    }

    impl Write for FailingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink full"));
            }
            let n = buf.len().min(self.budget);
            self.budget -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn destination_error_is_sticky() {
        let cfg = WriterConfig::new().with_concurrency(1).with_block_size(4096);
        let mut w = Writer::with_config(FailingSink { budget: 100 }, cfg).unwrap();
        let err = w.write_all(&mixed_data(14, 20_000)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(w.write(b"x").unwrap_err().kind(), io::ErrorKind::BrokenPipe);
        assert!(matches!(w.close(), Err(StreamError::Io(_))));

        w.reset(FailingSink { budget: usize::MAX });
        w.write_all(b"recovered").unwrap();
        w.close().unwrap();
    }

    // --- one-call helpers ---

    #[test]
    fn compress_and_decompress_stream() -> anyhow::Result<()> {
        let data = mixed_data(15, 250_000);
        let mut stream = Vec::new();
        let snap = compress_stream(
            Cursor::new(&data),
            &mut stream,
            WriterConfig::new().with_block_size(64 << 10),
        )?;
        assert_eq!(snap.bytes_in(), data.len() as u64);
        assert_eq!(snap.bytes_out(), stream.len() as u64);
        assert_eq!(snap.counters.data_chunks(), 4);

        let mut out = Vec::new();
        let snap = decompress_stream(Cursor::new(&stream), &mut out, ReaderConfig::new())?;
        assert_eq!(out, data);
        assert_eq!(snap.bytes_in(), data.len() as u64);
        Ok(())
    }
}
