#[cfg(test)]
mod seek_tests {
    use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

    use rand::{rngs::StdRng, Rng, SeedableRng};

    use s2_core::compression::CompressionLevel;
    use s2_core::index::Index;
    use s2_core::stream::{ReadSeeker, Reader, ReaderConfig, Writer, WriterConfig};
    use s2_core::types::StreamError;

    fn data_of(seed: u64, len: usize) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut out = Vec::with_capacity(len);
        while out.len() < len {
            let word: Vec<u8> = (0..rng.gen_range(2..9)).map(|_| rng.gen_range(b'a'..=b'p')).collect();
            for _ in 0..rng.gen_range(1..4) {
                out.extend_from_slice(&word);
                out.push(b' ');
            }
        }
        out.truncate(len);
        out
    }

    fn stream_of(data: &[u8], cfg: WriterConfig) -> Vec<u8> {
        let mut w = Writer::with_config(Vec::new(), cfg).unwrap();
        w.write_all(data).unwrap();
        w.into_inner().unwrap()
    }

    fn indexed(data: &[u8], block_size: usize) -> Vec<u8> {
        stream_of(
            data,
            WriterConfig::new()
                .with_block_size(block_size)
                .with_concurrency(4)
                .with_level(CompressionLevel::Better)
                .with_index(true),
        )
    }

    fn seeker(stream: &[u8], random: bool) -> ReadSeeker<Cursor<&[u8]>> {
        Reader::new(Cursor::new(stream)).read_seeker(random, None).unwrap()
    }

    fn read_at(rs: &mut ReadSeeker<Cursor<&[u8]>>, data: &[u8], pos: usize, len: usize) {
        assert_eq!(rs.seek(SeekFrom::Start(pos as u64)).unwrap(), pos as u64);
        let len = len.min(data.len() - pos);
        let mut buf = vec![0u8; len];
        rs.read_exact(&mut buf).unwrap();
        assert_eq!(buf, &data[pos..pos + len], "read at {pos}");
    }

    fn four_symbols(seed: u64, len: usize) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..len).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect()
    }

    fn seek_every(data: &[u8], block_size: usize, step: usize) {
        let len = data.len();
        let stream = stream_of(
            data,
            WriterConfig::new().with_block_size(block_size).with_index(true),
        );
        let mut rs = seeker(&stream, true);
        assert!(rs.index().is_some());
        for pos in (0..len).step_by(step) {
            read_at(&mut rs, data, pos, 1000);
        }
        // And backwards.
        for pos in (0..len).step_by(step).rev() {
            read_at(&mut rs, data, pos, 100);
        }
        // Resume from the index entry and skip the residual.
        let index = rs.index().unwrap().clone();
        for pos in (0..len).step_by(step * 4) {
            let (c, u) = index.find(pos as i64).unwrap();
            assert!(u <= pos as i64);
            let mut r = Reader::with_config(
                Cursor::new(&stream[c as usize..]),
                ReaderConfig::new().with_ignore_stream_identifier(true),
            );
            r.skip(pos as u64 - u as u64).unwrap();
            let mut tail = Vec::new();
            r.read_to_end(&mut tail).unwrap();
            assert_eq!(tail, &data[pos..], "resume at {pos}");
        }
    }

    // --- with an index ---

    #[test]
    fn index_is_loaded_from_stream() {
        let data = data_of(1, 200_000);
        let stream = indexed(&data, 16 << 10);
        let rs = seeker(&stream, true);
        let index = rs.index().unwrap();
        assert_eq!(index.total_uncompressed, data.len() as i64);
        assert_eq!(index.len(), 13);

        // Loading the index leaves the stream readable from the start.
        let mut out = Vec::new();
        let mut rs = rs;
        rs.read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn seek_start_current_end() {
        let data = data_of(2, 200_000);
        let stream = indexed(&data, 16 << 10);
        let mut rs = seeker(&stream, true);

        read_at(&mut rs, &data, 150_000, 10);
        assert_eq!(rs.seek(SeekFrom::Current(-50_010)).unwrap(), 100_000);
        let mut buf = [0u8; 10];
        rs.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, &data[100_000..100_010]);

        assert_eq!(rs.seek(SeekFrom::Current(5)).unwrap(), 100_015);
        rs.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, &data[100_015..100_025]);

        assert_eq!(rs.seek(SeekFrom::End(-100)).unwrap(), 199_900);
        let mut tail = Vec::new();
        rs.read_to_end(&mut tail).unwrap();
        assert_eq!(tail, &data[199_900..]);

        assert_eq!(rs.seek(SeekFrom::End(0)).unwrap(), 200_000);
        assert_eq!(rs.read(&mut buf).unwrap(), 0);

        // Reading to the end does not prevent seeking back.
        read_at(&mut rs, &data, 0, 500);
    }

    #[test]
    fn seek_out_of_range() {
        let data = data_of(3, 50_000);
        let stream = indexed(&data, 16 << 10);
        let mut rs = seeker(&stream, true);
        assert!(rs.seek(SeekFrom::Start(50_001)).is_err());
        assert!(matches!(
            rs.seek_to(SeekFrom::Current(-1)),
            Err(StreamError::CantSeek(_))
        ));
    }

    #[test]
    fn seek_within_current_block() {
        let data = data_of(4, 100_000);
        let stream = indexed(&data, 64 << 10);
        let mut rs = seeker(&stream, true);
        read_at(&mut rs, &data, 1000, 10);
        read_at(&mut rs, &data, 10, 10);
        read_at(&mut rs, &data, 65_535, 10);
        read_at(&mut rs, &data, 60_000, 10);
    }

    #[test]
    fn supplied_index_for_plain_stream() -> anyhow::Result<()> {
        let data = data_of(5, 120_000);
        let stream = stream_of(
            &data,
            WriterConfig::new().with_block_size(8 << 10).with_concurrency(2),
        );
        assert!(matches!(
            Reader::new(Cursor::new(&stream[..])).read_seeker(true, None),
            Err(StreamError::CantSeek(_))
        ));

        let index = Index::from_stream(Cursor::new(&stream))?;
        let mut rs = Reader::new(Cursor::new(&stream[..])).read_seeker(true, Some(index))?;
        for pos in [119_999usize, 0, 8192, 8191, 77_777] {
            read_at(&mut rs, &data, pos, 300);
        }
        Ok(())
    }

    #[test]
    fn padded_stream_with_index() {
        let data = data_of(6, 80_000);
        let stream = stream_of(
            &data,
            WriterConfig::new()
                .with_block_size(8 << 10)
                .with_padding(1 << 12)
                .with_index(true),
        );
        assert_eq!(stream.len() % 4096, 0);
        let mut rs = seeker(&stream, true);
        assert_eq!(rs.index().unwrap().total_compressed, -1);
        read_at(&mut rs, &data, 79_000, 2000);
        read_at(&mut rs, &data, 3, 20);
    }

    // --- without an index ---

    #[test]
    fn forward_only_without_index() {
        let data = data_of(7, 60_000);
        let stream = stream_of(&data, WriterConfig::new().with_block_size(4096).with_concurrency(1));
        let mut rs = seeker(&stream, false);
        assert!(rs.index().is_none());

        read_at(&mut rs, &data, 10_000, 10);
        read_at(&mut rs, &data, 10_005, 10);
        read_at(&mut rs, &data, 50_000, 10);
        assert!(matches!(
            rs.seek_to(SeekFrom::Start(100)),
            Err(StreamError::CantSeek(_))
        ));
        assert!(matches!(
            rs.seek_to(SeekFrom::End(-10)),
            Err(StreamError::CantSeek(_))
        ));
        let err = rs.seek(SeekFrom::Start(0)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

        // Still readable where it stopped.
        read_at(&mut rs, &data, 55_000, 5000);
    }

    // --- larger streams ---

    #[test]
    fn seek_every_offset_small() {
        seek_every(&data_of(20, 1 << 20), 16 << 10, 65_531 / 8);
    }

    #[test]
    fn resume_from_index_every_65531_bytes() {
        let data = four_symbols(21, 10 << 20);
        let stream = stream_of(
            &data,
            WriterConfig::new().with_block_size(100 << 10).with_index(true),
        );
        let mut index = Index::default();
        index.load_stream(&mut Cursor::new(&stream)).unwrap();
        assert_eq!(index.total_uncompressed, data.len() as i64);

        for (n, pos) in (0..data.len()).step_by(65_531).enumerate() {
            let (c, u) = index.find(pos as i64).unwrap();
            assert!(u <= pos as i64);
            let mut r = Reader::with_config(
                Cursor::new(&stream[c as usize..]),
                ReaderConfig::new().with_ignore_stream_identifier(true),
            );
            r.skip(pos as u64 - u as u64).unwrap();
            let mut tail = Vec::new();
            if n % 32 == 0 {
                r.read_to_end(&mut tail).unwrap();
                assert_eq!(tail, &data[pos..], "resume at {pos}");
            } else {
                // two blocks past the resume point
                let want = (200 << 10).min(data.len() - pos);
                tail.resize(want, 0);
                r.read_exact(&mut tail).unwrap();
                assert_eq!(tail, &data[pos..pos + want], "resume at {pos}");
            }
        }

        let last = data.len() - 1;
        let (c, u) = index.find(last as i64).unwrap();
        let mut r = Reader::with_config(
            Cursor::new(&stream[c as usize..]),
            ReaderConfig::new().with_ignore_stream_identifier(true),
        );
        r.skip(last as u64 - u as u64).unwrap();
        let mut tail = Vec::new();
        r.read_to_end(&mut tail).unwrap();
        assert_eq!(tail, &data[last..]);
    }
}
