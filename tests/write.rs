use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::ZlibDecoder;
use mat_pack::*;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::io::{Cursor, Read};

/// Just enough of a MAT-file reader to check what the writer produced.
#[derive(Debug, PartialEq)]
enum Parsed {
    Matrix {
        name: String,
        class: u8,
        dims: Vec<u32>,
        data_type: u32,
        data: Vec<u8>,
    },
    Struct {
        name: String,
        fields: Vec<String>,
        children: Vec<Parsed>,
    },
}

fn read_tag(rd: &mut Cursor<&[u8]>) -> (u32, usize, Vec<u8>) {
    let first = rd.read_u32::<LittleEndian>().unwrap();
    if first >> 16 != 0 {
        // Short form: the payload lives in the tag's second word
        let (ty, len) = (first & 0xffff, (first >> 16) as usize);
        let mut word = [0u8; 4];
        rd.read_exact(&mut word).unwrap();
        return (ty, len, word[..len].to_vec());
    }
    let len = rd.read_u32::<LittleEndian>().unwrap() as usize;
    let mut payload = vec![0u8; (len + 7) & !7];
    rd.read_exact(&mut payload).unwrap();
    payload.truncate(len);
    (first, len, payload)
}

fn parse_element(rd: &mut Cursor<&[u8]>, name: Option<String>) -> Parsed {
    assert_eq!(rd.read_u32::<LittleEndian>().unwrap(), 14);
    let size = rd.read_u32::<LittleEndian>().unwrap() as u64;
    let body_start = rd.position();

    let (ty, _, flags) = read_tag(rd);
    assert_eq!(ty, 6);
    let class = flags[0];
    let (ty, _, dims) = read_tag(rd);
    assert_eq!(ty, 5);
    let dims: Vec<u32> = dims
        .chunks(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    let (ty, _, raw_name) = read_tag(rd);
    assert_eq!(ty, 1);
    let name = name.unwrap_or_else(|| String::from_utf8(raw_name).unwrap());

    let parsed = if class == 2 {
        assert_eq!(dims, vec![1, 1]);
        let (_, _, width) = read_tag(rd);
        let width = i32::from_le_bytes([width[0], width[1], width[2], width[3]]) as usize;
        let (_, _, table) = read_tag(rd);
        let fields: Vec<String> = table
            .chunks(width)
            .map(|c| {
                let end = c.iter().position(|&b| b == 0).unwrap_or(c.len());
                String::from_utf8(c[..end].to_vec()).unwrap()
            })
            .collect();
        let children = fields
            .iter()
            .map(|f| parse_element(rd, Some(f.clone())))
            .collect();
        Parsed::Struct {
            name,
            fields,
            children,
        }
    } else {
        let (data_type, _, data) = read_tag(rd);
        Parsed::Matrix {
            name,
            class,
            dims,
            data_type,
            data,
        }
    };
    assert_eq!(rd.position() - body_start, size, "declared size of element");
    parsed
}

/// Parse a whole file, inflating compressed blocks along the way.
fn parse_file(bytes: &[u8]) -> Vec<Parsed> {
    assert!(bytes.len() >= 128);
    assert!(bytes.starts_with(b"MATLAB 5.0 MAT-file, Created on: "));
    assert_eq!(&bytes[124..128], &[0x00, 0x01, b'I', b'M']);

    let mut out = Vec::new();
    let mut rd = Cursor::new(bytes);
    rd.set_position(128);
    while (rd.position() as usize) < bytes.len() {
        let pos = rd.position() as usize;
        let ty = u32::from_le_bytes([bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]]);
        if ty == 15 {
            rd.set_position(pos as u64 + 4);
            let len = rd.read_u32::<LittleEndian>().unwrap() as usize;
            let block = &bytes[pos + 8..pos + 8 + len];
            rd.set_position((pos + 8 + len) as u64);
            let mut raw = Vec::new();
            ZlibDecoder::new(block).read_to_end(&mut raw).unwrap();
            let mut inner = Cursor::new(&raw[..]);
            out.push(parse_element(&mut inner, None));
            assert_eq!(inner.position() as usize, raw.len());
        } else {
            out.push(parse_element(&mut rd, None));
        }
    }
    out
}

fn options(version: Version) -> WriteOptions {
    WriteOptions {
        version,
        ..WriteOptions::default()
    }
}

fn write_with(version: Version, build: impl FnOnce(&mut MatFile<Cursor<Vec<u8>>>)) -> Vec<u8> {
    let mut file = MatFile::new(Cursor::new(Vec::new()), options(version)).unwrap();
    build(&mut file);
    file.finish().unwrap().into_inner()
}

#[test]
fn single_double_matrix() {
    let data = [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
    let matrix = Matrix::new("x", &data, &[2, 4]).unwrap();
    let expected_len = FILE_HEADER_LEN + matrix.size(true) + 8;

    let out = write_with(Version::V6, |f| {
        f.add(matrix).unwrap();
    });
    assert_eq!(out.len() as u64, expected_len);

    let parsed = parse_file(&out);
    match &parsed[..] {
        [Parsed::Matrix {
            name,
            class,
            dims,
            data_type,
            data: bytes,
        }] => {
            assert_eq!(name, "x");
            assert_eq!(*class, 6);
            assert_eq!(dims, &[2, 4]);
            assert_eq!(*data_type, 9);
            assert_eq!(bytes.len(), 64);
            assert_eq!(&bytes[56..], &8.0f64.to_le_bytes());
        }
        other => panic!("unexpected contents: {:?}", other),
    }
}

fn build_tree(f: &mut MatFile<Cursor<Vec<u8>>>) {
    let mut rng = StdRng::seed_from_u64(0x6d61_7470);
    let noise: Vec<f32> = (0..3000).map(|_| rng.gen()).collect();

    let mut inner = Struct::new("filter");
    inner.add_slice("taps", &[0.25f64, 0.5, 0.25], &[3, 1]).unwrap();
    inner.add_text("kind", "lowpass").unwrap();

    let mut outer = Struct::new("config");
    outer.add_scalar("rate", 48000u32).unwrap();
    outer.add(inner).unwrap();
    outer.add(Struct::new("empty")).unwrap();

    f.add_slice("noise", &noise, &[1000, 3]).unwrap();
    f.add(outer).unwrap();
    f.add_text("note", "größe").unwrap();
    f.add_slice::<i64>("nothing", &[], &[0, 0]).unwrap();
}

#[test]
fn raw_and_compressed_hold_the_same_values() {
    let raw = write_with(Version::V6, build_tree);
    let compressed = write_with(Version::V7, build_tree);
    assert_ne!(raw, compressed);

    let a = parse_file(&raw);
    let b = parse_file(&compressed);
    assert_eq!(a.len(), 4);
    assert_eq!(a, b);

    match &a[1] {
        Parsed::Struct {
            name,
            fields,
            children,
        } => {
            assert_eq!(name, "config");
            assert_eq!(fields, &["rate", "filter", "empty"]);
            assert!(matches!(
                &children[1],
                Parsed::Struct { fields, .. } if fields == &["taps", "kind"]
            ));
        }
        other => panic!("expected a struct, got {:?}", other),
    }
    match &a[2] {
        Parsed::Matrix {
            class,
            dims,
            data_type,
            data,
            ..
        } => {
            assert_eq!(*class, 4);
            assert_eq!(*data_type, 16);
            assert_eq!(dims, &[1, 5]);
            assert_eq!(data, "größe".as_bytes());
        }
        other => panic!("expected a string, got {:?}", other),
    }
}

#[test]
fn closed_file_rejects_values() {
    let mut file = MatFile::new(Cursor::new(Vec::new()), options(Version::V7)).unwrap();
    file.close().unwrap();
    let err = file.add_scalar("late", 1.0f64).map(|_| ()).unwrap_err();
    assert!(matches!(err, Error::ResourceClosed(_)));
    assert_eq!(err.to_string(), "Cannot add values to a closed file");
    assert!(file.children().is_empty());
}

#[test]
fn shape_mismatch_before_any_output() {
    let mut file = MatFile::new(Cursor::new(Vec::new()), options(Version::V6)).unwrap();
    let err = file
        .add_slice("bad", &[0.0f64; 8], &[3, 3])
        .map(|_| ())
        .unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { elements: 8, .. }));
    assert!(file.children().is_empty());
    let out = file.finish().unwrap().into_inner();
    assert_eq!(out.len() as u64, FILE_HEADER_LEN);
}

#[test]
fn write_to_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.mat");

    let mut opts = options(Version::V7);
    opts.header = "path test".into();
    let mut file = MatFile::create(&path, opts).unwrap();
    file.add_slice("ramp", &(0..100u8).collect::<Vec<_>>(), &[10, 10])
        .unwrap();
    drop(file);

    let bytes = std::fs::read(&path).unwrap();
    let text = String::from_utf8_lossy(&bytes[..116]);
    assert!(text.trim_end().ends_with("path test"));
    let parsed = parse_file(&bytes);
    assert!(matches!(
        &parsed[..],
        [Parsed::Matrix { class: 9, dims, .. }] if dims == &[10, 10]
    ));
}

#[test]
fn create_rejects_v73_without_touching_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("never.mat");
    let res = MatFile::create(&path, options(Version::V73));
    assert!(matches!(res, Err(Error::Unsupported(_))));
    assert!(!path.exists());
}

#[test]
fn create_in_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("out.mat");
    let res = MatFile::create(&path, WriteOptions::default());
    assert!(matches!(res, Err(Error::Io(_))));
}

#[test]
fn options_from_json() {
    let opts: WriteOptions = serde_json::from_str(
        r#"{ "version": "V7", "compression": { "level": 1, "chunk_size": 4096 } }"#,
    )
    .unwrap();
    assert_eq!(opts.compression, Compression::new(1).chunk_size(4096));
    assert_eq!(opts.header, WriteOptions::default().header);

    let out = {
        let mut file = MatFile::new(Cursor::new(Vec::new()), opts).unwrap();
        build_tree(&mut file);
        file.finish().unwrap().into_inner()
    };
    assert_eq!(parse_file(&out).len(), 4);
}
