//! Artifact codec shared by graph and classifier files.
//!
//! The encoding is chosen from the file name: `.json` is JSON, anything else is
//! bincode, and a trailing `.gz` wraps either in gzip.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{GraphError, GraphResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Json,
    Bincode,
}

fn encoding_of(path: &Path) -> (Encoding, bool) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let (stem, gzipped) = match name.strip_suffix(".gz") {
        Some(stem) => (stem.to_string(), true),
        None => (name, false),
    };
    let encoding = if stem.ends_with(".json") {
        Encoding::Json
    } else {
        Encoding::Bincode
    };
    (encoding, gzipped)
}

/// Decode an artifact from `path`.
pub fn read_artifact<T: DeserializeOwned>(path: &Path) -> GraphResult<T> {
    let file = File::open(path).map_err(|e| GraphError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let (encoding, gzipped) = encoding_of(path);
    let reader: Box<dyn Read> = if gzipped {
        Box::new(BufReader::new(GzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    let decode_err = |message: String| GraphError::Decode {
        path: path.display().to_string(),
        message,
    };
    match encoding {
        Encoding::Json => serde_json::from_reader(reader).map_err(|e| decode_err(e.to_string())),
        Encoding::Bincode => {
            bincode::deserialize_from(reader).map_err(|e| decode_err(e.to_string()))
        }
    }
}

fn encode<W: Write, T: Serialize>(
    writer: &mut W,
    encoding: Encoding,
    value: &T,
) -> Result<(), String> {
    match encoding {
        Encoding::Json => serde_json::to_writer(writer, value).map_err(|e| e.to_string()),
        Encoding::Bincode => bincode::serialize_into(writer, value).map_err(|e| e.to_string()),
    }
}

/// Encode `value` to `path`, creating parent directories as needed.
pub fn write_artifact<T: Serialize>(path: &Path, value: &T) -> GraphResult<()> {
    let io_err = |e: std::io::Error| GraphError::Io {
        path: path.display().to_string(),
        source: e,
    };
    let encode_err = |message: String| GraphError::Encode {
        path: path.display().to_string(),
        message,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = File::create(path).map_err(io_err)?;
    let (encoding, gzipped) = encoding_of(path);

    if gzipped {
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        encode(&mut encoder, encoding, value).map_err(encode_err)?;
        encoder.finish().map_err(io_err)?.flush().map_err(io_err)
    } else {
        let mut writer = BufWriter::new(file);
        encode(&mut writer, encoding, value).map_err(encode_err)?;
        writer.flush().map_err(io_err)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn encoding_follows_file_name() {
        assert_eq!(encoding_of(Path::new("a/graph.json")), (Encoding::Json, false));
        assert_eq!(encoding_of(Path::new("graph.JSON.gz")), (Encoding::Json, true));
        assert_eq!(encoding_of(Path::new("graph.bin")), (Encoding::Bincode, false));
        assert_eq!(encoding_of(Path::new("graph.bin.gz")), (Encoding::Bincode, true));
    }

    #[test]
    fn every_encoding_reads_back() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut value = BTreeMap::new();
        value.insert(2020, (0usize, 3usize));
        value.insert(2021, (3, 5));

        for name in ["t.json", "t.json.gz", "t.bin", "t.bin.gz"] {
            let path = dir.path().join(name);
            write_artifact(&path, &value).unwrap();
            let back: BTreeMap<i32, (usize, usize)> = read_artifact(&path).unwrap();
            assert_eq!(back, value, "{name}");
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_artifact::<Vec<u8>>(Path::new("/nonexistent/graph.json")).unwrap_err();
        assert!(matches!(err, GraphError::Io { .. }));
    }

    #[test]
    fn garbage_is_decode_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = read_artifact::<Vec<u8>>(&path).unwrap_err();
        assert!(matches!(err, GraphError::Decode { .. }));
    }

    #[test]
    fn unencodable_value_is_encode_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut value = BTreeMap::new();
        value.insert((2020, 1), 3usize);
        let err = write_artifact(&dir.path().join("t.json"), &value).unwrap_err();
        assert!(matches!(err, GraphError::Encode { .. }));
        assert!(err.to_string().starts_with("failed to encode"));
    }
}
