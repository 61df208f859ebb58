//! Single-entry zip archives.

use std::io::{Cursor, Read};

use crate::error::LoaderError;

/// Name of the archive entry a path refers to (`data/dt.json.zip` -> `dt.json`).
pub fn entry_name(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.strip_suffix(".zip").unwrap_or(name)
}

/// Decode the entry addressed by `path` from the archive bytes.
pub fn read_entry(path: &str, bytes: &[u8]) -> Result<String, LoaderError> {
    let archive_err = |message: String| LoaderError::Archive {
        path: path.to_string(),
        message,
    };

    if bytes.is_empty() {
        return Err(archive_err("empty archive".to_string()));
    }

    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| archive_err(e.to_string()))?;
    let name = entry_name(path);
    let mut entry = archive
        .by_name(name)
        .map_err(|e| archive_err(format!("entry {}: {}", name, e)))?;

    let mut text = String::new();
    entry.read_to_string(&mut text).map_err(|e| {
        if e.kind() == std::io::ErrorKind::InvalidData {
            LoaderError::Encoding {
                path: path.to_string(),
            }
        } else {
            archive_err(e.to_string())
        }
    })?;
    Ok(text)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write;

    use super::*;

    /// Build an archive holding one entry.
    pub(crate) fn zip_bytes(entry: &str, content: &str) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            writer
                .start_file(entry, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
            writer.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn test_entry_name() {
        assert_eq!(entry_name("data/dt.json.zip"), "dt.json");
        assert_eq!(entry_name("meta.csv.zip"), "meta.csv");
        assert_eq!(entry_name("plain.csv"), "plain.csv");
    }

    #[test]
    fn test_read_entry() {
        let bytes = zip_bytes("meta.csv", "a,b,c\n");
        assert_eq!(read_entry("data/meta.csv.zip", &bytes).unwrap(), "a,b,c\n");
    }

    #[test]
    fn test_missing_entry() {
        let bytes = zip_bytes("other.csv", "x");
        let err = read_entry("meta.csv.zip", &bytes).unwrap_err();
        assert!(matches!(err, LoaderError::Archive { .. }));
    }

    #[test]
    fn test_empty_and_garbage() {
        assert!(read_entry("dt.json.zip", &[]).is_err());
        assert!(read_entry("dt.json.zip", b"not a zip").is_err());
    }
}
