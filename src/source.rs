//! Reading source files in the encodings Node accepts for `readFile`.

use std::path::{Path, PathBuf};

use crate::error::TranspileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Utf16Le,
    Latin1,
    Ascii,
}

impl Encoding {
    /// Resolves a Node-style encoding label, ignoring case.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Some(Encoding::Utf8),
            "utf16le" | "utf-16le" | "ucs2" | "ucs-2" => Some(Encoding::Utf16Le),
            "latin1" | "binary" => Some(Encoding::Latin1),
            "ascii" => Some(Encoding::Ascii),
            _ => None,
        }
    }

    /// Malformed sequences decode to U+FFFD instead of failing.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Encoding::Utf16Le => {
                let units = bytes
                    .chunks(2)
                    .map(|pair| match pair {
                        [lo, hi] => u16::from_le_bytes([*lo, *hi]),
                        _ => 0xFFFD,
                    });
                char::decode_utf16(units)
                    .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                    .collect()
            }
            Encoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
            Encoding::Ascii => bytes.iter().map(|&b| (b & 0x7f) as char).collect(),
        }
    }
}

fn resolve(label: &str) -> Result<Encoding, TranspileError> {
    Encoding::from_label(label).ok_or_else(|| TranspileError::UnknownEncoding {
        label: label.to_string(),
    })
}

pub fn read_source_sync(path: &Path, encoding: &str) -> Result<String, TranspileError> {
    let encoding = resolve(encoding)?;
    let bytes = std::fs::read(path).map_err(|source| TranspileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(encoding.decode(&bytes))
}

pub async fn read_source(path: &Path, encoding: &str) -> Result<String, TranspileError> {
    let encoding = resolve(encoding)?;
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| TranspileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(encoding.decode(&bytes))
}

/// A file in the temp directory that is removed when dropped, pass or fail.
#[cfg(test)]
pub(crate) struct ScratchFile {
    pub path: PathBuf,
}

#[cfg(test)]
impl ScratchFile {
    pub fn new(name: &str, contents: &[u8]) -> Self {
        let path = std::env::temp_dir().join(format!("jsxdom-{}-{}", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        Self { path }
    }
}

#[cfg(test)]
impl Drop for ScratchFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_labels() {
        assert_eq!(Encoding::from_label("UTF-8"), Some(Encoding::Utf8));
        assert_eq!(Encoding::from_label("utf8"), Some(Encoding::Utf8));
        assert_eq!(Encoding::from_label("ucs2"), Some(Encoding::Utf16Le));
        assert_eq!(Encoding::from_label("binary"), Some(Encoding::Latin1));
        assert_eq!(Encoding::from_label("ascii"), Some(Encoding::Ascii));
        assert_eq!(Encoding::from_label("ebcdic"), None);
    }

    #[test]
    fn test_decode() {
        assert_eq!(Encoding::Utf8.decode("héllo".as_bytes()), "héllo");
        assert_eq!(Encoding::Utf8.decode(&[0x61, 0xff]), "a\u{fffd}");
        assert_eq!(Encoding::Latin1.decode(&[0x63, 0x61, 0x66, 0xe9]), "café");
        assert_eq!(Encoding::Ascii.decode(&[0xe1]), "a");
        assert_eq!(Encoding::Utf16Le.decode(&[0x68, 0x00, 0x69, 0x00]), "hi");
    }

    #[test]
    fn test_read_sync() {
        let file = ScratchFile::new("source-sync.jsx", b"let a = 1;");
        assert_eq!(read_source_sync(&file.path, "utf-8").unwrap(), "let a = 1;");
    }

    #[test]
    fn test_read_sync_missing_file() {
        let err = read_source_sync(Path::new("/definitely/not/here.jsx"), "utf-8").unwrap_err();
        assert!(matches!(err, TranspileError::Io { .. }));
    }

    #[test]
    fn test_unknown_encoding_checked_before_read() {
        let err = read_source_sync(Path::new("/definitely/not/here.jsx"), "klingon").unwrap_err();
        assert!(matches!(err, TranspileError::UnknownEncoding { .. }));
    }

    #[tokio::test]
    async fn test_read_async() {
        let file = ScratchFile::new("source-async.jsx", b"let b = 2;");
        assert_eq!(read_source(&file.path, "utf8").await.unwrap(), "let b = 2;");
    }

    #[tokio::test]
    async fn test_read_async_missing_file() {
        let err = read_source(Path::new("/definitely/not/here.jsx"), "utf8")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "IO_ERROR");
    }
}
