//! Payload file discovery.
//!
//! Payloads are message files named `<prefix>_<size>.<ext>`, for example
//! `message_0128.txt`. The token after the first `_`, up to the next `_` or
//! `.`, is the size label, which names the stego image written for that payload and
//! labels its report row.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Naming rules for payload files and the stego images derived from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingConvention {
    /// Extension of payload files, without the dot.
    pub payload_extension: String,
    /// Separator between the prefix and the size label.
    pub separator: char,
    /// Prefix of generated stego image names.
    pub output_prefix: String,
    /// Extension of generated stego images, without the dot.
    pub output_extension: String,
}

impl Default for NamingConvention {
    fn default() -> Self {
        Self {
            payload_extension: "txt".to_string(),
            separator: '_',
            output_prefix: "stego_".to_string(),
            output_extension: "png".to_string(),
        }
    }
}

impl NamingConvention {
    /// Whether `file_name` carries the payload extension.
    #[must_use]
    pub fn is_payload(&self, file_name: &str) -> bool {
        Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e == self.payload_extension)
    }

    /// Extract the size label from a payload file name.
    ///
    /// Returns `None` when the name has no separator or the label is empty.
    #[must_use]
    pub fn size_label(&self, file_name: &str) -> Option<String> {
        let after = file_name.split(self.separator).nth(1)?;
        let label = after.split('.').next().unwrap_or(after);
        if label.is_empty() {
            None
        } else {
            Some(label.to_string())
        }
    }

    /// File name of the stego image for a size label.
    #[must_use]
    pub fn output_file_name(&self, size_label: &str) -> String {
        format!("{}{}.{}", self.output_prefix, size_label, self.output_extension)
    }
}

/// A payload message file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadFile {
    /// Full path to the file.
    pub path: PathBuf,
    /// File name without directory.
    pub file_name: String,
    /// Size label extracted from the file name.
    pub size_label: String,
    /// Length of the message in bytes.
    pub byte_len: u64,
}

/// Enumerate payload files in `dir`, sorted by file name.
///
/// Files without the payload extension are ignored. Files with the extension
/// whose name carries no size label are skipped with a warning.
pub fn discover_payloads(dir: &Path, convention: &NamingConvention) -> Result<Vec<PayloadFile>> {
    if !dir.is_dir() {
        return Err(Error::PayloadDiscovery(format!(
            "Not a directory: {}",
            dir.display()
        )));
    }

    let entries = fs::read_dir(dir).map_err(|e| {
        Error::PayloadDiscovery(format!("Failed to read directory {}: {}", dir.display(), e))
    })?;

    let mut payloads = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            Error::PayloadDiscovery(format!("Failed to read entry in {}: {}", dir.display(), e))
        })?;

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let Some(file_name) = path.file_name().and_then(|s| s.to_str()).map(str::to_string)
        else {
            continue;
        };
        if !convention.is_payload(&file_name) {
            continue;
        }

        let Some(size_label) = convention.size_label(&file_name) else {
            log::warn!("Skipping {}: no size label in file name", path.display());
            continue;
        };

        let byte_len = fs::metadata(&path)?.len();
        payloads.push(PayloadFile {
            path,
            file_name,
            size_label,
            byte_len,
        });
    }

    payloads.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    log::debug!("Discovered {} payloads in {}", payloads.len(), dir.display());

    Ok(payloads)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_label() {
        let conv = NamingConvention::default();
        assert_eq!(conv.size_label("message_0128.txt").as_deref(), Some("0128"));
        assert_eq!(conv.size_label("msg_1k_extra.txt").as_deref(), Some("1k"));
        assert_eq!(conv.size_label("msg_64.tar.txt").as_deref(), Some("64"));
        assert_eq!(conv.size_label("nolabel.txt"), None);
        assert_eq!(conv.size_label("trailing_.txt"), None);
    }

    #[test]
    fn test_output_file_name() {
        let conv = NamingConvention::default();
        assert_eq!(conv.output_file_name("0256"), "stego_0256.png");
    }

    #[test]
    fn test_is_payload() {
        let conv = NamingConvention::default();
        assert!(conv.is_payload("a_1.txt"));
        assert!(!conv.is_payload("a_1.md"));
        assert!(!conv.is_payload("txt"));
    }

    #[test]
    fn test_discover_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("text_0512.txt"), vec![b'a'; 512]).unwrap();
        fs::write(dir.path().join("text_0064.txt"), vec![b'b'; 64]).unwrap();
        fs::write(dir.path().join("text_0128.txt"), vec![b'c'; 128]).unwrap();
        fs::write(dir.path().join("notes.md"), "ignored").unwrap();
        fs::write(dir.path().join("README.txt"), "no label").unwrap();
        fs::create_dir(dir.path().join("sub_1.txt")).unwrap();

        let payloads = discover_payloads(dir.path(), &NamingConvention::default()).unwrap();
        let labels: Vec<&str> = payloads.iter().map(|p| p.size_label.as_str()).collect();
        assert_eq!(labels, ["0064", "0128", "0512"]);
        assert_eq!(payloads[0].byte_len, 64);
        assert_eq!(payloads[2].byte_len, 512);
        assert_eq!(payloads[1].file_name, "text_0128.txt");
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_follows_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let texts = dir.path().join("texts");
        fs::create_dir(&texts).unwrap();
        let target = dir.path().join("message.bin");
        fs::write(&target, vec![b'x'; 5000]).unwrap();
        std::os::unix::fs::symlink(&target, texts.join("msg_5000.txt")).unwrap();

        let payloads = discover_payloads(&texts, &NamingConvention::default()).unwrap();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].size_label, "5000");
        assert_eq!(payloads[0].byte_len, 5000);
    }

    #[test]
    fn test_discover_missing_dir() {
        let result = discover_payloads(Path::new("/nonexistent/payloads"), &NamingConvention::default());
        assert!(matches!(result, Err(Error::PayloadDiscovery(_))));
    }
}
