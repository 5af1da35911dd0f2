//! Shared key generation for storage backends.
//!
//! Key format: `uploads/{uuid}.{ext}` (extension lowercased, omitted when the
//! original filename has none). The random component makes keys
//! collision-resistant regardless of the uploaded filename.

use uuid::Uuid;

/// Generate a storage key for an uploaded file.
pub fn object_key(original_filename: &str) -> String {
    let id = Uuid::new_v4();
    match extension_of(original_filename) {
        Some(ext) => format!("uploads/{}.{}", id, ext),
        None => format!("uploads/{}", id),
    }
}

/// Lowercased extension of a filename, if it has one.
pub fn extension_of(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_keeps_extension() {
        let key = object_key("Quarterly Report.PDF");
        assert!(key.starts_with("uploads/"));
        assert!(key.ends_with(".pdf"));
    }

    #[test]
    fn test_object_key_without_extension() {
        let key = object_key("README");
        assert!(key.starts_with("uploads/"));
        assert!(!key.contains('.'));
    }

    #[test]
    fn test_object_keys_are_unique_per_call() {
        assert_ne!(object_key("a.txt"), object_key("a.txt"));
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("doc.docx"), Some("docx".to_string()));
        assert_eq!(extension_of("archive.tar.gz"), Some("gz".to_string()));
        assert_eq!(extension_of("noext"), None);
    }
}
