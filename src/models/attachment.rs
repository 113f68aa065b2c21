//! Attachment file naming on disk.

/// Extension used when the original filename has none.
pub const DEFAULT_EXTENSION: &str = "dat";

/// Returns the trailing extension of `filename`, if it is made of word characters.
///
/// `report.tar.gz` yields `gz`; `notes`, `notes.` and `a.b-c` yield `None`.
pub fn file_extension(filename: &str) -> Option<&str> {
    let (_, ext) = filename.rsplit_once('.')?;
    let is_word = !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    is_word.then_some(ext)
}

/// Name under which an attachment payload is stored: `a<id>.<ext>`, lower-cased.
pub fn disk_filename(attach_id: i64, filename: &str) -> String {
    let ext = file_extension(filename).unwrap_or(DEFAULT_EXTENSION);
    format!("a{}.{}", attach_id, ext).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_is_last_word_suffix() {
        assert_eq!(file_extension("report.tar.gz"), Some("gz"));
        assert_eq!(file_extension("Screenshot.PNG"), Some("PNG"));
        assert_eq!(file_extension("patch_v2.diff"), Some("diff"));
    }

    #[test]
    fn test_no_extension() {
        assert_eq!(file_extension("README"), None);
        assert_eq!(file_extension("trailing."), None);
        assert_eq!(file_extension("odd.b-c"), None);
    }

    #[test]
    fn test_disk_filename_is_lowercased() {
        assert_eq!(disk_filename(42, "Screenshot.PNG"), "a42.png");
        assert_eq!(disk_filename(7, "crash log"), "a7.dat");
    }
}
