use std::path::Path;

/// Get file extension from path (without the dot)
pub fn get_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
}

/// Name under which an upload is stored: original stem, a short content
/// hash so repeated uploads of the same name do not collide, and the
/// lowercased extension
pub fn stored_file_name(original_name: &str, bytes: &[u8]) -> String {
    let path = Path::new(original_name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(sanitize_stem)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "upload".to_string());
    let hash = blake3::hash(bytes).to_hex();
    match get_extension(path) {
        Some(ext) => format!("{}_{}.{}", stem, &hash[..8], ext),
        None => format!("{}_{}", stem, &hash[..8]),
    }
}

fn sanitize_stem(stem: &str) -> String {
    stem.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// First `max_chars` characters of `text`, never splitting a character
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Remove markdown code-fence wrapping (```json ... ```) from a model reply
pub fn strip_code_fences(raw: &str) -> &str {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix("```") {
        // Drop the info string (e.g. "json") on the opening fence line
        s = match rest.find('\n') {
            Some(idx) if rest[..idx].trim().chars().all(|c| c.is_ascii_alphanumeric()) => &rest[idx + 1..],
            _ => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
        };
    }
    if let Some(rest) = s.trim_end().strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_extension_lowercase() {
        let path = Path::new("/path/to/scan.PNG");
        assert_eq!(get_extension(path), Some("png".to_string()));
    }

    #[test]
    fn test_get_extension_no_extension() {
        assert_eq!(get_extension(Path::new("/path/to/file")), None);
    }

    #[test]
    fn test_stored_file_name_keeps_stem_and_extension() {
        let name = stored_file_name("Tax Return 2024.PDF", b"%PDF-1.4");
        assert!(name.starts_with("Tax_Return_2024_"));
        assert!(name.ends_with(".pdf"));
    }

    #[test]
    fn test_stored_file_name_differs_by_content() {
        let a = stored_file_name("scan.png", b"one");
        let b = stored_file_name("scan.png", b"two");
        assert_ne!(a, b);
    }

    #[test]
    fn test_stored_file_name_without_stem() {
        let name = stored_file_name("", b"data");
        assert!(name.starts_with("upload_"));
    }

    #[test]
    fn test_truncate_chars_counts_characters() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 100), "short");
        assert_eq!(truncate_chars("", 5), "");
    }

    #[test]
    fn test_strip_code_fences_json_block() {
        let raw = "```json\n{\"title\": \"A\"}\n```";
        assert_eq!(strip_code_fences(raw), "{\"title\": \"A\"}");
    }

    #[test]
    fn test_strip_code_fences_bare_block() {
        let raw = "  ```\n{}\n```  ";
        assert_eq!(strip_code_fences(raw), "{}");
    }

    #[test]
    fn test_strip_code_fences_inline_tag() {
        assert_eq!(strip_code_fences("```json{\"a\": 1}```"), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_code_fences_plain_json_untouched() {
        assert_eq!(strip_code_fences(" {\"a\": 1} "), "{\"a\": 1}");
    }
}
