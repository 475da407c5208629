/// Maps a plant display name to a safe file-name stem.
///
/// Every character outside `[A-Za-z0-9._-]` becomes an underscore, so the
/// result is stable across runs and re-sanitizing it is a no-op.
pub fn sanitize_filename(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "plant".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replaces_illegal_characters() {
        assert_eq!(sanitize_filename("My plant (roof)"), "My_plant__roof_");
        assert_eq!(sanitize_filename("a/b\\c:d"), "a_b_c_d");
    }

    #[test]
    fn test_idempotent() {
        let once = sanitize_filename("Söder terrace #2");
        assert_eq!(sanitize_filename(&once), once);
    }

    #[test]
    fn test_empty_name_gets_fallback() {
        assert_eq!(sanitize_filename("   "), "plant");
    }
}
