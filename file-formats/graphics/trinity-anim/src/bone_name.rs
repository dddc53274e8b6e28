//! Bone name normalization
//!
//! Exported rigs often prefix bone names with a namespace or node path
//! (`rig:Hips`, `Armature|Hips`, `root/spine/Hips`). Animation tracks and
//! skeletons are matched on the bare bone name.

/// Strip namespace and path prefixes from a bone name
///
/// Keeps the segment after the last `:`, then after the last `|`, then after
/// the last `/` or `\`. A separator at the very end of the name is ignored.
/// Surrounding whitespace is trimmed.
pub fn normalize_bone_name(name: &str) -> &str {
    let mut name = name.trim();
    if name.is_empty() {
        return name;
    }

    name = after_last(name, |c| c == ':');
    name = after_last(name, |c| c == '|');
    name = after_last(name, |c| c == '/' || c == '\\');

    name.trim()
}

/// Lowercase lookup key for a bone name
pub fn bone_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn after_last(name: &str, is_separator: impl Fn(char) -> bool) -> &str {
    match name.rfind(is_separator) {
        // Separators are single-byte ASCII, so `pos + 1` is a char boundary
        Some(pos) if pos + 1 < name.len() => &name[pos + 1..],
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("Hips", "Hips" ; "bare name")]
    #[test_case("rig:Hips", "Hips" ; "namespace")]
    #[test_case("a:b:Hips", "Hips" ; "nested namespace")]
    #[test_case("Armature|Hips", "Hips" ; "pipe path")]
    #[test_case("root/spine/Hips", "Hips" ; "slash path")]
    #[test_case("root\\spine\\Hips", "Hips" ; "backslash path")]
    #[test_case("ns:Armature|root/Hips", "Hips" ; "mixed separators")]
    #[test_case("  rig:Hips  ", "Hips" ; "whitespace")]
    #[test_case("rig:", "rig:" ; "trailing separator")]
    #[test_case("", "" ; "empty")]
    #[test_case("   ", "" ; "blank")]
    fn test_normalize_bone_name(input: &str, expected: &str) {
        assert_eq!(normalize_bone_name(input), expected);
    }

    #[test]
    fn test_bone_key_lowercases() {
        assert_eq!(bone_key(" Waist_BONE "), "waist_bone");
    }
}
