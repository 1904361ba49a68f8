//! Deterministic color assignment for board labels.
//!
//! New labels without an explicit color get one from a fixed palette, keyed
//! by the label name, so the same name always renders the same color.

/// Palette of label colors (6-char hex without `#`), readable as pill
/// backgrounds on light and dark boards.
const LABEL_PALETTE: &[&str] = &[
    "b60205", // red
    "d93f0b", // orange
    "fbca04", // yellow
    "0e8a16", // green
    "006b75", // teal
    "1d76db", // blue
    "0052cc", // navy
    "5319e7", // purple
    "e99695", // salmon
    "c2e0c6", // mint
    "bfdadc", // fog
    "d4c5f9", // lavender
];

/// Return the deterministic color for a label name.
pub fn label_color(name: &str) -> &'static str {
    LABEL_PALETTE[(fnv1a(name) as usize) % LABEL_PALETTE.len()]
}

/// FNV-1a (32-bit), plenty for short label names.
fn fnv1a(s: &str) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in s.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_color_deterministic() {
        assert_eq!(label_color("urgent"), label_color("urgent"));
    }

    #[test]
    fn test_label_color_is_palette_hex() {
        for name in &["urgent", "blocked", "design", "backend", "p1"] {
            let color = label_color(name);
            assert_eq!(color.len(), 6);
            assert!(color.chars().all(|c| c.is_ascii_hexdigit()));
            assert!(LABEL_PALETTE.contains(&color));
        }
    }

    #[test]
    fn test_palette_spread() {
        let mut seen = std::collections::HashSet::new();
        for i in 0..100 {
            seen.insert(label_color(&format!("label-{}", i)));
        }
        assert!(seen.len() >= 6, "only hit {} palette entries", seen.len());
    }
}
