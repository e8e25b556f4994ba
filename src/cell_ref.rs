//! Utilities for Excel-style `A1` cell references.

/// Parse a cell reference from raw bytes (ASCII) into (col, row), 0-indexed.
///
/// Works directly on XML attribute values (`attr.value` from quick-xml).
/// `$` anchors are ignored.
pub fn parse_cell_ref_bytes(ref_bytes: &[u8]) -> Option<(u32, u32)> {
    let mut col: u32 = 0;
    let mut row: u32 = 0;
    let mut saw_col = false;
    let mut saw_row = false;

    for &b in ref_bytes {
        if b == b'$' {
            continue;
        }
        if b.is_ascii_alphabetic() {
            if saw_row {
                return None;
            }
            let upper = b.to_ascii_uppercase();
            col = col
                .saturating_mul(26)
                .saturating_add(u32::from(upper - b'A') + 1);
            saw_col = true;
        } else if b.is_ascii_digit() {
            row = row.saturating_mul(10).saturating_add(u32::from(b - b'0'));
            saw_row = true;
        } else {
            return None;
        }
    }

    if !saw_col || !saw_row || row == 0 {
        return None;
    }

    Some((col.saturating_sub(1), row.saturating_sub(1)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(b"A1", Some((0, 0)) ; "origin")]
    #[test_case(b"$C$12", Some((2, 11)) ; "anchored")]
    #[test_case(b"aa3", Some((26, 2)) ; "lowercase")]
    #[test_case(b"XFD1048576", Some((16383, 1_048_575)) ; "last cell")]
    #[test_case(b"A", None ; "no row")]
    #[test_case(b"12", None ; "no column")]
    #[test_case(b"1A", None ; "reversed")]
    #[test_case(b"B0", None ; "row zero")]
    fn test_parse_cell_ref_bytes(input: &[u8], expected: Option<(u32, u32)>) {
        assert_eq!(parse_cell_ref_bytes(input), expected);
    }
}
