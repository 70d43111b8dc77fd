//! Allocation-free helpers for record lines and region labels.

use memchr::{memchr, memchr_iter};

use crate::error::{AnnotateError, Result};

/// Fast u64 parsing - no allocation, no error formatting.
///
/// Returns None if the input is empty, contains non-digit characters or
/// does not fit in a u64.
#[inline(always)]
pub fn parse_u64_fast(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() {
        return None;
    }
    let mut n: u64 = 0;
    for &b in bytes {
        let d = b.wrapping_sub(b'0');
        if d > 9 {
            return None;
        }
        n = n.checked_mul(10)?.checked_add(d as u64)?;
    }
    Some(n)
}

/// Check if a line carries no record (empty, comment, header or browser line).
#[inline(always)]
pub fn should_skip_line(line: &[u8]) -> bool {
    line.is_empty()
        || line[0] == b'#'
        || line[0] == b'@'
        || line.starts_with(b"track")
        || line.starts_with(b"browser")
}

/// Split a line into its tab-separated fields.
#[inline]
pub fn split_fields(line: &str) -> Vec<&str> {
    let bytes = line.as_bytes();
    let mut fields = Vec::with_capacity(16);
    let mut from = 0;
    while let Some(tab) = memchr(b'\t', &bytes[from..]) {
        fields.push(&line[from..from + tab]);
        from += tab + 1;
    }
    fields.push(&line[from..]);
    fields
}

/// Byte offset of the first `_f` or `_r` separator at or after `from`.
#[inline]
fn find_strand_separator(label: &[u8], from: usize) -> Option<usize> {
    memchr_iter(b'_', &label[from..])
        .map(|i| from + i)
        .find(|&i| matches!(label.get(i + 1), Some(b'f') | Some(b'r')))
}

/// Split a region label such as `TCGA6K_f12` into `("TCGA6K", 11)`.
///
/// The text before the first `_f`/`_r` separator is the gene key; the text
/// up to the next separator is a one-based exon number, returned zero-based.
pub fn parse_region_label(label: &str) -> Result<(&str, u32)> {
    let malformed = |reason: &str| AnnotateError::MalformedRegionLabel {
        label: label.to_string(),
        reason: reason.to_string(),
    };

    let bytes = label.as_bytes();
    let sep = find_strand_separator(bytes, 0)
        .ok_or_else(|| malformed("missing _f/_r separator"))?;
    let gene_key = &label[..sep];
    if gene_key.is_empty() {
        return Err(malformed("empty gene name"));
    }

    let number_start = sep + 2;
    let number_end = find_strand_separator(bytes, number_start).unwrap_or(bytes.len());
    let number = parse_u64_fast(&bytes[number_start..number_end])
        .ok_or_else(|| malformed("exon number is not an integer"))?;
    if number == 0 || number > u32::MAX as u64 {
        return Err(malformed("exon number out of range"));
    }

    Ok((gene_key, (number - 1) as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u64_fast() {
        assert_eq!(parse_u64_fast(b"12345"), Some(12345));
        assert_eq!(parse_u64_fast(b"0"), Some(0));
        assert_eq!(parse_u64_fast(b""), None);
        assert_eq!(parse_u64_fast(b"abc"), None);
        assert_eq!(parse_u64_fast(b"123abc"), None);
        assert_eq!(parse_u64_fast(b"18446744073709551615"), Some(u64::MAX));
        assert_eq!(parse_u64_fast(b"18446744073709551616"), None);
    }

    #[test]
    fn test_should_skip_line() {
        assert!(should_skip_line(b""));
        assert!(should_skip_line(b"#comment"));
        assert!(should_skip_line(b"@SQ\tSN:chr1\tLN:100"));
        assert!(should_skip_line(b"track name=foo"));
        assert!(should_skip_line(b"browser position chr1:1-100"));
        assert!(!should_skip_line(b"chr1\t100\t200"));
    }

    #[test]
    fn test_split_fields() {
        assert_eq!(split_fields("chr1\t100\t200"), vec!["chr1", "100", "200"]);
        assert_eq!(split_fields("a\t\tb"), vec!["a", "", "b"]);
        assert_eq!(split_fields("single"), vec!["single"]);
    }

    #[test]
    fn test_parse_region_label() {
        assert_eq!(parse_region_label("TCGA6K_f12").unwrap(), ("TCGA6K", 11));
        assert_eq!(parse_region_label("EGFR_r1").unwrap(), ("EGFR", 0));
        assert_eq!(parse_region_label("KIT_f3_r9").unwrap(), ("KIT", 2));
        // Underscores that are not separators stay in the gene key
        assert_eq!(parse_region_label("MY_GENE_f2").unwrap(), ("MY_GENE", 1));
    }

    #[test]
    fn test_parse_region_label_malformed() {
        for label in ["TCGA6K", "TCGA6K_fx", "TCGA6K_f", "_f2", "GENE_f0", ""] {
            let err = parse_region_label(label).unwrap_err();
            assert!(
                matches!(err, AnnotateError::MalformedRegionLabel { .. }),
                "expected malformed label error for {:?}",
                label
            );
        }
    }
}
