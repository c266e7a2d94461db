use {
    std::io::Cursor,
    crate::error::Result,
};

/// Fingerprint of a fitted vocabulary: every term in index order followed by
/// the bit pattern of its idf weight. Two vectorizers with the same fingerprint
/// produce the same feature rows.
pub fn vocabulary_fingerprint(terms: &[String], idf: &[f64]) -> Result<u32> {
    let mut bytes = Vec::new();
    for (term, weight) in terms.iter().zip(idf) {
        bytes.extend_from_slice(term.as_bytes());
        bytes.push(0);
        bytes.extend_from_slice(&weight.to_bits().to_be_bytes());
    }

    Ok(murmur3::murmur3_32(&mut Cursor::new(bytes), 0)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn fingerprint_is_stable() {
        let a = vocabulary_fingerprint(&terms(&["great sound", "not good"]), &[1.0, 2.0]).unwrap();
        let b = vocabulary_fingerprint(&terms(&["great sound", "not good"]), &[1.0, 2.0]).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_depends_on_order_and_weights() {
        let base = vocabulary_fingerprint(&terms(&["great sound", "not good"]), &[1.0, 2.0]).unwrap();
        let swapped = vocabulary_fingerprint(&terms(&["not good", "great sound"]), &[1.0, 2.0]).unwrap();
        let reweighted = vocabulary_fingerprint(&terms(&["great sound", "not good"]), &[1.0, 2.5]).unwrap();

        assert_ne!(base, swapped);
        assert_ne!(base, reweighted);
    }
}
