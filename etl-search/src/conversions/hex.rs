/// Lowercase hex digits indexed by nibble value.
const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Encodes bytes as a lowercase hex string without prefix.
///
/// Used when binary values end up in document ids or document fields.
pub fn encode_hex(bytes: &[u8]) -> String {
    let mut result = String::with_capacity(bytes.len() * 2);

    for byte in bytes {
        result.push(char::from(HEX_DIGITS[usize::from(byte >> 4)]));
        result.push(char::from(HEX_DIGITS[usize::from(byte & 0x0f)]));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_hex_empty() {
        assert_eq!(encode_hex(&[]), "");
    }

    #[test]
    fn encode_hex_multiple_bytes() {
        assert_eq!(encode_hex(b"Hello"), "48656c6c6f");
        assert_eq!(encode_hex(&[0x00, 0x0f, 0xf0, 0xff]), "000ff0ff");
    }
}
