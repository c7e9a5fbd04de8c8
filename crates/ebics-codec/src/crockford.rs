//! Base32-Crockford encoding, case-insensitive with the standard alias rules
//! (`O -> 0`, `I`/`L -> 1`, `U -> V`), and the fixed-size 32/64-byte wrappers
//! used for reserve-pubs, WTIDs, and generic hash codes on the wire.

use std::fmt;

const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CrockfordError {
    #[error("invalid Base32-Crockford character: {0:?}")]
    InvalidChar(char),
    #[error("decoded length {actual} does not match expected length {expected}")]
    WrongLength { expected: usize, actual: usize },
    #[error("trailing bits after decoding are non-zero")]
    NonZeroPadding,
}

/// Encodes raw bytes as upper-case Base32-Crockford, 5 bits at a time.
pub fn encode(input: &[u8]) -> String {
    let mut out = String::with_capacity((input.len() * 8).div_ceil(5));
    let mut buffer: u32 = 0;
    let mut bits_in_buffer: u32 = 0;
    for &byte in input {
        buffer = (buffer << 8) | byte as u32;
        bits_in_buffer += 8;
        while bits_in_buffer >= 5 {
            bits_in_buffer -= 5;
            let idx = (buffer >> bits_in_buffer) & 0x1f;
            out.push(ALPHABET[idx as usize] as char);
        }
    }
    if bits_in_buffer > 0 {
        let idx = (buffer << (5 - bits_in_buffer)) & 0x1f;
        out.push(ALPHABET[idx as usize] as char);
    }
    out
}

fn decode_symbol(c: char) -> Result<u8, CrockfordError> {
    let normalised = match c.to_ascii_uppercase() {
        'O' => '0',
        'I' | 'L' => '1',
        'U' => 'V',
        other => other,
    };
    ALPHABET
        .iter()
        .position(|&b| b as char == normalised)
        .map(|p| p as u8)
        .ok_or(CrockfordError::InvalidChar(c))
}

/// Decodes a Base32-Crockford string into raw bytes.
///
/// Applies the alias substitutions (`O->0`, `I/L->1`, `U->V`) and is
/// case-insensitive. Does not enforce any particular output length; callers
/// needing a fixed size should use [`HashCode32`]/[`HashCode64`].
pub fn decode(input: &str) -> Result<Vec<u8>, CrockfordError> {
    let mut buffer: u32 = 0;
    let mut bits_in_buffer: u32 = 0;
    let mut out = Vec::with_capacity(input.len() * 5 / 8);
    for c in input.chars() {
        let value = decode_symbol(c)?;
        buffer = (buffer << 5) | value as u32;
        bits_in_buffer += 5;
        if bits_in_buffer >= 8 {
            bits_in_buffer -= 8;
            out.push(((buffer >> bits_in_buffer) & 0xff) as u8);
        }
    }
    // Any leftover bits must be zero padding, not data.
    if bits_in_buffer > 0 {
        let mask = (1u32 << bits_in_buffer) - 1;
        if buffer & mask != 0 {
            return Err(CrockfordError::NonZeroPadding);
        }
    }
    Ok(out)
}

fn decode_fixed<const N: usize>(input: &str) -> Result<[u8; N], CrockfordError> {
    let bytes = decode(input)?;
    if bytes.len() != N {
        return Err(CrockfordError::WrongLength {
            expected: N,
            actual: bytes.len(),
        });
    }
    let mut array = [0u8; N];
    array.copy_from_slice(&bytes);
    Ok(array)
}

macro_rules! fixed_hash_code {
    ($name:ident, $n:expr, $encoded_len:expr) => {
        #[doc = concat!("A fixed ", stringify!($n), "-byte hash code, Base32-Crockford encoded on the wire.")]
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub [u8; $n]);

        impl $name {
            pub const ENCODED_LEN: usize = $encoded_len;

            pub fn parse(s: &str) -> Result<Self, CrockfordError> {
                let trimmed = s.trim();
                if trimmed.len() != Self::ENCODED_LEN {
                    return Err(CrockfordError::WrongLength {
                        expected: Self::ENCODED_LEN,
                        actual: trimmed.len(),
                    });
                }
                Ok(Self(decode_fixed::<$n>(trimmed)?))
            }

            pub fn as_bytes(&self) -> &[u8; $n] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", encode(&self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), encode(&self.0))
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                $name::parse(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

fixed_hash_code!(HashCode32, 32, 52);
fixed_hash_code!(HashCode64, 64, 103);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_arbitrary_bytes() {
        for len in [0usize, 1, 4, 5, 16, 32, 64, 100] {
            let input: Vec<u8> = (0..len).map(|i| (i * 37 + 11) as u8).collect();
            let encoded = encode(&input);
            let decoded = decode(&encoded).unwrap();
            assert_eq!(decoded, input);
        }
    }

    #[test]
    fn decode_accepts_alias_characters() {
        let canonical = encode(&[0xDE, 0xAD, 0xBE, 0xEF]);
        let aliased: String = canonical
            .chars()
            .map(|c| match c {
                '0' => 'O',
                '1' => 'I',
                'V' => 'U',
                other => other,
            })
            .collect();
        assert_eq!(decode(&aliased).unwrap(), decode(&canonical).unwrap());
    }

    #[test]
    fn hash_code32_round_trip() {
        let bytes = [7u8; 32];
        let code = HashCode32(bytes);
        let text = code.to_string();
        assert_eq!(text.len(), HashCode32::ENCODED_LEN);
        let parsed = HashCode32::parse(&text).unwrap();
        assert_eq!(parsed.0, bytes);
    }

    #[test]
    fn hash_code64_rejects_wrong_length() {
        let err = HashCode64::parse("short").unwrap_err();
        assert!(matches!(err, CrockfordError::WrongLength { .. }));
    }

    #[test]
    fn rejects_invalid_character() {
        let err = decode("!!!!").unwrap_err();
        assert!(matches!(err, CrockfordError::InvalidChar('!')));
    }
}
