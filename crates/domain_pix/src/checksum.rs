//! Generic CRC16 computation
//!
//! The BR Code payload is terminated by a CRC16/CCITT-FALSE checksum:
//! polynomial 0x1021, initial register 0xFFFF, no final XOR, most
//! significant bit first, processed byte at a time.

/// A CRC16 parameterised by polynomial and initial register value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc16 {
    polynomial: u16,
    initial: u16,
}

impl Crc16 {
    /// CRC16/CCITT-FALSE, the variant mandated for BR Code payloads
    pub const CCITT_FALSE: Crc16 = Crc16 {
        polynomial: 0x1021,
        initial: 0xFFFF,
    };

    /// Creates a codec with explicit parameters
    pub fn new(polynomial: u16, initial: u16) -> Self {
        Self {
            polynomial,
            initial,
        }
    }

    /// Computes the checksum over a byte string
    ///
    /// Empty input is a programmer error: there is no valid payload prefix
    /// of length zero.
    pub fn checksum(&self, bytes: &[u8]) -> u16 {
        assert!(!bytes.is_empty(), "CRC16 input must not be empty");

        let mut register = self.initial;
        for &byte in bytes {
            register ^= (byte as u16) << 8;
            for _ in 0..8 {
                if register & 0x8000 != 0 {
                    register = (register << 1) ^ self.polynomial;
                } else {
                    register <<= 1;
                }
            }
        }
        register
    }

    /// Computes the checksum and formats it as four uppercase hex digits
    pub fn hex(&self, bytes: &[u8]) -> String {
        format!("{:04X}", self.checksum(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        // "123456789" is the standard CRC check string; CCITT-FALSE -> 0x29B1.
        let crc = Crc16::CCITT_FALSE;
        assert_eq!(crc.checksum(b"123456789"), 0x29B1);
        assert_eq!(crc.hex(b"123456789"), "29B1");
    }

    #[test]
    fn test_single_byte() {
        let crc = Crc16::CCITT_FALSE;
        assert_eq!(crc.checksum(b"A"), 0xB915);
    }

    #[test]
    fn test_deterministic_across_calls() {
        let crc = Crc16::CCITT_FALSE;
        let payload = b"00020126330014BR.GOV.BCB.PIX6304";
        let first = crc.checksum(payload);
        let _ = crc.checksum(b"unrelated");
        assert_eq!(crc.checksum(payload), first);
    }

    #[test]
    #[should_panic(expected = "must not be empty")]
    fn test_empty_input_panics() {
        Crc16::CCITT_FALSE.checksum(b"");
    }
}
