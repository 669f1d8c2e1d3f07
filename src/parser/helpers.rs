//! Helper functions for GPMF value decoding
//!
//! Fixed-point conversions and payload alignment used by the KLV tokenizer.

/// Round a payload length up to the 32-bit alignment GPMF records use
pub fn padded_len(len: usize) -> usize {
    (len + 3) & !3
}

/// Convert a signed Q15.16 fixed-point value to f64
pub fn q15_16_to_f64(raw: i32) -> f64 {
    raw as f64 / 65_536.0
}

/// Convert a signed Q31.32 fixed-point value to f64
pub fn q31_32_to_f64(raw: i64) -> f64 {
    raw as f64 / 4_294_967_296.0
}

/// Decode fixed-width text, one byte per character (GPMF strings are Latin-1)
pub fn latin1_to_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| b as char)
        .collect::<String>()
        .trim_end_matches('\0')
        .to_string()
}
