//! 8-bit companding over raw byte buffers
//!
//! Every byte is read as a signed 8-bit PCM sample and scaled to 16 bits.
//! Companding runs it through the G.711 encoder, expanding decodes a G.711
//! code and keeps the top byte. Both directions are total over all 256 bytes.
//!
//! Expanding then companding returns the original code for the coarse upper
//! segments only; fine codes near zero collapse onto their neighbours. The
//! other direction moves a sample by at most 2.

use crate::core::g711::{alaw_decode, alaw_encode, ulaw_decode, ulaw_encode};
use crate::core::Companding;
use std::sync::OnceLock;

struct Tables {
    /// sample byte -> code
    compand: [u8; 256],
    /// code -> sample byte
    expand: [u8; 256],
}

impl Tables {
    fn build(encode: fn(i16) -> u8, decode: fn(u8) -> i16) -> Self {
        let mut compand = [0u8; 256];
        let mut expand = [0u8; 256];
        for byte in 0..=255u8 {
            compand[byte as usize] = encode((byte as i8 as i16) << 8);
            expand[byte as usize] = (decode(byte) >> 8) as i8 as u8;
        }
        Tables { compand, expand }
    }
}

fn ulaw_tables() -> &'static Tables {
    static TABLES: OnceLock<Tables> = OnceLock::new();
    TABLES.get_or_init(|| Tables::build(ulaw_encode, ulaw_decode))
}

fn alaw_tables() -> &'static Tables {
    static TABLES: OnceLock<Tables> = OnceLock::new();
    TABLES.get_or_init(|| Tables::build(alaw_encode, alaw_decode))
}

/// compand one sample byte to a μ-law code
pub fn ulaw_compand(sample: u8) -> u8 {
    ulaw_tables().compand[sample as usize]
}

/// expand one μ-law code to a sample byte
pub fn ulaw_expand(code: u8) -> u8 {
    ulaw_tables().expand[code as usize]
}

/// compand one sample byte to an A-law code
pub fn alaw_compand(sample: u8) -> u8 {
    alaw_tables().compand[sample as usize]
}

/// expand one A-law code to a sample byte
pub fn alaw_expand(code: u8) -> u8 {
    alaw_tables().expand[code as usize]
}

/// apply `method` to every byte, returning a new buffer
pub fn apply(buffer: &[u8], method: Companding) -> Vec<u8> {
    let table = match method {
        Companding::Linear => return buffer.to_vec(),
        Companding::ULaw => &ulaw_tables().compand,
        Companding::ALaw => &alaw_tables().compand,
        Companding::InverseULaw => &ulaw_tables().expand,
        Companding::InverseALaw => &alaw_tables().expand,
    };
    buffer.iter().map(|&b| table[b as usize]).collect()
}
