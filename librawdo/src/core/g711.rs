//! ITU-T G.711 primitives (16-bit linear <-> 8-bit code)

const ULAW_BIAS: i32 = 0x84;
const ULAW_CLIP: i32 = 32635;

/// a-law segment end points, on the 13-bit magnitude
const ALAW_SEG_END: [i32; 8] = [0x1F, 0x3F, 0x7F, 0xFF, 0x1FF, 0x3FF, 0x7FF, 0xFFF];

/// encode a 16-bit linear sample to a μ-law code
pub fn ulaw_encode(pcm: i16) -> u8 {
    let sign: u8 = if pcm < 0 { 0x80 } else { 0x00 };
    let magnitude = (pcm as i32).abs().min(ULAW_CLIP) + ULAW_BIAS;

    let mut exponent: u8 = 7;
    let mut mask = 0x4000;
    while exponent > 0 && magnitude & mask == 0 {
        exponent -= 1;
        mask >>= 1;
    }

    let mantissa = ((magnitude >> (exponent + 3)) & 0x0F) as u8;
    !(sign | (exponent << 4) | mantissa)
}

/// decode a μ-law code to a 16-bit linear sample
pub fn ulaw_decode(code: u8) -> i16 {
    let u = !code;
    let t = ((((u & 0x0F) as i32) << 3) + ULAW_BIAS) << ((u & 0x70) >> 4);
    if u & 0x80 != 0 {
        (ULAW_BIAS - t) as i16
    } else {
        (t - ULAW_BIAS) as i16
    }
}

/// encode a 16-bit linear sample to an A-law code
pub fn alaw_encode(pcm: i16) -> u8 {
    let mut pcm = (pcm as i32) >> 3;
    let mask: u8 = if pcm >= 0 {
        0xD5
    } else {
        pcm = -pcm - 1;
        0x55
    };

    let seg = ALAW_SEG_END
        .iter()
        .position(|&end| pcm <= end)
        .unwrap_or(ALAW_SEG_END.len());
    if seg >= ALAW_SEG_END.len() {
        return 0x7F ^ mask;
    }

    let shift = if seg < 2 { 1 } else { seg };
    let aval = ((seg as u8) << 4) | ((pcm >> shift) & 0x0F) as u8;
    aval ^ mask
}

/// decode an A-law code to a 16-bit linear sample
pub fn alaw_decode(code: u8) -> i16 {
    let a = code ^ 0x55;
    let mut t = ((a & 0x0F) as i32) << 4;
    let seg = ((a & 0x70) >> 4) as i32;
    match seg {
        0 => t += 8,
        1 => t += 0x108,
        _ => t = (t + 0x108) << (seg - 1),
    }
    if a & 0x80 != 0 {
        t as i16
    } else {
        -t as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ulaw_silence() {
        assert_eq!(ulaw_encode(0), 0xFF);
        assert_eq!(ulaw_decode(0xFF), 0);
        assert_eq!(ulaw_decode(0x7F), 0);
    }

    #[test]
    fn test_ulaw_extremes() {
        assert_eq!(ulaw_decode(0x80), 32124);
        assert_eq!(ulaw_decode(0x00), -32124);
        assert_eq!(ulaw_encode(i16::MAX), 0x80);
        assert_eq!(ulaw_encode(i16::MIN), 0x00);
    }

    #[test]
    fn test_alaw_extremes() {
        assert_eq!(alaw_decode(0xD5), 8);
        assert_eq!(alaw_decode(0x55), -8);
        assert_eq!(alaw_decode(0xAA), 32256);
        assert_eq!(alaw_decode(0x2A), -32256);
    }

    #[test]
    fn test_codes_survive_decode_encode() {
        for code in 0..=255u8 {
            let expected_ulaw = if code == 0x7F { 0xFF } else { code };
            assert_eq!(ulaw_encode(ulaw_decode(code)), expected_ulaw, "μ-law {code:#04x}");
            assert_eq!(alaw_encode(alaw_decode(code)), code, "a-law {code:#04x}");
        }
    }
}
