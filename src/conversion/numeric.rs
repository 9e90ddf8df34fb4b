//! PostgreSQL NUMERIC binary format.
//!
//! Binary layout:
//! - 2 bytes: ndigits (number of base-10000 digits)
//! - 2 bytes: weight (position of first digit relative to decimal point)
//! - 2 bytes: sign (0x0000=positive, 0x4000=negative, 0xC000=NaN, 0xD000=+Inf, 0xF000=-Inf)
//! - 2 bytes: dscale (display scale)
//! - ndigits * 2 bytes: digits (each 0-9999 in base 10000)

use crate::error::{Error, Result};
use crate::protocol::codec::{read_i16, read_u16};

const NUMERIC_POS: u16 = 0x0000;
const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

const NBASE: i16 = 10000;

/// Converts PostgreSQL NUMERIC binary encoding to its canonical text form.
///
/// Mirrors `get_str_from_var()` in PostgreSQL's `numeric.c`: the integer part
/// is printed without leading zeros and the fraction is padded or cut to
/// exactly `dscale` digits.
pub fn numeric_to_string(bytes: &[u8]) -> Result<String> {
    if bytes.len() < 8 {
        return Err(Error::Decode(format!(
            "invalid NUMERIC length: {}",
            bytes.len()
        )));
    }
    let (ndigits, rest) = read_i16(bytes)?;
    let (weight, rest) = read_i16(rest)?;
    let (sign, rest) = read_u16(rest)?;
    let (dscale, mut rest) = read_u16(rest)?;

    match sign {
        NUMERIC_NAN => return Ok("NaN".to_string()),
        NUMERIC_PINF => return Ok("Infinity".to_string()),
        NUMERIC_NINF => return Ok("-Infinity".to_string()),
        NUMERIC_POS | NUMERIC_NEG => {}
        _ => return Err(Error::Decode(format!("invalid NUMERIC sign: {:#06x}", sign))),
    }

    if ndigits < 0 || rest.len() != ndigits as usize * 2 {
        return Err(Error::Decode(format!(
            "invalid NUMERIC length: {} (ndigits {})",
            bytes.len(),
            ndigits
        )));
    }

    let mut digits = Vec::with_capacity(ndigits as usize);
    for _ in 0..ndigits {
        let digit;
        (digit, rest) = read_i16(rest)?;
        if !(0..NBASE).contains(&digit) {
            return Err(Error::Decode(format!("invalid NUMERIC digit: {}", digit)));
        }
        digits.push(digit);
    }
    let digit_at = |i: i32| -> i16 {
        if i < 0 {
            0
        } else {
            digits.get(i as usize).copied().unwrap_or(0)
        }
    };

    let mut result = String::new();
    if sign == NUMERIC_NEG {
        result.push('-');
    }

    // Integer part: digit groups 0..=weight
    let weight = weight as i32;
    if weight < 0 {
        result.push('0');
    } else {
        result.push_str(&digit_at(0).to_string());
        for i in 1..=weight {
            result.push_str(&format!("{:04}", digit_at(i)));
        }
    }

    // Fractional part: groups after the weight, cut to dscale digits
    let dscale = dscale as usize;
    if dscale > 0 {
        let mut frac = String::with_capacity(dscale + 4);
        let mut i = weight + 1;
        while frac.len() < dscale {
            frac.push_str(&format!("{:04}", digit_at(i)));
            i += 1;
        }
        frac.truncate(dscale);
        result.push('.');
        result.push_str(&frac);
    }

    Ok(result)
}
