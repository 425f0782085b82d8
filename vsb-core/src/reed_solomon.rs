//! Reed-Solomon RS(207,187) over GF(256), as used by ATSC A/53.
//!
//! - Field: GF(2^8), primitive polynomial x^8 + x^4 + x^3 + x^2 + 1 (0x11D), α = 2
//! - Code: RS(255,235) shortened to 207 bytes, t = 10
//! - Generator roots: α^120 .. α^139
//!
//! Codewords are stored highest-degree coefficient first: byte `p` is the
//! coefficient of x^(206 - p), the 187 payload bytes come first and the 20
//! parity bytes last.

use crate::error::{Error, Result};
use crate::framing::{CODEWORD_LEN, MAX_CORRECTABLE, PARITY_LEN, PAYLOAD_LEN};

const PRIMITIVE_POLY: u16 = 0x11D;
const GF_ORDER: usize = 255;
const GF_EXP_LEN: usize = 2 * GF_ORDER + 2;
/// Exponent of the first generator root.
pub const FIRST_ROOT: usize = 120;

/// Log / antilog tables for GF(256). Built at compile time.
pub struct Gf256 {
    exp: [u8; GF_EXP_LEN],
    log: [u8; 256],
}

pub static GF: Gf256 = Gf256::build();

impl Gf256 {
    const fn build() -> Self {
        let mut exp = [0u8; GF_EXP_LEN];
        let mut log = [0u8; 256];

        let mut i = 0usize;
        let mut x: u16 = 1;
        while i < GF_ORDER {
            exp[i] = x as u8;
            log[x as usize] = i as u8;
            x <<= 1;
            if x & 0x100 != 0 {
                x ^= PRIMITIVE_POLY;
            }
            i += 1;
        }
        // Duplicate so that log[a] + log[b] never needs a modulo.
        let mut j = GF_ORDER;
        while j < GF_EXP_LEN {
            exp[j] = exp[j - GF_ORDER];
            j += 1;
        }

        Self { exp, log }
    }

    #[inline]
    pub fn mul(&self, a: u8, b: u8) -> u8 {
        if a == 0 || b == 0 {
            return 0;
        }
        self.exp[self.log[a as usize] as usize + self.log[b as usize] as usize]
    }

    #[inline]
    pub fn div(&self, a: u8, b: u8) -> u8 {
        debug_assert!(b != 0, "division by zero in GF(256)");
        if a == 0 {
            return 0;
        }
        self.exp[self.log[a as usize] as usize + GF_ORDER - self.log[b as usize] as usize]
    }

    /// α^power for any integer power.
    #[inline]
    pub fn alpha_pow(&self, power: isize) -> u8 {
        self.exp[power.rem_euclid(GF_ORDER as isize) as usize]
    }

    /// Evaluate a polynomial stored highest degree first.
    fn eval_msb_first(&self, poly: &[u8], x: u8) -> u8 {
        poly.iter().fold(0u8, |acc, &c| self.mul(acc, x) ^ c)
    }

    /// Evaluate a polynomial stored lowest degree first.
    fn eval_lsb_first(&self, poly: &[u8], x: u8) -> u8 {
        poly.iter().rev().fold(0u8, |acc, &c| self.mul(acc, x) ^ c)
    }
}

/// A successfully decoded codeword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCodeword {
    pub payload: [u8; PAYLOAD_LEN],
    /// Bytes repaired by the decoder. Zero means the syndromes were all zero
    /// and no correction was attempted.
    pub corrected: usize,
}

/// RS(207,187) encoder and decoder.
#[derive(Debug, Clone)]
pub struct ReedSolomon {
    /// Monic generator polynomial, highest degree first (21 coefficients).
    generator: [u8; PARITY_LEN + 1],
}

impl Default for ReedSolomon {
    fn default() -> Self {
        Self::new()
    }
}

impl ReedSolomon {
    pub fn new() -> Self {
        let mut generator = [0u8; PARITY_LEN + 1];
        generator[0] = 1;
        let mut len = 1;
        // g(x) = prod (x + α^(120 + j))
        for j in 0..PARITY_LEN {
            let root = GF.alpha_pow((FIRST_ROOT + j) as isize);
            for k in (1..=len).rev() {
                generator[k] ^= GF.mul(generator[k - 1], root);
            }
            len += 1;
        }
        Self { generator }
    }

    pub fn generator(&self) -> &[u8; PARITY_LEN + 1] {
        &self.generator
    }

    /// Systematic encode: payload followed by 20 parity bytes.
    pub fn encode(&self, payload: &[u8; PAYLOAD_LEN]) -> [u8; CODEWORD_LEN] {
        let mut remainder = [0u8; PARITY_LEN];
        for &byte in payload {
            let feedback = byte ^ remainder[0];
            remainder.copy_within(1.., 0);
            remainder[PARITY_LEN - 1] = 0;
            if feedback != 0 {
                for (r, &g) in remainder.iter_mut().zip(&self.generator[1..]) {
                    *r ^= GF.mul(g, feedback);
                }
            }
        }

        let mut codeword = [0u8; CODEWORD_LEN];
        codeword[..PAYLOAD_LEN].copy_from_slice(payload);
        codeword[PAYLOAD_LEN..].copy_from_slice(&remainder);
        codeword
    }

    /// The 20 syndromes S_j = C(α^(120 + j)). All zero for a valid codeword.
    pub fn syndromes(&self, codeword: &[u8]) -> [u8; PARITY_LEN] {
        let mut syndromes = [0u8; PARITY_LEN];
        for (j, s) in syndromes.iter_mut().enumerate() {
            *s = GF.eval_msb_first(codeword, GF.alpha_pow((FIRST_ROOT + j) as isize));
        }
        syndromes
    }

    /// Decode a 207-byte codeword, correcting up to 10 byte errors.
    pub fn decode(&self, codeword: &[u8]) -> Result<DecodedCodeword> {
        if codeword.len() != CODEWORD_LEN {
            return Err(Error::InvalidCodewordLength {
                expected: CODEWORD_LEN,
                got: codeword.len(),
            });
        }

        let syndromes = self.syndromes(codeword);
        if syndromes.iter().all(|&s| s == 0) {
            return Ok(DecodedCodeword {
                payload: payload_of(codeword),
                corrected: 0,
            });
        }

        let lambda = berlekamp_massey(&syndromes);
        let degree = degree_of(&lambda);
        let omega = error_evaluator(&syndromes, &lambda);

        // Chien search: Λ(α^-i) == 0 marks an error in the coefficient of x^i.
        let mut locations: Vec<usize> = Vec::with_capacity(MAX_CORRECTABLE);
        for i in 0..CODEWORD_LEN {
            if GF.eval_lsb_first(&lambda[..=degree], GF.alpha_pow(-(i as isize))) == 0 {
                locations.push(i);
            }
        }

        if locations.is_empty() {
            return Err(Error::NoErrorLocations);
        }
        if locations.len() > MAX_CORRECTABLE {
            return Err(Error::TooManyErrors {
                found: locations.len(),
            });
        }
        if locations.len() != degree {
            return Err(Error::LocatorMismatch {
                degree,
                roots: locations.len(),
            });
        }

        let mut corrected = [0u8; CODEWORD_LEN];
        corrected.copy_from_slice(codeword);

        for &i in &locations {
            let x_inv = GF.alpha_pow(-(i as isize));
            // Formal derivative keeps only the odd terms of Λ.
            let mut denominator = 0u8;
            let mut x_inv_pow = 1u8; // x_inv^(k - 1) for odd k
            let x_inv_sq = GF.mul(x_inv, x_inv);
            for k in (1..=degree).step_by(2) {
                denominator ^= GF.mul(lambda[k], x_inv_pow);
                x_inv_pow = GF.mul(x_inv_pow, x_inv_sq);
            }
            if denominator == 0 {
                return Err(Error::ForneyDivisionByZero);
            }
            let numerator = GF.eval_lsb_first(&omega, x_inv);
            // Y = X^(1 - b) Ω(X^-1) / Λ'(X^-1) with X = α^i, b = 120.
            let scale = GF.alpha_pow((i as isize) * (1 - FIRST_ROOT as isize));
            let magnitude = GF.mul(scale, GF.div(numerator, denominator));
            corrected[CODEWORD_LEN - 1 - i] ^= magnitude;
        }

        if self.syndromes(&corrected).iter().any(|&s| s != 0) {
            return Err(Error::CorrectionFailed);
        }

        Ok(DecodedCodeword {
            payload: payload_of(&corrected),
            corrected: locations.len(),
        })
    }
}

fn payload_of(codeword: &[u8]) -> [u8; PAYLOAD_LEN] {
    let mut payload = [0u8; PAYLOAD_LEN];
    payload.copy_from_slice(&codeword[..PAYLOAD_LEN]);
    payload
}

fn degree_of(poly: &[u8]) -> usize {
    poly.iter().rposition(|&c| c != 0).unwrap_or(0)
}

/// Error locator Λ(x), lowest degree first, from the syndrome sequence.
fn berlekamp_massey(syndromes: &[u8; PARITY_LEN]) -> [u8; PARITY_LEN + 1] {
    let mut lambda = [0u8; PARITY_LEN + 1];
    lambda[0] = 1;
    // B(x): Λ as it was the last time the register length changed.
    let mut prev = [0u8; PARITY_LEN + 1];
    prev[0] = 1;

    let mut l = 0usize;
    let mut m = 1usize;
    let mut prev_discrepancy = 1u8;

    for n in 0..PARITY_LEN {
        let mut d = syndromes[n];
        for i in 1..=l {
            d ^= GF.mul(lambda[i], syndromes[n - i]);
        }

        if d == 0 {
            m += 1;
            continue;
        }

        let scale = GF.div(d, prev_discrepancy);
        let saved = lambda;
        // Λ(x) -= (d / d') x^m B(x)
        for i in 0..=PARITY_LEN - m {
            lambda[i + m] ^= GF.mul(scale, prev[i]);
        }

        if 2 * l <= n {
            l = n + 1 - l;
            prev = saved;
            prev_discrepancy = d;
            m = 1;
        } else {
            m += 1;
        }
    }

    lambda
}

/// Ω(x) = S(x) Λ(x) mod x^20, lowest degree first.
fn error_evaluator(syndromes: &[u8; PARITY_LEN], lambda: &[u8; PARITY_LEN + 1]) -> [u8; PARITY_LEN] {
    let mut omega = [0u8; PARITY_LEN];
    for (k, o) in omega.iter_mut().enumerate() {
        for j in 0..=k {
            *o ^= GF.mul(syndromes[j], lambda[k - j]);
        }
    }
    omega
}
