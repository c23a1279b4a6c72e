// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Fortune Market Simulation - Deterministic RNG
//
// 32-bit linear congruential generator (Numerical Recipes constants). Every
// viewer seeded with the same anchor walks the exact same sequence, which is
// what keeps independent sessions showing the same trades.

use serde::{Deserialize, Serialize};

const MULTIPLIER: u32 = 1_664_525;
const INCREMENT: u32 = 1_013_904_223;
const MODULUS: f64 = 4_294_967_296.0;

const HEX: &[u8; 16] = b"0123456789abcdef";

pub const WALLET_HEX_LEN: usize = 40;
pub const TX_HASH_HEX_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Seed from an epoch-millisecond anchor (reduced mod 2^32).
    pub fn from_anchor(anchor_ms: i64) -> Self {
        Self::new(anchor_ms.rem_euclid(1 << 32) as u32)
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(MULTIPLIER).wrapping_add(INCREMENT);
        self.state
    }

    /// Uniform draw in [0, 1).
    pub fn next_unit(&mut self) -> f64 {
        self.next_u32() as f64 / MODULUS
    }

    /// Uniform integer in [0, bound).
    pub fn next_below(&mut self, bound: u64) -> u64 {
        (self.next_unit() * bound as f64) as u64
    }

    /// Centered noise in [-amplitude / 2, amplitude / 2).
    pub fn next_noise(&mut self, amplitude: f64) -> f64 {
        (self.next_unit() - 0.5) * amplitude
    }

    fn hex_string(&mut self, len: usize) -> String {
        let mut out = String::with_capacity(len + 2);
        out.push_str("0x");
        for _ in 0..len {
            out.push(HEX[self.next_below(16) as usize] as char);
        }
        out
    }

    /// Fresh lowercase 20-byte address.
    pub fn next_wallet(&mut self) -> String {
        self.hex_string(WALLET_HEX_LEN)
    }

    pub fn next_tx_hash(&mut self) -> String {
        self.hex_string(TX_HASH_HEX_LEN)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
