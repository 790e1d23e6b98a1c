//! Deterministic per-name color assignment.
//!
//! Objects without a caller-chosen color get a stable color derived from
//! their name, so the same series renders the same way on every run. The
//! assigner is an explicit value owned by the generation pass; nothing is
//! cached in process-global state.

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct ColorAssigner {
    cache: HashMap<String, [u8; 3]>,
}

impl ColorAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stable RGB triple for `name`. Repeated calls with the same name
    /// return the same color.
    pub fn color_for(&mut self, name: &str) -> [u8; 3] {
        if let Some(&c) = self.cache.get(name) {
            return c;
        }
        let h = fnv1a(name.as_bytes());
        // Lift each channel off the dark end so hashed colors stay
        // visible against a black viewer background.
        let channel = |byte: u64| 32 + (byte % 224) as u8;
        let color = [channel(h), channel(h >> 8), channel(h >> 16)];
        self.cache.insert(name.to_string(), color);
        color
    }
}

// FNV-1a, 64-bit.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}
