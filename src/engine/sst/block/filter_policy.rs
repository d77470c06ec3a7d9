use crate::util::coding::decode_fixed32;

pub trait FilterPolicy: Send + Sync {
    /// Stored in the meta block as `filter.<name>`. Changing the encoding
    /// requires a new name.
    fn name(&self) -> &str;

    /// Build one filter over `keys`.
    fn create_filter(&self, keys: &[&[u8]]) -> Vec<u8>;

    /// `false` only if `key` was definitely not passed to `create_filter`.
    fn key_may_match(&self, key: &[u8], filter: &[u8]) -> bool;
}

pub struct BloomFilterPolicy {
    bits_per_key: usize,
    k: u8,
}

impl BloomFilterPolicy {
    pub fn new(bits_per_key: usize) -> Self {
        // k ~ ln2 * bits_per_key minimizes the false-positive rate
        let k = ((bits_per_key as f64) * 0.69).round().clamp(1.0, 30.0) as u8;
        Self { bits_per_key, k }
    }
}

impl FilterPolicy for BloomFilterPolicy {
    fn name(&self) -> &str {
        "sstkv.BuiltinBloomFilter"
    }

    fn create_filter(&self, keys: &[&[u8]]) -> Vec<u8> {
        // tiny filters have a very high false-positive rate otherwise
        let bits = (keys.len() * self.bits_per_key).max(64);
        let bytes = bits.div_ceil(8);
        let bits = bytes * 8;

        let mut filter = vec![0u8; bytes];
        for key in keys {
            let mut h = bloom_hash(key);
            let delta = h.rotate_right(17);
            for _ in 0..self.k {
                let bitpos = (h as usize) % bits;
                filter[bitpos / 8] |= 1 << (bitpos % 8);
                h = h.wrapping_add(delta);
            }
        }
        filter.push(self.k);
        filter
    }

    fn key_may_match(&self, key: &[u8], filter: &[u8]) -> bool {
        if filter.len() < 2 {
            return false;
        }
        let bits = (filter.len() - 1) * 8;
        let k = filter[filter.len() - 1];
        if k > 30 {
            // reserved for future encodings; treat as a match
            return true;
        }

        let mut h = bloom_hash(key);
        let delta = h.rotate_right(17);
        for _ in 0..k {
            let bitpos = (h as usize) % bits;
            if filter[bitpos / 8] & (1 << (bitpos % 8)) == 0 {
                return false;
            }
            h = h.wrapping_add(delta);
        }
        true
    }
}

fn bloom_hash(key: &[u8]) -> u32 {
    hash(key, 0xbc9f_1d34)
}

/// Murmur-style 32-bit hash.
fn hash(data: &[u8], seed: u32) -> u32 {
    const M: u32 = 0xc6a4_a793;
    const R: u32 = 24;

    let mut h = seed ^ (data.len() as u32).wrapping_mul(M);

    let mut chunks = data.chunks_exact(4);
    for chunk in &mut chunks {
        let w = decode_fixed32(chunk).unwrap_or_default();
        h = h.wrapping_add(w).wrapping_mul(M);
        h ^= h >> 16;
    }

    let rest = chunks.remainder();
    if !rest.is_empty() {
        for (i, &b) in rest.iter().enumerate() {
            h = h.wrapping_add((b as u32) << (8 * i));
        }
        h = h.wrapping_mul(M);
        h ^= h >> R;
    }
    h
}
