//! Context triggered piecewise hashing in the spamsum/ssdeep format:
//! `blocksize:hash1:hash2`, where hash2 is computed at twice the block size.

const ROLLING_WINDOW: usize = 7;
const MIN_BLOCKSIZE: u32 = 3;
const HASH_PRIME: u32 = 0x0100_0193;
const HASH_INIT: u32 = 0x2802_1967;
const SPAMSUM_LENGTH: usize = 64;
const B64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

#[derive(Default)]
struct RollingHash {
    window: [u8; ROLLING_WINDOW],
    h1: u32,
    h2: u32,
    h3: u32,
    n: usize,
}

impl RollingHash {
    fn roll(&mut self, c: u8) -> u32 {
        let slot = self.n % ROLLING_WINDOW;
        self.h2 = self.h2.wrapping_sub(self.h1);
        self.h2 = self.h2.wrapping_add(ROLLING_WINDOW as u32 * c as u32);
        self.h1 = self.h1.wrapping_add(c as u32);
        self.h1 = self.h1.wrapping_sub(self.window[slot] as u32);
        self.window[slot] = c;
        self.n += 1;
        self.h3 = (self.h3 << 5) ^ c as u32;
        self.h1.wrapping_add(self.h2).wrapping_add(self.h3)
    }
}

fn sum_hash(c: u8, h: u32) -> u32 {
    h.wrapping_mul(HASH_PRIME) ^ c as u32
}

fn put(sig: &mut Vec<u8>, index: usize, value: u8) {
    if index < sig.len() {
        sig[index] = value;
    } else {
        sig.push(value);
    }
}

/// Both signatures at `block_size`, plus the number of trigger points hit at
/// that size. The count excludes the trailing character.
fn digest_at(data: &[u8], block_size: u32) -> (Vec<u8>, Vec<u8>, usize) {
    let mut roll = RollingHash::default();
    let mut rh = 0u32;
    let (mut h2, mut h3) = (HASH_INIT, HASH_INIT);
    let (mut j, mut k) = (0usize, 0usize);
    let mut sig1 = Vec::with_capacity(SPAMSUM_LENGTH);
    let mut sig2 = Vec::with_capacity(SPAMSUM_LENGTH / 2);

    for &c in data {
        rh = roll.roll(c);
        h2 = sum_hash(c, h2);
        h3 = sum_hash(c, h3);

        if rh % block_size == block_size - 1 {
            put(&mut sig1, j, B64[(h2 % 64) as usize]);
            if j < SPAMSUM_LENGTH - 1 {
                h2 = HASH_INIT;
                j += 1;
            }
        }
        if rh % (block_size * 2) == block_size * 2 - 1 {
            put(&mut sig2, k, B64[(h3 % 64) as usize]);
            if k < SPAMSUM_LENGTH / 2 - 1 {
                h3 = HASH_INIT;
                k += 1;
            }
        }
    }

    if rh != 0 {
        put(&mut sig1, j, B64[(h2 % 64) as usize]);
        put(&mut sig2, k, B64[(h3 % 64) as usize]);
    }

    (sig1, sig2, j)
}

/// Computes the fuzzy digest of `data`.
pub fn hash(data: &[u8]) -> String {
    let mut block_size = MIN_BLOCKSIZE;
    while (block_size as usize) * SPAMSUM_LENGTH < data.len() {
        block_size *= 2;
    }

    loop {
        let (sig1, sig2, triggers) = digest_at(data, block_size);
        // Too few trigger points: halve the block size and retry.
        if block_size > MIN_BLOCKSIZE && triggers < SPAMSUM_LENGTH / 2 {
            block_size /= 2;
            continue;
        }
        return format!(
            "{}:{}:{}",
            block_size,
            String::from_utf8_lossy(&sig1),
            String::from_utf8_lossy(&sig2)
        );
    }
}
