/// Derive an independent sub-seed from a base seed and a lane index.
///
/// SplitMix64-style finalizer: cheap, deterministic, and good enough to keep
/// per-worker and per-column RNG streams uncorrelated. Workers must never
/// share an RNG, so every concurrent consumer gets `mix_seed(global, lane)`.
pub fn mix_seed(seed: u64, lane: u64) -> u64 {
    let mut x = seed ^ lane.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}
