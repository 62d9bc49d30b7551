//! Constants for BFV presets
//!
//! Every plaintext modulus is a power of two below the smallest ciphertext modulus, and
//! `t^2` stays far below `q` so that wrap-arounds of signed fixed-point sums do not disturb
//! decryption.

/// Degree 4096 preset. Fast enough for tests and demos.
pub mod aggregation_4096 {
    pub const DEGREE: usize = 4096;
    pub const PLAINTEXT_MODULUS: u64 = 1 << 30;
    pub const MODULI: &[u64] = &[0xffffee001, 0xffffc4001, 0x1ffffe0001];
    /// Fractional bits used by the fixed-point encoder
    pub const SCALE_BITS: u32 = 14;
    /// Contributions a sum may hold. Single values stay below ±2048.
    pub const MAX_CONTRIBUTIONS: u32 = 16;
}

/// Degree 8192 preset. The default.
pub mod aggregation_8192 {
    pub const DEGREE: usize = 8192;
    pub const PLAINTEXT_MODULUS: u64 = 1 << 40;
    pub const MODULI: &[u64] = &[0x0100000002a20001, 0x0100000001760001];
    /// Fractional bits used by the fixed-point encoder
    pub const SCALE_BITS: u32 = 20;
    /// Contributions a sum may hold. Single values stay below ±4096.
    pub const MAX_CONTRIBUTIONS: u32 = 128;
}

/// Default values for BFV parameters
pub mod defaults {
    /// Error variance used by the fhe crate when none is set explicitly
    pub const VARIANCE: usize = 10;
}
