//! # Perceptual Hashing Module
//!
//! DCT-based perceptual hash used to fingerprint downloaded wallpapers.
//!
//! Perceptual hashing generates "fingerprints" that remain similar for visually similar images,
//! unlike cryptographic hashes where minor changes produce completely different outputs. The
//! same Spotlight picture is regularly served under different URLs (per locale, per campaign),
//! and the fingerprint is what lets the archive notice it.
//!
//! ## Algorithm
//!
//! 1. Convert to grayscale and resize to 32×32
//! 2. Apply a 2-D DCT-II (rows, then columns)
//! 3. Keep the low-frequency 8×8 block
//! 4. Set a bit for every coefficient at or above the median of the block (DC term excluded)
//!
//! The 64 bits are rendered as 16 lowercase hex digits, row-major, most significant bit first.
//!
//! ## Hamming Distance Interpretation
//!
//! - 0: Same picture (possibly re-encoded)
//! - 1-10: Similar images (crops, watermark, colour grading)
//! - >10: Different images

use image::imageops::FilterType;
use image::DynamicImage;
use rustdct::DctPlanner;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};

const IMG_SIZE: usize = 32;
const HASH_SIZE: usize = 8;

/// A perceptual hash represented as a 64-bit value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PHash(pub u64);

impl PHash {
    /// Calculate the Hamming distance between two perceptual hashes
    pub fn distance(&self, other: &PHash) -> u32 {
        (self.0 ^ other.0).count_ones()
    }

    /// Check if two images are perceptually similar based on a threshold
    pub fn is_similar(&self, other: &PHash, threshold: u32) -> bool {
        self.distance(other) <= threshold
    }

    /// 16 lowercase hex digits
    pub fn to_hex(&self) -> String {
        format!("{:016x}", self.0)
    }
}

impl fmt::Display for PHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for PHash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        u64::from_str_radix(s.trim(), 16)
            .map(PHash)
            .map_err(|e| Error::Configuration(format!("Invalid perceptual hash '{}': {}", s, e)))
    }
}

/// Calculate a 64-bit DCT perceptual hash for an image
pub fn calculate_phash(img: &DynamicImage) -> PHash {
    let small = img
        .grayscale()
        .resize_exact(IMG_SIZE as u32, IMG_SIZE as u32, FilterType::Lanczos3)
        .to_luma8();

    let mut matrix: Vec<f32> = small.pixels().map(|p| p[0] as f32).collect();

    let mut planner = DctPlanner::new();
    let dct = planner.plan_dct2(IMG_SIZE);

    // Rows
    for row in matrix.chunks_exact_mut(IMG_SIZE) {
        dct.process_dct2(row);
    }

    // Columns
    let mut column = [0.0f32; IMG_SIZE];
    for x in 0..IMG_SIZE {
        for y in 0..IMG_SIZE {
            column[y] = matrix[y * IMG_SIZE + x];
        }
        dct.process_dct2(&mut column);
        for y in 0..IMG_SIZE {
            matrix[y * IMG_SIZE + x] = column[y];
        }
    }

    let mut low = [0.0f32; HASH_SIZE * HASH_SIZE];
    for y in 0..HASH_SIZE {
        for x in 0..HASH_SIZE {
            low[y * HASH_SIZE + x] = matrix[y * IMG_SIZE + x];
        }
    }

    // Median of the AC coefficients; the DC term only encodes overall brightness
    let mut ac = low[1..].to_vec();
    ac.sort_by(|a, b| a.total_cmp(b));
    let median = ac[ac.len() / 2];

    let mut hash: u64 = 0;
    for (i, &coefficient) in low.iter().enumerate() {
        if coefficient >= median {
            hash |= 1u64 << (63 - i);
        }
    }

    PHash(hash)
}

/// Calculate a perceptual hash from an image file
///
/// The format is sniffed from the content, so a PNG saved under `.jpg` still decodes.
pub fn phash_from_file<P: AsRef<Path>>(path: P) -> Result<PHash> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    let img = image::io::Reader::open(path)?
        .with_guessed_format()?
        .decode()?;
    Ok(calculate_phash(&img))
}

/// Computes the fingerprint of an image file already written to disk
pub trait Fingerprinter {
    fn fingerprint(&self, path: &Path) -> Result<String>;
}

/// Default fingerprinter: hex-encoded DCT perceptual hash
#[derive(Debug, Default, Clone, Copy)]
pub struct PerceptualHasher;

impl Fingerprinter for PerceptualHasher {
    fn fingerprint(&self, path: &Path) -> Result<String> {
        Ok(phash_from_file(path)?.to_hex())
    }
}
