// Perceptual hashing of downloaded images
pub mod perceptual;

pub use perceptual::{calculate_phash, phash_from_file, Fingerprinter, PHash, PerceptualHasher};
