use image::{DynamicImage, ImageBuffer, Rgb};
use tempfile::tempdir;

use spotlight_archiver_core::processing::{
    calculate_phash, phash_from_file, Fingerprinter, PerceptualHasher,
};
use spotlight_archiver_core::Error;

fn landscape_scene() -> DynamicImage {
    // Sky over a darker horizon band with a bright sun
    let img = ImageBuffer::from_fn(192, 108, |x, y| {
        let sun = (x as i32 - 140).pow(2) + (y as i32 - 30).pow(2) < 200;
        if sun {
            Rgb([255, 240, 200])
        } else if y > 70 {
            Rgb([30, (60 + x / 4) as u8, 40])
        } else {
            Rgb([(100 + y) as u8, (150 + y) as u8, 230])
        }
    });
    DynamicImage::ImageRgb8(img)
}

#[test]
fn fingerprint_of_saved_file_matches_in_memory_hash() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scene.png");
    let img = landscape_scene();
    img.save(&path).unwrap();

    let from_file = phash_from_file(&path).unwrap();
    assert_eq!(from_file, calculate_phash(&img));

    let fingerprint = PerceptualHasher.fingerprint(&path).unwrap();
    assert_eq!(fingerprint, from_file.to_hex());
    assert_eq!(fingerprint.len(), 16);
    assert!(fingerprint.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[test]
fn resized_copy_stays_close() {
    let dir = tempdir().unwrap();
    let original = landscape_scene();
    let smaller = original.resize_exact(96, 54, image::imageops::FilterType::Triangle);

    let a = dir.path().join("a.png");
    let b = dir.path().join("b.png");
    original.save(&a).unwrap();
    smaller.save(&b).unwrap();

    let distance = phash_from_file(&a).unwrap().distance(&phash_from_file(&b).unwrap());
    assert!(distance <= 10, "distance was {}", distance);
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    let result = PerceptualHasher.fingerprint(&dir.path().join("absent.jpg"));
    assert!(matches!(result, Err(Error::FileNotFound(_))));
}
