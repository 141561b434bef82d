use super::types::{Fingerprint, HashAlgorithm};
use crate::common::{CompareError, CompareResult};
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, RgbImage};

// The structural hash samples a finer luminance grid than its final bit
// count so the DCT has frequencies to work with.
const STRUCTURAL_WORKING_FACTOR: u32 = 4;

/// Compute a perceptual fingerprint for an image.
pub fn fingerprint(
    image: &RgbImage,
    algorithm: HashAlgorithm,
    grid_size: u32,
) -> CompareResult<Fingerprint> {
    if grid_size < 2 {
        return Err(CompareError::Configuration {
            message: format!("hash grid size must be at least 2, got {}", grid_size),
        });
    }

    let bits = match algorithm {
        HashAlgorithm::Structural => structural_bits(image, grid_size),
        HashAlgorithm::Gradient => gradient_bits(image, grid_size),
    };

    let bit_len = (grid_size * grid_size) as usize;
    Ok(Fingerprint {
        algorithm,
        grid_size,
        bits: pack_bits(&bits),
        bit_len,
    })
}

/// Hamming distance between two fingerprints.
pub fn distance(a: &Fingerprint, b: &Fingerprint) -> CompareResult<u32> {
    if a.algorithm != b.algorithm {
        return Err(CompareError::Configuration {
            message: format!(
                "fingerprints use different algorithms ({} vs {})",
                a.algorithm, b.algorithm
            ),
        });
    }
    if a.bit_len != b.bit_len {
        return Err(CompareError::Configuration {
            message: format!(
                "fingerprints have different lengths ({} vs {} bits); \
                 grid sizes must match",
                a.bit_len, b.bit_len
            ),
        });
    }

    let dist = a
        .bits
        .iter()
        .zip(b.bits.iter())
        .map(|(x, y)| (x ^ y).count_ones())
        .sum();
    Ok(dist)
}

/// Deterministic downscale + grayscale. Triangle filtering keeps equal
/// inputs bit-identical across runs.
fn luminance_grid(image: &RgbImage, width: u32, height: u32) -> GrayImage {
    DynamicImage::ImageRgb8(image.clone())
        .resize_exact(width, height, FilterType::Triangle)
        .to_luma8()
}

fn gradient_bits(image: &RgbImage, grid_size: u32) -> Vec<bool> {
    // One extra column so every cell has a right-hand neighbor.
    let gray = luminance_grid(image, grid_size + 1, grid_size);

    let mut bits = Vec::with_capacity((grid_size * grid_size) as usize);
    for y in 0..grid_size {
        for x in 0..grid_size {
            let left = gray.get_pixel(x, y)[0];
            let right = gray.get_pixel(x + 1, y)[0];
            bits.push(left > right);
        }
    }
    bits
}

fn structural_bits(image: &RgbImage, grid_size: u32) -> Vec<bool> {
    let working = grid_size * STRUCTURAL_WORKING_FACTOR;
    let gray = luminance_grid(image, working, working);

    let n = working as usize;
    let mut samples = vec![0.0f64; n * n];
    for y in 0..working {
        for x in 0..working {
            samples[y as usize * n + x as usize] = f64::from(gray.get_pixel(x, y)[0]);
        }
    }

    let coeffs = dct_2d(&samples, n);

    // Keep the sign bits of the lowest-frequency grid_size x grid_size block.
    let mut bits = Vec::with_capacity((grid_size * grid_size) as usize);
    for v in 0..grid_size as usize {
        for u in 0..grid_size as usize {
            bits.push(coeffs[v * n + u] >= 0.0);
        }
    }
    bits
}

/// Orthonormal 2-D DCT-II, rows then columns.
fn dct_2d(samples: &[f64], n: usize) -> Vec<f64> {
    let mut rows = vec![0.0f64; n * n];
    for y in 0..n {
        let row = &samples[y * n..(y + 1) * n];
        let transformed = dct_1d(row);
        rows[y * n..(y + 1) * n].copy_from_slice(&transformed);
    }

    let mut out = vec![0.0f64; n * n];
    let mut column = vec![0.0f64; n];
    for x in 0..n {
        for y in 0..n {
            column[y] = rows[y * n + x];
        }
        let transformed = dct_1d(&column);
        for y in 0..n {
            out[y * n + x] = transformed[y];
        }
    }
    out
}

fn dct_1d(input: &[f64]) -> Vec<f64> {
    let n = input.len();
    let scale0 = (1.0 / n as f64).sqrt();
    let scale = (2.0 / n as f64).sqrt();

    (0..n)
        .map(|u| {
            let sum: f64 = input
                .iter()
                .enumerate()
                .map(|(x, &value)| {
                    value
                        * ((2.0 * x as f64 + 1.0) * u as f64 * std::f64::consts::PI
                            / (2.0 * n as f64))
                            .cos()
                })
                .sum();
            sum * if u == 0 { scale0 } else { scale }
        })
        .collect()
}

fn pack_bits(bits: &[bool]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(bits.len().div_ceil(8));
    let mut current: u8 = 0;
    let mut position = 0;

    for &bit in bits {
        if bit {
            current |= 1 << (7 - position);
        }
        position += 1;
        if position == 8 {
            bytes.push(current);
            current = 0;
            position = 0;
        }
    }
    if position > 0 {
        bytes.push(current);
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid_image(color: Rgb<u8>) -> RgbImage {
        RgbImage::from_pixel(100, 100, color)
    }

    fn horizontal_gradient() -> RgbImage {
        RgbImage::from_fn(100, 100, |x, _| {
            let v = (x * 255 / 99) as u8;
            Rgb([v, v, v])
        })
    }

    fn reversed_gradient() -> RgbImage {
        RgbImage::from_fn(100, 100, |x, _| {
            let v = ((99 - x) * 255 / 99) as u8;
            Rgb([v, v, v])
        })
    }

    #[test]
    fn test_fingerprint_is_idempotent() {
        let img = horizontal_gradient();
        for algorithm in [HashAlgorithm::Structural, HashAlgorithm::Gradient] {
            let a = fingerprint(&img, algorithm, 8).unwrap();
            let b = fingerprint(&img, algorithm, 8).unwrap();
            assert_eq!(a, b);
            assert_eq!(distance(&a, &b).unwrap(), 0);
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = fingerprint(&horizontal_gradient(), HashAlgorithm::Gradient, 8).unwrap();
        let b = fingerprint(&solid_image(Rgb([40, 40, 40])), HashAlgorithm::Gradient, 8).unwrap();
        assert_eq!(distance(&a, &b).unwrap(), distance(&b, &a).unwrap());
    }

    #[test]
    fn test_opposite_gradients_differ() {
        let a = fingerprint(&horizontal_gradient(), HashAlgorithm::Gradient, 8).unwrap();
        let b = fingerprint(&reversed_gradient(), HashAlgorithm::Gradient, 8).unwrap();
        assert!(distance(&a, &b).unwrap() > 0);
    }

    #[test]
    fn test_gradient_bit_length() {
        let fp8 = fingerprint(&solid_image(Rgb([128, 128, 128])), HashAlgorithm::Gradient, 8)
            .unwrap();
        assert_eq!(fp8.algorithm(), HashAlgorithm::Gradient);
        assert_eq!(fp8.grid_size(), 8);
        assert_eq!(fp8.bit_len(), 64);
        assert_eq!(fp8.as_bytes().len(), 8);

        let fp16 = fingerprint(&solid_image(Rgb([128, 128, 128])), HashAlgorithm::Gradient, 16)
            .unwrap();
        assert_eq!(fp16.bit_len(), 256);
        assert_eq!(fp16.as_bytes().len(), 32);
    }

    #[test]
    fn test_mismatched_grid_sizes_rejected() {
        let img = horizontal_gradient();
        let a = fingerprint(&img, HashAlgorithm::Gradient, 8).unwrap();
        let b = fingerprint(&img, HashAlgorithm::Gradient, 16).unwrap();
        let err = distance(&a, &b).unwrap_err();
        assert!(matches!(err, CompareError::Configuration { .. }));
    }

    #[test]
    fn test_mismatched_algorithms_rejected() {
        let img = horizontal_gradient();
        let a = fingerprint(&img, HashAlgorithm::Structural, 8).unwrap();
        let b = fingerprint(&img, HashAlgorithm::Gradient, 8).unwrap();
        assert!(distance(&a, &b).is_err());
    }

    #[test]
    fn test_zero_grid_size_rejected() {
        let err = fingerprint(&horizontal_gradient(), HashAlgorithm::Gradient, 0).unwrap_err();
        assert!(matches!(err, CompareError::Configuration { .. }));
    }

    #[test]
    fn test_structural_hash_sees_structure_change() {
        // A block appearing in an otherwise flat image flips low-frequency
        // coefficient signs.
        let flat = solid_image(Rgb([200, 200, 200]));
        let mut with_block = flat.clone();
        for y in 30..70 {
            for x in 30..70 {
                with_block.put_pixel(x, y, Rgb([10, 10, 10]));
            }
        }

        let a = fingerprint(&flat, HashAlgorithm::Structural, 8).unwrap();
        let b = fingerprint(&with_block, HashAlgorithm::Structural, 8).unwrap();
        assert!(distance(&a, &b).unwrap() > 0);
    }

    #[test]
    fn test_pack_bits_msb_first() {
        let bits = [true, false, false, false, false, false, false, true, true];
        let packed = pack_bits(&bits);
        assert_eq!(packed, vec![0b1000_0001, 0b1000_0000]);
    }

    #[test]
    fn test_dct_flat_signal_concentrates_in_dc() {
        let coeffs = dct_1d(&[5.0; 8]);
        assert!(coeffs[0] > 0.0);
        for c in &coeffs[1..] {
            assert!(c.abs() < 1e-9);
        }
    }
}
