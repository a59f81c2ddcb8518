#![allow(dead_code)]

use rand::Rng;
use std::path::Path;

pub const HEADER_LEN: usize = 32;
pub const HEADER_BYTE: u8 = 0xAB;

/// Encode values as a matrix file: a filler header followed by the data
pub fn encode(values: &[f32], header_len: usize, swap: bool) -> Vec<u8> {
    let mut bytes = vec![HEADER_BYTE; header_len];
    for value in values {
        let mut b = value.to_ne_bytes();
        if swap {
            b.reverse();
        }
        bytes.extend_from_slice(&b);
    }
    bytes
}

pub fn write_matrix_file(path: &Path, values: &[f32], header_len: usize, swap: bool) {
    std::fs::write(path, encode(values, header_len, swap)).unwrap();
}

/// Decode `count` values stored at `offset` in a file
pub fn read_values(path: &Path, offset: usize, count: usize, swap: bool) -> Vec<f32> {
    let bytes = std::fs::read(path).unwrap();
    bytes[offset..offset + count * 4]
        .chunks_exact(4)
        .map(|chunk| {
            let mut b: [u8; 4] = chunk.try_into().unwrap();
            if swap {
                b.reverse();
            }
            f32::from_ne_bytes(b)
        })
        .collect()
}

pub fn sequential(count: usize) -> Vec<f32> {
    (0..count).map(|v| v as f32).collect()
}

pub fn random_matrix(count: usize) -> Vec<f32> {
    let mut rng = rand::thread_rng();
    (0..count).map(|_| rng.gen_range(-1.0f32..1.0)).collect()
}
