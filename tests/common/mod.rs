#![allow(dead_code)]

/// Row-major grid of `size` x `size` quads split into two triangles each.
pub fn grid(size: u32) -> (Vec<u32>, usize) {
    let stride = size + 1;
    let mut indices = Vec::with_capacity((size * size * 6) as usize);
    for y in 0..size {
        for x in 0..size {
            let i = y * stride + x;
            indices.extend_from_slice(&[i, i + 1, i + stride]);
            indices.extend_from_slice(&[i + 1, i + stride + 1, i + stride]);
        }
    }
    (indices, (stride * stride) as usize)
}

pub fn sorted_triangles(indices: &[u32]) -> Vec<[u32; 3]> {
    let mut triangles: Vec<[u32; 3]> = indices
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();
    triangles.sort_unstable();
    triangles
}
