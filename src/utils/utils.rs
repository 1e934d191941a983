/// u8_to_f32_vec decodes a raw little-endian f32 tensor. Trailing bytes that do
/// not form a full value are dropped.
pub fn u8_to_f32_vec(v: &[u8]) -> Vec<f32> {
    v.chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// argsort_desc returns the indices of `v` ordered by descending value.
/// NaN entries sort last; ties keep their original order.
pub fn argsort_desc(v: &[f32]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..v.len()).collect();
    idx.sort_by(|&a, &b| match (v[a].is_nan(), v[b].is_nan()) {
        (true, true) => std::cmp::Ordering::Equal,
        (true, false) => std::cmp::Ordering::Greater,
        (false, true) => std::cmp::Ordering::Less,
        (false, false) => v[b].total_cmp(&v[a]),
    });
    idx
}
