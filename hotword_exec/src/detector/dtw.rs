//! Dynamic time warping
//!
//! Aligns two feature sequences spoken at different speeds and gives the average distance
//! between aligned frames.

use super::features::{frame_distance, Frame};

/// Distance between two sequences, normalised by the length of the longer one.
///
/// Returns `f32::INFINITY` if either sequence is empty.
pub fn dtw_distance(a: &[Frame], b: &[Frame]) -> f32 {
    if a.is_empty() || b.is_empty() {
        return f32::INFINITY
    }

    // Only the previous row of the cost matrix is needed
    let mut prev = vec![f32::INFINITY; b.len() + 1];
    let mut curr = vec![f32::INFINITY; b.len() + 1];
    prev[0] = 0.0;

    for fa in a.iter() {
        curr[0] = f32::INFINITY;

        for (j, fb) in b.iter().enumerate() {
            let best = prev[j].min(prev[j + 1]).min(curr[j]);
            curr[j + 1] = frame_distance(fa, fb) + best;
        }

        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()] / a.len().max(b.len()) as f32
}
