//! Per-vertex bone influences
//!
//! Meshes may spread influences over several parallel four-slot streams.
//! Exporters expect a single stream, so extra streams are collapsed by
//! summing weights per bone and keeping the four strongest.

use crate::error::{Result, SkinError};

/// Up to four (blend index, weight) pairs of one vertex
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexInfluences {
    pub indices: [u32; 4],
    pub weights: [f32; 4],
}

impl VertexInfluences {
    pub const fn new(indices: [u32; 4], weights: [f32; 4]) -> Self {
        Self { indices, weights }
    }

    /// Pair up parallel index and weight streams
    pub fn from_streams(indices: &[[u32; 4]], weights: &[[f32; 4]]) -> Result<Vec<Self>> {
        if indices.len() != weights.len() {
            return Err(SkinError::SkinningMismatch {
                stream: 0,
                expected: indices.len(),
                actual: weights.len(),
            });
        }

        Ok(indices
            .iter()
            .zip(weights)
            .map(|(&indices, &weights)| Self { indices, weights })
            .collect())
    }

    /// Slots that carry a positive weight
    pub fn active(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.indices
            .iter()
            .zip(self.weights.iter())
            .filter(|&(_, &weight)| weight > 0.0)
            .map(|(&index, &weight)| (index, weight))
    }

    /// Largest index over all four slots, weighted or not
    pub fn max_index(&self) -> u32 {
        self.indices.iter().copied().max().unwrap_or(0)
    }
}

/// Collapse several influence streams into one
///
/// For every vertex, weights are summed per blend index across all streams
/// (non-positive weights are ignored), then the four heaviest indices are
/// kept in descending weight order. Equal weights keep their first-seen
/// order. A vertex with no positive weight gets all-zero indices and weights.
pub fn collapse_streams(streams: &[&[VertexInfluences]]) -> Result<Vec<VertexInfluences>> {
    let Some(first) = streams.first() else {
        return Ok(Vec::new());
    };
    let vertex_count = first.len();

    for (stream, influences) in streams.iter().enumerate() {
        if influences.len() != vertex_count {
            return Err(SkinError::SkinningMismatch {
                stream,
                expected: vertex_count,
                actual: influences.len(),
            });
        }
    }

    let mut totals: Vec<(u32, f32)> = Vec::with_capacity(4 * streams.len());
    let collapsed = (0..vertex_count)
        .map(|vertex| {
            totals.clear();
            for stream in streams {
                for (index, weight) in stream[vertex].active() {
                    match totals.iter_mut().find(|(existing, _)| *existing == index) {
                        Some((_, total)) => *total += weight,
                        None => totals.push((index, weight)),
                    }
                }
            }

            // Stable sort keeps first-seen order among equal weights
            totals.sort_by(|a, b| b.1.total_cmp(&a.1));

            let mut result = VertexInfluences::default();
            for (slot, &(index, weight)) in totals.iter().take(4).enumerate() {
                result.indices[slot] = index;
                result.weights[slot] = weight;
            }
            result
        })
        .collect();

    Ok(collapsed)
}

/// Summary of the raw blend indices of a submesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct BlendIndexStats {
    pub vertex_count: usize,
    /// Largest index over every slot, 0 for an empty submesh
    pub max_index: u32,
}

impl BlendIndexStats {
    pub fn from_influences(influences: &[VertexInfluences]) -> Self {
        Self {
            vertex_count: influences.len(),
            max_index: influences
                .iter()
                .map(VertexInfluences::max_index)
                .max()
                .unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_streams_length_mismatch() {
        let result = VertexInfluences::from_streams(&[[0; 4]; 3], &[[0.0; 4]; 2]);
        assert_eq!(
            result,
            Err(SkinError::SkinningMismatch {
                stream: 0,
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn test_collapse_single_stream_sorts_by_weight() {
        let stream = [VertexInfluences::new([1, 2, 3, 4], [0.1, 0.4, 0.0, 0.5])];
        let collapsed = collapse_streams(&[&stream]).unwrap();

        assert_eq!(
            collapsed,
            vec![VertexInfluences::new([4, 2, 1, 0], [0.5, 0.4, 0.1, 0.0])]
        );
    }

    #[test]
    fn test_collapse_sums_shared_indices_and_keeps_top_four() {
        let first = [VertexInfluences::new([7, 8, 9, 10], [0.2, 0.1, 0.1, 0.05])];
        let second = [VertexInfluences::new([11, 7, 12, 13], [0.25, 0.1, 0.15, 0.05])];
        let collapsed = collapse_streams(&[&first, &second]).unwrap();

        // 7 sums to 0.3; 8 and 9 tie at 0.1 and keep first-seen order
        assert_eq!(collapsed[0].indices, [7, 11, 12, 8]);
        assert!((collapsed[0].weights[0] - 0.3).abs() < 1e-6);
        assert_eq!(collapsed[0].weights[1..], [0.25_f32, 0.15, 0.1]);
    }

    #[test]
    fn test_collapse_vertex_without_weights_is_zeroed() {
        let stream = [VertexInfluences::new([5, 6, 7, 8], [0.0, -1.0, 0.0, 0.0])];
        let collapsed = collapse_streams(&[&stream]).unwrap();
        assert_eq!(collapsed, vec![VertexInfluences::default()]);
    }

    #[test]
    fn test_collapse_rejects_mismatched_streams() {
        let first = [VertexInfluences::default(); 4];
        let second = [VertexInfluences::default(); 3];
        assert_eq!(
            collapse_streams(&[&first, &second]),
            Err(SkinError::SkinningMismatch {
                stream: 1,
                expected: 4,
                actual: 3
            })
        );
        assert_eq!(collapse_streams(&[]), Ok(vec![]));
    }

    #[test]
    fn test_stats_cover_all_slots() {
        let influences = [
            VertexInfluences::new([3, 0, 0, 0], [1.0, 0.0, 0.0, 0.0]),
            VertexInfluences::new([1, 2, 0, 41], [0.5, 0.5, 0.0, 0.0]),
        ];
        assert_eq!(
            BlendIndexStats::from_influences(&influences),
            BlendIndexStats {
                vertex_count: 2,
                max_index: 41
            }
        );
        assert_eq!(BlendIndexStats::from_influences(&[]), BlendIndexStats::default());
    }
}
