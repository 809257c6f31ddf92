//! Centroid clustering: k-means with k-means++ seeding.
//!
//! Points are plain coordinate slices; clusters refer back to them by index
//! so callers can map members to whatever the points were built from.

use rand::Rng;

/// Hard cap on assignment rounds. Practical inputs converge well before it.
pub const MAX_ITERATIONS: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub centroid: Vec<f64>,
    /// Indices into the input points, ascending.
    pub members: Vec<usize>,
}

impl Cluster {
    pub fn is_empty(&self) -> bool { self.members.is_empty() }
}

/// Why clustering produced nothing. Both are successful, empty outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    NoPoints,
    TooFewPoints,
}

/// `min(k, n)`, or the reason clustering is skipped when that is below 2.
pub fn effective_k(num_points: usize, k: usize) -> Result<usize, Skip> {
    if num_points == 0 {
        return Err(Skip::NoPoints);
    }
    let k = k.min(num_points);
    if k < 2 {
        return Err(Skip::TooFewPoints);
    }
    Ok(k)
}

pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Partition `points` into at most `k` clusters. Empty input, or fewer than
/// two effective clusters, yields an empty vector. Clusters may come back
/// empty; callers filter them before display.
pub fn cluster<P, R>(points: &[P], k: usize, rng: &mut R) -> Vec<Cluster>
where
    P: AsRef<[f64]>,
    R: Rng + ?Sized,
{
    let k = match effective_k(points.len(), k) {
        Ok(k) => k,
        Err(Skip::NoPoints) => {
            tracing::info!("no documents to cluster");
            return Vec::new();
        }
        Err(Skip::TooFewPoints) => {
            tracing::info!(points = points.len(), requested = k, "too few documents to cluster, need at least 2");
            return Vec::new();
        }
    };

    let mut centroids = seed(points, k, rng);
    let mut assignments = vec![usize::MAX; points.len()];
    let mut iterations = 0;
    while iterations < MAX_ITERATIONS {
        iterations += 1;
        if !assign(points, &centroids, &mut assignments) {
            break;
        }
        update_centroids(points, &assignments, &mut centroids);
    }
    tracing::debug!(k, iterations, points = points.len(), "k-means finished");

    let mut clusters: Vec<Cluster> =
        centroids.into_iter().map(|centroid| Cluster { centroid, members: Vec::new() }).collect();
    for (i, &c) in assignments.iter().enumerate() {
        clusters[c].members.push(i);
    }
    clusters
}

/// k-means++: first centroid uniform, the rest drawn with probability
/// proportional to squared distance from the nearest chosen centroid.
fn seed<P, R>(points: &[P], k: usize, rng: &mut R) -> Vec<Vec<f64>>
where
    P: AsRef<[f64]>,
    R: Rng + ?Sized,
{
    let n = points.len();
    let mut taken = vec![false; n];
    let first = rng.random_range(0..n);
    taken[first] = true;
    let mut centroids = vec![points[first].as_ref().to_vec()];
    let mut min_d2: Vec<f64> = points.iter().map(|p| squared_distance(p.as_ref(), &centroids[0])).collect();

    while centroids.len() < k {
        let total: f64 = (0..n).filter(|&i| !taken[i]).map(|i| min_d2[i]).sum();
        let next = if total > 0.0 {
            let target = rng.random::<f64>() * total;
            let mut acc = 0.0;
            let mut pick = None;
            for i in (0..n).filter(|&i| !taken[i] && min_d2[i] > 0.0) {
                acc += min_d2[i];
                pick = Some(i);
                if acc >= target {
                    break;
                }
            }
            pick
        } else {
            None
        };
        // all remaining points coincide with a centroid: pick one uniformly
        let next = next.unwrap_or_else(|| {
            let free: Vec<usize> = (0..n).filter(|&i| !taken[i]).collect();
            free[rng.random_range(0..free.len())]
        });

        taken[next] = true;
        let centroid = points[next].as_ref().to_vec();
        for (i, p) in points.iter().enumerate() {
            let d = squared_distance(p.as_ref(), &centroid);
            if d < min_d2[i] {
                min_d2[i] = d;
            }
        }
        centroids.push(centroid);
    }
    centroids
}

/// Assign every point to its nearest centroid, ties going to the lowest
/// index. Returns whether any assignment changed.
fn assign<P: AsRef<[f64]>>(points: &[P], centroids: &[Vec<f64>], assignments: &mut [usize]) -> bool {
    let mut changed = false;
    for (p, slot) in points.iter().zip(assignments.iter_mut()) {
        let mut best = 0;
        let mut best_d = f64::INFINITY;
        for (c, centroid) in centroids.iter().enumerate() {
            let d = squared_distance(p.as_ref(), centroid);
            if d < best_d {
                best = c;
                best_d = d;
            }
        }
        if *slot != best {
            *slot = best;
            changed = true;
        }
    }
    changed
}

/// Coordinate-wise mean of members. A centroid without members keeps its coordinates.
fn update_centroids<P: AsRef<[f64]>>(points: &[P], assignments: &[usize], centroids: &mut [Vec<f64>]) {
    let dim = centroids.first().map_or(0, Vec::len);
    let mut sums = vec![vec![0.0; dim]; centroids.len()];
    let mut counts = vec![0usize; centroids.len()];
    for (p, &c) in points.iter().zip(assignments) {
        counts[c] += 1;
        for (s, x) in sums[c].iter_mut().zip(p.as_ref()) {
            *s += x;
        }
    }
    for ((centroid, sum), count) in centroids.iter_mut().zip(sums).zip(counts) {
        if count == 0 {
            continue;
        }
        *centroid = sum.into_iter().map(|s| s / count as f64).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn two_blobs() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 0.0],
            vec![0.2, 0.1],
            vec![0.1, 0.3],
            vec![10.0, 10.0],
            vec![10.2, 9.9],
            vec![9.8, 10.1],
        ]
    }

    #[test]
    fn empty_and_degenerate_inputs_return_nothing() {
        let mut rng = StdRng::seed_from_u64(7);
        let none: Vec<Vec<f64>> = Vec::new();
        assert!(cluster(&none, 3, &mut rng).is_empty());
        assert!(cluster(&[vec![1.0]], 3, &mut rng).is_empty());
        assert!(cluster(&two_blobs(), 1, &mut rng).is_empty());
        assert!(cluster(&two_blobs(), 0, &mut rng).is_empty());
    }

    #[test]
    fn effective_k_reports_cause() {
        assert_eq!(effective_k(0, 4), Err(Skip::NoPoints));
        assert_eq!(effective_k(1, 4), Err(Skip::TooFewPoints));
        assert_eq!(effective_k(3, 5), Ok(3));
        assert_eq!(effective_k(10, 2), Ok(2));
    }

    #[test]
    fn separates_well_apart_blobs() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let clusters = cluster(&two_blobs(), 2, &mut rng);
            assert_eq!(clusters.len(), 2);
            let mut groups: Vec<Vec<usize>> = clusters.iter().map(|c| c.members.clone()).collect();
            groups.sort();
            assert_eq!(groups, vec![vec![0, 1, 2], vec![3, 4, 5]], "seed {seed}");
        }
    }

    #[test]
    fn every_point_lands_in_exactly_one_cluster() {
        let mut rng = StdRng::seed_from_u64(42);
        let points = two_blobs();
        let clusters = cluster(&points, 5, &mut rng);
        assert!(clusters.len() <= points.len());
        let mut all: Vec<usize> = clusters.iter().flat_map(|c| c.members.clone()).collect();
        all.sort();
        assert_eq!(all, (0..points.len()).collect::<Vec<_>>());
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let a = cluster(&two_blobs(), 3, &mut StdRng::seed_from_u64(3));
        let b = cluster(&two_blobs(), 3, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn identical_points_do_not_divide_by_zero() {
        let points = vec![vec![1.0, 1.0]; 4];
        let clusters = cluster(&points, 3, &mut StdRng::seed_from_u64(1));
        assert_eq!(clusters.len(), 3);
        // ties go to the lowest index, the other centroids stay empty
        assert_eq!(clusters[0].members, vec![0, 1, 2, 3]);
        assert!(clusters[1].is_empty() && clusters[2].is_empty());
        assert_eq!(clusters[1].centroid, vec![1.0, 1.0]);
    }

    #[test]
    fn centroid_is_member_mean() {
        let clusters = cluster(&two_blobs(), 2, &mut StdRng::seed_from_u64(11));
        for c in clusters {
            let first = c.members[0];
            let expected = if first == 0 { [0.1, 0.4 / 3.0] } else { [10.0, 10.0] };
            assert!((c.centroid[0] - expected[0]).abs() < 1e-9);
            assert!((c.centroid[1] - expected[1]).abs() < 1e-9);
        }
    }
}
