//! Detection input type and centroid association utilities.

use nalgebra::{Point2, distance};
use ndarray::Array2;

use crate::tracker::rect::Rect;

/// Detection input for the tracker, produced fresh each frame by the
/// external detector and discarded within the frame.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Bounding box in TLWH format
    pub bbox: Rect,
    /// Detection confidence score
    pub score: f32,
    /// Detector class of the object
    pub class_id: u32,
}

impl Detection {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> Self {
        Self {
            bbox: Rect::from_tlbr(x1, y1, x2, y2),
            score,
            class_id: 0,
        }
    }

    pub fn from_rect(bbox: Rect, score: f32, class_id: u32) -> Self {
        Self {
            bbox,
            score,
            class_id,
        }
    }

    #[inline]
    pub fn centroid(&self) -> Point2<f32> {
        self.bbox.center()
    }
}

/// Compute the pairwise Euclidean distance matrix between two point sets.
pub fn distance_matrix(rows: &[Point2<f32>], cols: &[Point2<f32>]) -> Array2<f32> {
    let mut dists = Array2::zeros((rows.len(), cols.len()));
    for (i, r) in rows.iter().enumerate() {
        for (j, c) in cols.iter().enumerate() {
            dists[[i, j]] = distance(r, c);
        }
    }
    dists
}

#[derive(Debug, Clone)]
pub struct AssignmentResult {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// Greedy minimum-distance-first assignment.
///
/// Repeatedly picks the globally smallest remaining cell of the cost
/// matrix, pairing its row and column; cells above `max_dist` are never
/// paired. Deterministic: on exact ties the lower (row, col) index wins.
pub fn greedy_assignment(cost_matrix: &Array2<f32>, max_dist: f32) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.dim();

    if num_rows == 0 || num_cols == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_tracks: (0..num_rows).collect(),
            unmatched_detections: (0..num_cols).collect(),
        };
    }

    let mut cells: Vec<(usize, usize)> = (0..num_rows)
        .flat_map(|i| (0..num_cols).map(move |j| (i, j)))
        .collect();
    cells.sort_by(|&(ai, aj), &(bi, bj)| {
        cost_matrix[[ai, aj]]
            .partial_cmp(&cost_matrix[[bi, bj]])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then((ai, aj).cmp(&(bi, bj)))
    });

    let mut row_used = vec![false; num_rows];
    let mut col_used = vec![false; num_cols];
    let mut matches = vec![];

    for (i, j) in cells {
        if cost_matrix[[i, j]] > max_dist {
            break;
        }
        if row_used[i] || col_used[j] {
            continue;
        }
        row_used[i] = true;
        col_used[j] = true;
        matches.push((i, j));
    }

    let unmatched_tracks = (0..num_rows).filter(|&i| !row_used[i]).collect();
    let unmatched_detections = (0..num_cols).filter(|&j| !col_used[j]).collect();

    AssignmentResult {
        matches,
        unmatched_tracks,
        unmatched_detections,
    }
}
