use std::collections::BTreeSet;

use crate::constants::Radian;
use crate::residuals::ResidualPoint;

/// Partition of residual points by residual magnitude. Indices refer to the input slice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub selected: BTreeSet<usize>,
    pub dropped: BTreeSet<usize>,
}

impl Selection {
    pub fn selected_indices(&self) -> Vec<usize> {
        self.selected.iter().copied().collect()
    }

    pub fn dropped_indices(&self) -> Vec<usize> {
        self.dropped.iter().copied().collect()
    }
}

/// Classify points by their residual distance.
///
/// A point whose squared residual distance `res_lat² + res_lon²` exceeds `threshold²` is
/// *selected*; the others are *dropped*. Selected points are the ones worth inspecting or
/// refitting separately.
pub fn select(points: &[ResidualPoint], threshold: Radian) -> Selection {
    let limit = threshold * threshold;
    let (selected, dropped): (BTreeSet<usize>, BTreeSet<usize>) =
        (0..points.len()).partition(|&i| points[i].dist2() > limit);
    Selection { selected, dropped }
}
