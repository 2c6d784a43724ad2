//! Bucketing of frames into narrative sections by temporal position.

use reelscore_models::{CategorizedFrames, Frame, Section};

/// Section for the frame at zero-based `index` out of `total`.
///
/// Picks the first section whose cumulative threshold strictly exceeds the
/// frame's progress `index / total * 100`. Compared as
/// `threshold * total > index * 100` so no rounding can move a boundary.
pub fn section_for_index(index: usize, total: usize) -> Section {
    let total = total.max(1) as u64;
    let scaled = index as u64 * 100;

    Section::ALL
        .into_iter()
        .find(|s| u64::from(s.threshold_percent()) * total > scaled)
        .unwrap_or(Section::Closing)
}

/// Assign every frame, in order, to exactly one section.
pub fn partition(frames: Vec<Frame>) -> CategorizedFrames {
    let total = frames.len();
    let mut categorized = CategorizedFrames::default();
    for (index, frame) in frames.into_iter().enumerate() {
        categorized.push(section_for_index(index, total), frame);
    }
    categorized
}
