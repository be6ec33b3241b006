use crate::motion_tree::{MotionNode, MotionTree};

/// The ordered set of frame indices that must actually be rendered, plus the
/// total frame count of the output video.
///
/// Indices absent from `jobs` fall inside `Continue` regions and are filled
/// by duplicating the nearest rendered frame below them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameSchedule {
    pub jobs: Vec<u64>,
    pub frame_count: u64,
}

/// Expand a [`MotionTree`] into concrete frame-render jobs.
///
/// Multiple coincident events collapse into one job; each tick of an
/// `InvokePrevious` gets its own job (again de-duplicating against a job
/// already created at the gap's first index).
pub fn schedule(tree: &MotionTree) -> FrameSchedule {
    let mut jobs: Vec<u64> = Vec::new();
    let mut index: u64 = 0;

    for node in &tree.body {
        match node {
            MotionNode::Start => jobs.push(0),
            MotionNode::ShowImage { .. }
            | MotionNode::HideImage { .. }
            | MotionNode::MoveImage { .. } => {
                if jobs.last() != Some(&index) {
                    jobs.push(index);
                }
            }
            MotionNode::InvokePrevious { length } => {
                let mut remaining = *length;
                if jobs.last() == Some(&index) {
                    remaining = remaining.saturating_sub(1);
                    index += 1;
                }
                for _ in 0..remaining {
                    jobs.push(index);
                    index += 1;
                }
            }
            MotionNode::Continue { length } => index += length,
            MotionNode::End => break,
        }
    }

    FrameSchedule {
        jobs,
        frame_count: index,
    }
}
