use crate::{
    adjustment::{Adjustment, AdjustmentKind},
    separate::SeparatedInstructions,
};

/// One node of the compiled timeline IR.
///
/// The body of a [`MotionTree`] is an ordered sequence: `Start` first, `End`
/// last, node times monotonically non-decreasing, and every
/// `Continue`/`InvokePrevious` length strictly positive.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum MotionNode {
    Start,
    End,
    /// Static gap: no entity's visible state changes for `length` ticks, so
    /// the frames inside it can be duplicated from the gap's first frame.
    Continue { length: u64 },
    /// Dynamic gap: an interpolation is in flight, every tick must be
    /// rendered independently.
    InvokePrevious { length: u64 },
    ShowImage { id: String, time: u64 },
    HideImage { id: String, time: u64 },
    MoveImage { id: String, time: u64, duration: u64 },
}

impl MotionNode {
    pub fn time(&self) -> Option<u64> {
        match self {
            MotionNode::ShowImage { time, .. }
            | MotionNode::HideImage { time, .. }
            | MotionNode::MoveImage { time, .. } => Some(*time),
            _ => None,
        }
    }

    pub fn duration(&self) -> Option<u64> {
        match self {
            MotionNode::MoveImage { duration, .. } => Some(*duration),
            _ => None,
        }
    }
}

/// The compiled timeline: a compact, ordered account of when the composition
/// is static and when it is actively interpolating.
#[derive(Clone, Debug, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct MotionTree {
    pub body: Vec<MotionNode>,
}

impl std::fmt::Display for MotionTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&dump(self, 0))
    }
}

fn command_node(adjustment: &Adjustment) -> MotionNode {
    match &adjustment.kind {
        AdjustmentKind::Show => MotionNode::ShowImage {
            id: adjustment.target.clone(),
            time: adjustment.time,
        },
        AdjustmentKind::Hide => MotionNode::HideImage {
            id: adjustment.target.clone(),
            time: adjustment.time,
        },
        AdjustmentKind::Move { duration, .. } => MotionNode::MoveImage {
            id: adjustment.target.clone(),
            time: adjustment.time,
            duration: *duration,
        },
    }
}

/// Compile the separated adjustment queues into a [`MotionTree`].
///
/// Single pass over the globally time-sorted adjustment stream.
/// `pending_duration` tracks the widest still-unexpired interpolation
/// window: every tick inside an active move becomes part of an
/// `InvokePrevious`, while ticks with nothing in flight collapse into a
/// `Continue`. Overlapping move windows extend the pending duration to the
/// maximum, never shrinking it early.
pub fn parse(separated: &SeparatedInstructions) -> MotionTree {
    let mut body = vec![MotionNode::Start];

    let mut stream = separated.global_order().into_iter();
    let mut current: Option<MotionNode> = None;
    let mut time_index: u64 = 0;
    let mut pending_duration: u64 = 0;

    loop {
        if current.is_none() {
            match stream.next() {
                Some(adjustment) => current = Some(command_node(adjustment)),
                None => break,
            }
        }

        // Discrete-event nodes always carry a time.
        let node_time = current.as_ref().and_then(MotionNode::time).unwrap_or(0);

        if node_time <= time_index {
            let node = current.take().unwrap_or(MotionNode::End);
            if let Some(duration) = node.duration() {
                pending_duration = pending_duration.max(duration);
            }
            body.push(node);
            continue;
        }

        let gap = node_time - time_index;
        if pending_duration == 0 {
            body.push(MotionNode::Continue { length: gap });
            time_index += gap;
        } else if pending_duration <= gap {
            body.push(MotionNode::InvokePrevious {
                length: pending_duration,
            });
            time_index += pending_duration;
            pending_duration = 0;
        } else {
            body.push(MotionNode::InvokePrevious { length: gap });
            time_index += gap;
            pending_duration -= gap;
        }
    }

    if pending_duration > 0 {
        body.push(MotionNode::InvokePrevious {
            length: pending_duration,
        });
    }

    body.push(MotionNode::End);
    MotionTree { body }
}

/// Render the tree as a readable one-line (indent 0) or indented multi-line
/// string.
pub fn dump(tree: &MotionTree, indent: usize) -> String {
    let nodes: Vec<String> = tree.body.iter().map(node_repr).collect();
    if indent == 0 {
        return format!("MotionTree(body=[{}])", nodes.join(", "));
    }

    let outer = " ".repeat(indent);
    let inner = " ".repeat(2 * indent);
    let items: Vec<String> = nodes.into_iter().map(|n| format!("\n{inner}{n}")).collect();
    format!("MotionTree(\n{outer}body=[{}])", items.join(", "))
}

fn node_repr(node: &MotionNode) -> String {
    match node {
        MotionNode::Start => "Start()".to_string(),
        MotionNode::End => "End()".to_string(),
        MotionNode::Continue { length } => format!("Continue(length={length})"),
        MotionNode::InvokePrevious { length } => format!("InvokePrevious(length={length})"),
        MotionNode::ShowImage { id, time } => format!("ShowImage(id='{id}', time={time})"),
        MotionNode::HideImage { id, time } => format!("HideImage(id='{id}', time={time})"),
        MotionNode::MoveImage { id, time, duration } => {
            format!("MoveImage(id='{id}', time={time}, duration={duration})")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adjustment::Adjustment,
        core::Rgb,
        properties::Properties,
        reference::{RasterImageSource, Reference},
        separate::{Instruction, separate_instructions},
    };

    fn reference(id: &str) -> Instruction {
        Instruction::Reference(Reference::new(
            id,
            Box::new(RasterImageSource::solid(1, 1, Rgb::WHITE).unwrap()),
            Properties::new().with_layer(1).with_x(0).with_y(0),
        ))
    }

    fn movement(id: &str, time: u64, dx: i64, duration: u64) -> Instruction {
        Instruction::Adjustment(
            Adjustment::movement(id, time, Properties::new().with_x(dx), duration).unwrap(),
        )
    }

    fn parse_instructions(instructions: impl IntoIterator<Item = Instruction>) -> MotionTree {
        parse(&separate_instructions(instructions).unwrap())
    }

    #[test]
    fn no_adjustments_compiles_to_start_end() {
        let tree = parse_instructions([reference("A")]);
        assert_eq!(tree.body, vec![MotionNode::Start, MotionNode::End]);
    }

    #[test]
    fn hide_then_show_splits_on_a_static_gap() {
        let tree = parse_instructions([
            reference("A"),
            Instruction::Adjustment(Adjustment::hide("A", 0)),
            Instruction::Adjustment(Adjustment::show("A", 20)),
        ]);
        assert_eq!(
            tree.body,
            vec![
                MotionNode::Start,
                MotionNode::HideImage {
                    id: "A".into(),
                    time: 0
                },
                MotionNode::Continue { length: 20 },
                MotionNode::ShowImage {
                    id: "A".into(),
                    time: 20
                },
                MotionNode::End,
            ]
        );
    }

    #[test]
    fn single_move_yields_invoke_previous_for_its_window() {
        let tree = parse_instructions([reference("A"), movement("A", 6, 500, 10)]);
        assert_eq!(
            tree.body,
            vec![
                MotionNode::Start,
                MotionNode::Continue { length: 6 },
                MotionNode::MoveImage {
                    id: "A".into(),
                    time: 6,
                    duration: 10
                },
                MotionNode::InvokePrevious { length: 10 },
                MotionNode::End,
            ]
        );
    }

    #[test]
    fn overlapping_moves_extend_the_dynamic_window_to_the_max() {
        let tree = parse_instructions([
            reference("A"),
            movement("A", 0, 100, 10),
            movement("A", 5, 100, 10),
        ]);
        assert_eq!(
            tree.body,
            vec![
                MotionNode::Start,
                MotionNode::MoveImage {
                    id: "A".into(),
                    time: 0,
                    duration: 10
                },
                MotionNode::InvokePrevious { length: 5 },
                MotionNode::MoveImage {
                    id: "A".into(),
                    time: 5,
                    duration: 10
                },
                MotionNode::InvokePrevious { length: 10 },
                MotionNode::End,
            ]
        );
    }

    #[test]
    fn back_to_back_moves_chain_without_a_continue() {
        // Six movements tracing a figure-eight: the gap between consecutive
        // activation times always equals the expiring window, so the body
        // alternates MoveImage / InvokePrevious with no static region after
        // the opening one.
        let tree = parse_instructions([
            reference("BLOCK"),
            movement("BLOCK", 6, 100, 10),
            movement("BLOCK", 16, 100, 5),
            movement("BLOCK", 21, 100, 5),
            movement("BLOCK", 26, 100, 10),
            movement("BLOCK", 36, 100, 5),
            movement("BLOCK", 41, 100, 5),
        ]);

        let lengths: Vec<u64> = tree
            .body
            .iter()
            .filter_map(|n| match n {
                MotionNode::InvokePrevious { length } => Some(*length),
                _ => None,
            })
            .collect();
        assert_eq!(lengths, vec![10, 5, 5, 10, 5, 5]);
        assert!(
            !tree.body[2..]
                .iter()
                .any(|n| matches!(n, MotionNode::Continue { .. }))
        );
        assert_eq!(tree.body[1], MotionNode::Continue { length: 6 });
    }

    #[test]
    fn same_tick_nodes_across_entities_order_by_id() {
        let tree = parse_instructions([
            reference("A"),
            reference("B"),
            Instruction::Adjustment(Adjustment::show("B", 3)),
            Instruction::Adjustment(Adjustment::hide("A", 3)),
        ]);
        assert_eq!(
            tree.body,
            vec![
                MotionNode::Start,
                MotionNode::Continue { length: 3 },
                MotionNode::HideImage {
                    id: "A".into(),
                    time: 3
                },
                MotionNode::ShowImage {
                    id: "B".into(),
                    time: 3
                },
                MotionNode::End,
            ]
        );
    }

    #[test]
    fn node_times_are_monotone_and_lengths_positive() {
        let tree = parse_instructions([
            reference("A"),
            Instruction::Adjustment(Adjustment::hide("A", 0)),
            movement("A", 4, 50, 3),
            Instruction::Adjustment(Adjustment::show("A", 12)),
            movement("A", 30, -50, 6),
        ]);

        let mut last_time = 0;
        for node in &tree.body {
            if let Some(t) = node.time() {
                assert!(t >= last_time);
                last_time = t;
            }
            if let MotionNode::Continue { length } | MotionNode::InvokePrevious { length } = node {
                assert!(*length > 0);
            }
        }
        assert_eq!(tree.body.first(), Some(&MotionNode::Start));
        assert_eq!(tree.body.last(), Some(&MotionNode::End));
    }

    #[test]
    fn dump_formats_flat_and_indented() {
        let tree = parse_instructions([
            reference("HIDDEN"),
            Instruction::Adjustment(Adjustment::hide("HIDDEN", 0)),
            Instruction::Adjustment(Adjustment::show("HIDDEN", 20)),
        ]);

        assert_eq!(
            dump(&tree, 0),
            "MotionTree(body=[Start(), HideImage(id='HIDDEN', time=0), \
             Continue(length=20), ShowImage(id='HIDDEN', time=20), End()])"
        );

        let indented = dump(&tree, 2);
        assert!(indented.starts_with("MotionTree(\n  body=["));
        assert!(indented.contains("\n    HideImage(id='HIDDEN', time=0)"));
        assert_eq!(tree.to_string(), dump(&tree, 0));
    }
}
