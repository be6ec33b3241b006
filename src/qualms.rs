use crate::{
    error::FramescriptResult,
    frame::{ResolvedEntity, resolve_frame},
    metadata::Metadata,
    motion_tree::parse,
    schedule::schedule,
    separate::{Instruction, separate_instructions},
};

/// A diagnostic finding over a contiguous, inclusive frame-index range.
///
/// Qualms consume the same resolved per-frame bounding boxes as the renderer
/// but never participate in rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Qualm {
    pub kind: QualmKind,
    pub start: u64,
    pub end: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QualmKind {
    /// Two entities' placed bounding boxes intersect.
    DrawingConfliction { a: String, b: String },
    /// An entity's placed bounding box exceeds the canvas.
    OutOfRange { id: String },
}

impl QualmKind {
    pub fn code(&self) -> &'static str {
        match self {
            QualmKind::DrawingConfliction { .. } => "D101",
            QualmKind::OutOfRange { .. } => "D102",
        }
    }

    pub fn severity(&self) -> u8 {
        match self {
            QualmKind::DrawingConfliction { .. } => 2,
            QualmKind::OutOfRange { .. } => 1,
        }
    }
}

impl std::fmt::Display for Qualm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, ":{}:{}: ", self.kind.code(), self.kind.severity())?;
        match &self.kind {
            QualmKind::DrawingConfliction { a, b } => {
                write!(f, "images '{a}' and '{b}' overlap")?;
            }
            QualmKind::OutOfRange { id } => {
                write!(f, "image '{id}' may be drawn outside the canvas")?;
            }
        }
        write!(f, " [{}, {}]", self.start, self.end)
    }
}

/// Lint an instruction set: report bounding-box overlaps between visible
/// entities and entities exceeding the canvas, each accumulated over the
/// contiguous frame ranges where the condition holds.
pub fn check_qualms(
    instructions: impl IntoIterator<Item = Instruction>,
    metadata: &Metadata,
) -> FramescriptResult<Vec<Qualm>> {
    metadata.validate()?;

    let mut separated = separate_instructions(instructions)?;
    for reference in separated.references.values_mut() {
        reference.source.open()?;
    }

    let plan = schedule(&parse(&separated));
    let mut qualms: Vec<Qualm> = Vec::new();

    for index in 0..plan.frame_count {
        let entities = resolve_frame(index, &separated)?;

        for (i, a) in entities.iter().enumerate() {
            for b in &entities[i + 1..] {
                if boxes_intersect(a, b) {
                    record(
                        &mut qualms,
                        QualmKind::DrawingConfliction {
                            a: a.id().to_string(),
                            b: b.id().to_string(),
                        },
                        index,
                    );
                }
            }

            if out_of_range(a, metadata) {
                record(
                    &mut qualms,
                    QualmKind::OutOfRange {
                        id: a.id().to_string(),
                    },
                    index,
                );
            }
        }
    }

    Ok(qualms)
}

fn boxes_intersect(a: &ResolvedEntity<'_>, b: &ResolvedEntity<'_>) -> bool {
    let separated_horizontally = a.x_end() < b.x || b.x_end() < a.x;
    let separated_vertically = a.y_end() < b.y || b.y_end() < a.y;
    !(separated_horizontally || separated_vertically)
}

fn out_of_range(a: &ResolvedEntity<'_>, metadata: &Metadata) -> bool {
    a.x < 0
        || a.y < 0
        || a.x_end() > i64::from(metadata.window_size.width)
        || a.y_end() > i64::from(metadata.window_size.height)
}

/// Extend the matching report ending at `index - 1`, or open a new one.
fn record(qualms: &mut Vec<Qualm>, kind: QualmKind, index: u64) {
    let adjacent = qualms
        .iter_mut()
        .rev()
        .find(|q| q.kind == kind && index > 0 && q.end == index - 1);

    match adjacent {
        Some(q) => q.end = index,
        None => qualms.push(Qualm {
            kind,
            start: index,
            end: index,
        }),
    }
}
