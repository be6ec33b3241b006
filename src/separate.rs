use std::collections::BTreeMap;

use crate::{
    adjustment::Adjustment,
    error::{FramescriptError, FramescriptResult},
    reference::Reference,
};

/// One element of the flat instruction surface.
#[derive(Debug)]
pub enum Instruction {
    Reference(Reference),
    Adjustment(Adjustment),
}

impl From<Reference> for Instruction {
    fn from(r: Reference) -> Self {
        Instruction::Reference(r)
    }
}

impl From<Adjustment> for Instruction {
    fn from(a: Adjustment) -> Self {
        Instruction::Adjustment(a)
    }
}

/// The canonical, validated input to the timeline compiler and the renderer.
///
/// `adjustments` holds one ascending-by-time queue per entity id. Within a
/// queue, adjustments sharing an activation time keep their declaration
/// order (stable sort); across entities the compiler orders same-tick nodes
/// by id. The renderer replays these queues through an immutable cursor, so
/// the maps are never mutated after separation.
#[derive(Debug, Default)]
pub struct SeparatedInstructions {
    pub references: BTreeMap<String, Reference>,
    pub adjustments: BTreeMap<String, Vec<Adjustment>>,
}

impl SeparatedInstructions {
    /// Every adjustment in global order: ascending time, ties by
    /// `(target id, declaration order)`.
    pub fn global_order(&self) -> Vec<&Adjustment> {
        let mut all: Vec<&Adjustment> = self.adjustments.values().flatten().collect();
        all.sort_by_key(|a| a.time);
        all
    }
}

/// Split a flat instruction list into per-entity reference and adjustment
/// maps.
///
/// A reference id seen twice fails with
/// [`FramescriptError::DuplicateId`]. An adjustment equal by value to one
/// already queued for the same id is dropped, which makes declaring an
/// adjustment both standalone and attached to its reference harmless.
pub fn separate_instructions(
    instructions: impl IntoIterator<Item = Instruction>,
) -> FramescriptResult<SeparatedInstructions> {
    let mut separated = SeparatedInstructions::default();

    for instruction in instructions {
        match instruction {
            Instruction::Reference(mut reference) => {
                for adjustment in reference.take_adjustments() {
                    insert_adjustment(&mut separated, adjustment);
                }
                if separated.references.contains_key(&reference.id) {
                    return Err(FramescriptError::duplicate_id(&reference.id));
                }
                separated
                    .references
                    .insert(reference.id.clone(), reference);
            }
            Instruction::Adjustment(adjustment) => {
                insert_adjustment(&mut separated, adjustment);
            }
        }
    }

    for queue in separated.adjustments.values_mut() {
        queue.sort_by_key(|a| a.time);
    }

    Ok(separated)
}

fn insert_adjustment(separated: &mut SeparatedInstructions, adjustment: Adjustment) {
    let queue = separated
        .adjustments
        .entry(adjustment.target.clone())
        .or_default();
    if queue.contains(&adjustment) {
        return;
    }
    queue.push(adjustment);
}
