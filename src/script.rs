use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    adjustment::Adjustment,
    error::FramescriptResult,
    metadata::Metadata,
    properties::Properties,
    reference::Reference,
    separate::Instruction,
};

/// Declarative JSON description of a compile: output metadata plus the flat
/// instruction surface (image placements and timed adjustments).
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Script {
    pub metadata: Metadata,
    #[serde(default)]
    pub images: Vec<ImageDecl>,
    #[serde(default)]
    pub adjustments: Vec<AdjustmentDecl>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ImageDecl {
    pub id: String,
    pub path: PathBuf,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdjustmentDecl {
    Show {
        target: String,
        time: u64,
    },
    Hide {
        target: String,
        time: u64,
    },
    Move {
        target: String,
        time: u64,
        #[serde(default)]
        change: Properties,
        duration: u64,
    },
}

impl Script {
    pub fn load(path: &Path) -> FramescriptResult<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open script '{}'", path.display()))?;
        let script: Script = serde_json::from_reader(std::io::BufReader::new(file))
            .with_context(|| format!("failed to parse script '{}'", path.display()))?;
        Ok(script)
    }

    /// Lower the declarations into the instruction surface the pipeline
    /// consumes. Declaration order is preserved, which fixes same-tick
    /// adjustment ordering within each entity.
    pub fn into_instructions(self) -> FramescriptResult<Vec<Instruction>> {
        let mut instructions = Vec::with_capacity(self.images.len() + self.adjustments.len());

        for image in self.images {
            instructions.push(Instruction::Reference(Reference::from_file(
                image.id,
                image.path,
                image.properties,
            )));
        }

        for decl in self.adjustments {
            let adjustment = match decl {
                AdjustmentDecl::Show { target, time } => Adjustment::show(target, time),
                AdjustmentDecl::Hide { target, time } => Adjustment::hide(target, time),
                AdjustmentDecl::Move {
                    target,
                    time,
                    change,
                    duration,
                } => Adjustment::movement(target, time, change, duration)?,
            };
            instructions.push(Instruction::Adjustment(adjustment));
        }

        Ok(instructions)
    }
}
