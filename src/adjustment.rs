use crate::{
    error::{FramescriptError, FramescriptResult},
    properties::Properties,
};

/// Interpolation precision for the `scale` field. `x`/`y` use whole pixels.
const SCALE_PRECISION: f64 = 0.1;

/// A timed mutation of one entity's visual properties.
///
/// Adjustments are immutable once constructed. Their ordering key is
/// `time`; ties are broken by declaration order (see
/// [`separate_instructions`](crate::separate::separate_instructions)).
#[derive(Clone, Debug, PartialEq)]
pub struct Adjustment {
    pub target: String,
    pub time: u64,
    pub kind: AdjustmentKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AdjustmentKind {
    Show,
    Hide,
    Move { change: Properties, duration: u64 },
}

impl Adjustment {
    pub fn show(target: impl Into<String>, time: u64) -> Self {
        Self {
            target: target.into(),
            time,
            kind: AdjustmentKind::Show,
        }
    }

    pub fn hide(target: impl Into<String>, time: u64) -> Self {
        Self {
            target: target.into(),
            time,
            kind: AdjustmentKind::Hide,
        }
    }

    /// A movement interpolated over `duration` frame-ticks. Only the
    /// `scale`/`x`/`y` fields of `change` are meaningful.
    pub fn movement(
        target: impl Into<String>,
        time: u64,
        change: Properties,
        duration: u64,
    ) -> FramescriptResult<Self> {
        if duration == 0 {
            return Err(FramescriptError::invalid_type(
                "move duration must be >= 1",
            ));
        }
        Ok(Self {
            target: target.into(),
            time,
            kind: AdjustmentKind::Move { change, duration },
        })
    }

    pub fn duration(&self) -> Option<u64> {
        match self.kind {
            AdjustmentKind::Move { duration, .. } => Some(duration),
            _ => None,
        }
    }

    /// The partial [`Properties`] this adjustment contributes at `frame`.
    ///
    /// Must only be called once `self.time <= frame`. For a `Move` the
    /// contribution is cumulative: it already accounts for every tick between
    /// activation and `frame`, so replaying a frame from scratch enacts each
    /// past adjustment exactly once.
    pub fn enact(&self, frame: u64) -> Properties {
        match &self.kind {
            AdjustmentKind::Show => Properties::new().with_visibility(crate::properties::Visibility::Show),
            AdjustmentKind::Hide => Properties::new().with_visibility(crate::properties::Visibility::Hide),
            AdjustmentKind::Move { change, duration } => {
                let elapsed = frame.saturating_sub(self.time).min(*duration);
                interpolate_change(change, *duration, elapsed)
            }
        }
    }
}

/// Integer-exact linear interpolation of a `Move` change.
///
/// The quotient/remainder split guarantees the position at `elapsed ==
/// duration` equals exactly the configured change, with no cumulative
/// rounding drift across frames.
fn interpolate_change(change: &Properties, duration: u64, elapsed: u64) -> Properties {
    if duration == 1 || elapsed == duration {
        let mut full = Properties::new();
        full.scale = change.scale;
        full.x = change.x;
        full.y = change.y;
        return full;
    }

    let mut partial = Properties::new();
    partial.x = change.x.map(|v| interp_pixels(v, duration, elapsed));
    partial.y = change.y.map(|v| interp_pixels(v, duration, elapsed));
    partial.scale = change.scale.map(|v| interp_scale(v, duration, elapsed));
    partial
}

fn interp_pixels(full: i64, duration: u64, elapsed: u64) -> i64 {
    // Whole-pixel precision: the remainder term `(full mod d) * e` is an
    // integer, so the sub-precision payload is always zero and only the
    // quotient survives. Euclidean division matches the original's floor
    // semantics for negative changes.
    full.div_euclid(duration as i64) * elapsed as i64
}

fn interp_scale(full: f64, duration: u64, elapsed: u64) -> f64 {
    let d = duration as f64;
    let quotient = (full / d).floor() * elapsed as f64;
    let remainder = full.rem_euclid(d) * elapsed as f64;
    let steps = (remainder / SCALE_PRECISION).floor();
    if steps < 1.0 {
        quotient
    } else {
        quotient + (remainder - steps * SCALE_PRECISION)
    }
}
