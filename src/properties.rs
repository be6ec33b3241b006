use crate::error::{FramescriptError, FramescriptResult};

/// Whether an entity is drawn on a frame. Absent from a [`Properties`] means
/// "never specified", which renders as visible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Visibility {
    Show,
    Hide,
}

/// How two partial [`Properties`] records combine.
///
/// The `Reverse*` modes exist because `visibility` cannot be summed: in the
/// plain modes the left operand's value wins the fallback, in the reverse
/// modes the right operand's does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeMode {
    /// Per field, keep self's value if set, else other's.
    Replacement,
    /// Per field, keep other's value if set, else self's.
    ReverseReplacement,
    /// Sum numeric fields set in both operands; visibility falls back to
    /// [`MergeMode::Replacement`] behavior.
    Append,
    /// Sum numeric fields set in both operands; visibility falls back to
    /// [`MergeMode::ReverseReplacement`] behavior.
    ReverseAppend,
}

impl MergeMode {
    fn is_append(self) -> bool {
        matches!(self, MergeMode::Append | MergeMode::ReverseAppend)
    }
}

/// Partial visual state of an entity. Every field is independently optional;
/// `None` means "unset", distinct from any real value including zero.
///
/// Merging never mutates either operand.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Properties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i64>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(mut self, layer: i32) -> Self {
        self.layer = Some(layer);
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn with_x(mut self, x: i64) -> Self {
        self.x = Some(x);
        self
    }

    pub fn with_y(mut self, y: i64) -> Self {
        self.y = Some(y);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.layer.is_none()
            && self.scale.is_none()
            && self.visibility.is_none()
            && self.x.is_none()
            && self.y.is_none()
    }

    /// Combine two partial records into a new one.
    ///
    /// With `strict` (ignored by the append modes), any field set to unequal
    /// values in both operands fails with
    /// [`FramescriptError::ConflictingAttributes`].
    pub fn merge(&self, other: &Properties, mode: MergeMode, strict: bool) -> FramescriptResult<Properties> {
        if strict && !mode.is_append() {
            self.check_confliction(other)?;
        }

        Ok(Properties {
            layer: merge_numeric(self.layer, other.layer, mode, |a, b| a + b),
            scale: merge_numeric(self.scale, other.scale, mode, |a, b| a + b),
            visibility: merge_replacement(self.visibility, other.visibility, mode),
            x: merge_numeric(self.x, other.x, mode, |a, b| a + b),
            y: merge_numeric(self.y, other.y, mode, |a, b| a + b),
        })
    }

    fn check_confliction(&self, other: &Properties) -> FramescriptResult<()> {
        check_field("layer", self.layer, other.layer)?;
        check_field("scale", self.scale, other.scale)?;
        check_field("visibility", self.visibility, other.visibility)?;
        check_field("x", self.x, other.x)?;
        check_field("y", self.y, other.y)?;
        Ok(())
    }
}

fn merge_numeric<T: Copy>(
    a: Option<T>,
    b: Option<T>,
    mode: MergeMode,
    add: impl Fn(T, T) -> T,
) -> Option<T> {
    match mode {
        MergeMode::Replacement => a.or(b),
        MergeMode::ReverseReplacement => b.or(a),
        MergeMode::Append | MergeMode::ReverseAppend => match (a, b) {
            (Some(a), Some(b)) => Some(add(a, b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        },
    }
}

fn merge_replacement<T: Copy>(a: Option<T>, b: Option<T>, mode: MergeMode) -> Option<T> {
    match mode {
        MergeMode::Replacement | MergeMode::Append => a.or(b),
        MergeMode::ReverseReplacement | MergeMode::ReverseAppend => b.or(a),
    }
}

fn check_field<T: PartialEq + std::fmt::Debug>(
    field: &'static str,
    a: Option<T>,
    b: Option<T>,
) -> FramescriptResult<()> {
    if let (Some(a), Some(b)) = (&a, &b)
        && a != b
    {
        return Err(FramescriptError::ConflictingAttributes {
            field,
            left: format!("{a:?}"),
            right: format!("{b:?}"),
        });
    }
    Ok(())
}
