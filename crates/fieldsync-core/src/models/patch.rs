//! Per-field task updates
//!
//! A patch distinguishes "leave this field alone" from "set it" and, for
//! nullable fields, from "clear it".

/// Update for a non-nullable field
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldUpdate<T> {
    #[default]
    Unchanged,
    Set(T),
}

/// Update for a nullable field
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NullableUpdate<T> {
    #[default]
    Unchanged,
    Set(T),
    Clear,
}

impl<T> NullableUpdate<T> {
    /// Build from an optional value: `Some` sets, `None` clears.
    pub fn from_option(value: Option<T>) -> Self {
        value.map_or(Self::Clear, Self::Set)
    }
}

/// Local edit a field worker makes to a task
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskPatch {
    pub business_status: FieldUpdate<super::BusinessStatus>,
    pub notes: FieldUpdate<String>,
    pub image_ref: NullableUpdate<String>,
}

impl TaskPatch {
    /// An empty patch (every field unchanged)
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_status(mut self, status: super::BusinessStatus) -> Self {
        self.business_status = FieldUpdate::Set(status);
        self
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = FieldUpdate::Set(notes.into());
        self
    }

    #[must_use]
    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = NullableUpdate::Set(image_ref.into());
        self
    }

    #[must_use]
    pub fn clear_image(mut self) -> Self {
        self.image_ref = NullableUpdate::Clear;
        self
    }

    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        matches!(self.business_status, FieldUpdate::Unchanged)
            && matches!(self.notes, FieldUpdate::Unchanged)
            && matches!(self.image_ref, NullableUpdate::Unchanged)
    }
}
