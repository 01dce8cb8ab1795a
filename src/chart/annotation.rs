//! User-drawn chart annotations.
//!
//! Anchors are stored as [`NormalizedPoint`]s: the bar position is a
//! fraction of the series length and the price is absolute. Screen
//! positions are derived on every frame from the current series length and
//! [`Transform`], so drawings stay put across scroll, zoom, resize and
//! series growth.

use super::viewport::{DataPoint, ScreenPoint, Transform};

/// Resolution-independent anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedPoint {
    /// Bar position as a fraction of the series length, in `[0, 1]`
    pub x: f64,
    /// Absolute price
    pub price: f64,
}

impl NormalizedPoint {
    /// Normalize a bar index against a series of `len` bars.
    ///
    /// The index is snapped to the nearest bar; positions outside the
    /// series clamp to its ends.
    pub fn normalize(bar_index: f64, price: f64, len: usize) -> Self {
        let x = if len == 0 {
            0.0
        } else {
            (bar_index.round() / len as f64).clamp(0.0, 1.0)
        };
        Self { x, price }
    }

    pub fn from_data(point: DataPoint, len: usize) -> Self {
        Self::normalize(point.index, point.price, len)
    }

    /// Bar index in a series of `len` bars, always within `[0, len - 1]`.
    pub fn bar_index(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        let index = (self.x * len as f64).round().max(0.0) as usize;
        index.min(len - 1)
    }

    pub fn to_data(&self, len: usize) -> DataPoint {
        DataPoint::new(self.bar_index(len) as f64, self.price)
    }

    pub fn to_screen(&self, transform: &Transform, len: usize) -> ScreenPoint {
        transform.data_to_screen(self.bar_index(len) as f64, self.price)
    }
}

/// Identifier handed out by an [`AnnotationStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnnotationId(u64);

impl AnnotationId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Trendline between two anchors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Annotation {
    pub id: AnnotationId,
    pub start: NormalizedPoint,
    pub end: NormalizedPoint,
}

impl Annotation {
    /// Screen positions of both anchors for the current frame.
    pub fn to_screen(&self, transform: &Transform, len: usize) -> (ScreenPoint, ScreenPoint) {
        (self.start.to_screen(transform, len), self.end.to_screen(transform, len))
    }

    /// Handle under `point`, checked in the order start, end, mid.
    pub fn hit_test(&self, point: ScreenPoint, tolerance: f32, transform: &Transform, len: usize) -> Option<Handle> {
        let (start, end) = self.to_screen(transform, len);

        if point.distance_to(start) <= tolerance {
            Some(Handle::Start)
        } else if point.distance_to(end) <= tolerance {
            Some(Handle::End)
        } else if point.distance_to_segment(start, end) <= tolerance {
            Some(Handle::Mid)
        } else {
            None
        }
    }
}

/// Part of an annotation a drag operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    Start,
    End,
    /// The body of the line; dragging it moves both anchors
    Mid,
}

/// Result of a hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub id: AnnotationId,
    pub handle: Handle,
}

/// Screen positions captured when a drag begins.
///
/// Mid drags translate from this snapshot by the total pointer delta, so
/// repeated pixel/data round trips never accumulate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragReference {
    pub pointer: ScreenPoint,
    pub start: ScreenPoint,
    pub end: ScreenPoint,
}

impl DragReference {
    pub fn capture(pointer: ScreenPoint, annotation: &Annotation, transform: &Transform, len: usize) -> Self {
        let (start, end) = annotation.to_screen(transform, len);
        Self { pointer, start, end }
    }
}

/// Session-lifetime collection of annotations, oldest first.
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
    selected: Option<AnnotationId>,
    next_id: u64,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new trendline.
    pub fn add(&mut self, start: NormalizedPoint, end: NormalizedPoint) -> AnnotationId {
        let id = AnnotationId(self.next_id);
        self.next_id += 1;
        self.annotations.push(Annotation {
            id,
            start: clamp_point(start),
            end: clamp_point(end),
        });
        id
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Closest handle within `tolerance` pixels, newest annotation first.
    pub fn find_near(&self, point: ScreenPoint, tolerance: f32, transform: &Transform, len: usize) -> Option<Hit> {
        self.annotations.iter().rev().find_map(|annotation| {
            annotation
                .hit_test(point, tolerance, transform, len)
                .map(|handle| Hit { id: annotation.id, handle })
        })
    }

    /// Move the dragged handle to follow the pointer.
    ///
    /// `Start`/`End` take the pointer position directly; `Mid` translates
    /// both anchors by the pointer delta since `reference` was captured.
    /// Returns false when the annotation no longer exists.
    pub fn update_endpoint(
        &mut self,
        id: AnnotationId,
        handle: Handle,
        pointer: ScreenPoint,
        reference: &DragReference,
        transform: &Transform,
        len: usize,
    ) -> bool {
        let Some(annotation) = self.annotations.iter_mut().find(|a| a.id == id) else {
            return false;
        };
        let normalize = |p: ScreenPoint| NormalizedPoint::from_data(transform.screen_to_data(p), len);

        match handle {
            Handle::Start => annotation.start = normalize(pointer),
            Handle::End => annotation.end = normalize(pointer),
            Handle::Mid => {
                let dx = pointer.x - reference.pointer.x;
                let dy = pointer.y - reference.pointer.y;
                annotation.start = normalize(reference.start.offset(dx, dy));
                annotation.end = normalize(reference.end.offset(dx, dy));
            }
        }
        true
    }

    pub fn remove(&mut self, id: AnnotationId) -> bool {
        let before = self.annotations.len();
        self.annotations.retain(|a| a.id != id);
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.annotations.len() != before
    }

    pub fn clear(&mut self) {
        self.annotations.clear();
        self.selected = None;
    }

    pub fn selected(&self) -> Option<AnnotationId> {
        self.selected
    }

    /// Select an annotation, or clear the selection with `None`.
    pub fn select(&mut self, id: Option<AnnotationId>) {
        self.selected = id.filter(|id| self.get(*id).is_some());
    }

    pub fn remove_selected(&mut self) -> Option<AnnotationId> {
        let id = self.selected?;
        self.remove(id);
        Some(id)
    }
}

fn clamp_point(point: NormalizedPoint) -> NormalizedPoint {
    NormalizedPoint {
        x: if point.x.is_nan() { 0.0 } else { point.x.clamp(0.0, 1.0) },
        price: point.price,
    }
}
