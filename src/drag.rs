/// Vertical extent of one rendered row, in whatever units the pointer uses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowSpan {
    pub top: f64,
    pub height: f64,
}

impl RowSpan {
    pub fn new(top: f64, height: f64) -> Self {
        RowSpan { top, height }
    }

    pub fn midpoint(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// Uniform rows starting at `top`, one per list entry.
pub fn uniform_rows(top: f64, height: f64, count: usize) -> Vec<RowSpan> {
    (0..count)
        .map(|idx| RowSpan::new(top + idx as f64 * height, height))
        .collect()
}

/// Index of the first row whose midpoint lies below the pointer.
pub fn insertion_point(rows: &[RowSpan], pointer_y: f64) -> Option<usize> {
    rows.iter().position(|row| pointer_y < row.midpoint())
}

/// Moves `items[dragged]` in front of the row under the pointer, or to the
/// end when the pointer is past every midpoint. `rows` describes the layout
/// of `items` before the move. Returns the dragged item's new index.
pub fn reorder<T>(items: &mut Vec<T>, dragged: usize, rows: &[RowSpan], pointer_y: f64) -> usize {
    if dragged >= items.len() {
        return dragged;
    }
    let limit = rows.len().min(items.len());
    let item = items.remove(dragged);
    let target = match insertion_point(&rows[..limit], pointer_y) {
        Some(before) if before > dragged => before - 1,
        Some(before) => before,
        None => items.len(),
    };
    items.insert(target, item);
    target
}
