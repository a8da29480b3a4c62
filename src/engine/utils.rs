use crate::rng::Rng;
use crate::types::Vec2;

/// Euclidean distance truncated to whole cells.
pub(crate) fn straight_line_distance(a: Vec2, b: Vec2) -> i32 {
    let dx = (a.x - b.x) as f64;
    let dy = (a.y - b.y) as f64;
    (dx * dx + dy * dy).sqrt() as i32
}

pub(crate) fn random_sign(rng: &mut Rng) -> i32 {
    if rng.bool(0.5) {
        1
    } else {
        -1
    }
}

/// Index of the first value with the smallest key; ties keep the earliest.
pub(crate) fn first_min_by_key<T, F>(values: &[T], mut key: F) -> Option<usize>
where
    F: FnMut(&T) -> i32,
{
    let mut best: Option<(usize, i32)> = None;
    for (idx, value) in values.iter().enumerate() {
        let k = key(value);
        if best.is_none_or(|(_, current)| k < current) {
            best = Some((idx, k));
        }
    }
    best.map(|(idx, _)| idx)
}
