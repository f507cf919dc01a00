use crate::world::adjacency::Direction;
use crate::world::coords::SEGMENT_TILES;

/// Reports whether a movement from `old` to `new` (world tile coordinates)
/// crossed a segment edge, and in which compass direction.
///
/// Directions are geometric (east = +x); the legacy naming mirror in
/// [`Direction::map_offset`] must not be applied here on top.
///
/// Never reports a diagonal: per-tick deltas are small, and a same-tick
/// crossing on both axes is almost always a rounding artifact of
/// simultaneous axis movement. When both axes cross, the axis with the
/// larger absolute world delta wins; an exact tie goes to the horizontal
/// axis.
pub fn detect_crossing(old: (f64, f64), new: (f64, f64)) -> Option<Direction> {
    let old_seg_x = segment_index(old.0);
    let old_seg_y = segment_index(old.1);
    let new_seg_x = segment_index(new.0);
    let new_seg_y = segment_index(new.1);

    let crossed_x = new_seg_x != old_seg_x;
    let crossed_y = new_seg_y != old_seg_y;

    let delta_x = new.0 - old.0;
    let delta_y = new.1 - old.1;

    let horizontal = || {
        if delta_x > 0.0 {
            Direction::East
        } else {
            Direction::West
        }
    };
    let vertical = || {
        if delta_y > 0.0 {
            Direction::South
        } else {
            Direction::North
        }
    };

    match (crossed_x, crossed_y) {
        (false, false) => None,
        (true, false) => Some(horizontal()),
        (false, true) => Some(vertical()),
        (true, true) => {
            if delta_y.abs() > delta_x.abs() {
                Some(vertical())
            } else {
                Some(horizontal())
            }
        }
    }
}

fn segment_index(world: f64) -> i32 {
    (world / f64::from(SEGMENT_TILES)).floor() as i32
}
