/// Tiles per segment edge; a segment is one 64x64 level in the GMAP grid.
pub const SEGMENT_TILES: i32 = 64;

/// Pixels per tile on the wire.
pub const PIXELS_PER_TILE: f64 = 16.0;

/// Allowed drift between world coordinates and segment*64+local before the
/// observation is flagged as inconsistent.
pub const COORD_TOLERANCE: f64 = 0.1;

pub fn tiles_to_pixels(tiles: f64) -> i32 {
    (tiles * PIXELS_PER_TILE).round() as i32
}

pub fn pixels_to_tiles(pixels: i32) -> f64 {
    f64::from(pixels) / PIXELS_PER_TILE
}

/// Split world tile coordinates into segment grid indices plus local offsets.
///
/// Floor division, not truncation: world (-1.0, -1.0) is segment (-1, -1)
/// with local (63.0, 63.0), never segment (0, 0) with a negative local.
pub fn world_to_segment(world_x: f64, world_y: f64) -> (i32, i32, f64, f64) {
    let seg_x = (world_x / f64::from(SEGMENT_TILES)).floor() as i32;
    let seg_y = (world_y / f64::from(SEGMENT_TILES)).floor() as i32;
    let local_x = world_x - f64::from(seg_x) * f64::from(SEGMENT_TILES);
    let local_y = world_y - f64::from(seg_y) * f64::from(SEGMENT_TILES);
    (seg_x, seg_y, local_x, local_y)
}

pub fn segment_to_world(seg_x: i32, seg_y: i32, local_x: f64, local_y: f64) -> (f64, f64) {
    (
        f64::from(seg_x) * f64::from(SEGMENT_TILES) + local_x,
        f64::from(seg_y) * f64::from(SEGMENT_TILES) + local_y,
    )
}

/// One position observation as reported by the wire layer.
///
/// Transient value; the resolver keeps at most the last one.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateSet {
    pub local_x: f64,
    pub local_y: f64,
    pub world_x: f64,
    pub world_y: f64,
    pub segment_x: i32,
    pub segment_y: i32,
    pub is_gmap: bool,
    pub level_name: Option<String>,
    pub gmap_name: Option<String>,
}

impl CoordinateSet {
    /// Checks the world == segment*64 + local invariant per axis.
    ///
    /// Returns one description per violated axis; empty means consistent.
    /// Only meaningful in GMAP mode, where all three frames coexist.
    pub fn drift(&self) -> Vec<String> {
        if !self.is_gmap {
            return Vec::new();
        }
        let (expected_x, expected_y) = segment_to_world(
            self.segment_x,
            self.segment_y,
            self.local_x,
            self.local_y,
        );
        let mut drift = Vec::new();
        if (self.world_x - expected_x).abs() > COORD_TOLERANCE {
            drift.push(format!(
                "world x {} disagrees with segment {} local {} (expected {})",
                self.world_x, self.segment_x, self.local_x, expected_x
            ));
        }
        if (self.world_y - expected_y).abs() > COORD_TOLERANCE {
            drift.push(format!(
                "world y {} disagrees with segment {} local {} (expected {})",
                self.world_y, self.segment_y, self.local_y, expected_y
            ));
        }
        drift
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_round_trip_stays_within_one_sixteenth() {
        for step in 0..=2048 {
            let tiles = f64::from(step) * 0.05;
            let back = pixels_to_tiles(tiles_to_pixels(tiles));
            assert!(
                (back - tiles).abs() <= 1.0 / 16.0,
                "tiles {} came back as {}",
                tiles,
                back
            );
        }
    }

    #[test]
    fn pixel_round_trip_is_exact_for_integer_pixels() {
        for pixels in [-1024, -17, 0, 1, 16, 1023] {
            assert_eq!(tiles_to_pixels(pixels_to_tiles(pixels)), pixels);
        }
    }

    #[test]
    fn world_segment_split_matches_example_position() {
        let (seg_x, seg_y, local_x, local_y) = world_to_segment(94.0, 94.0);
        assert_eq!((seg_x, seg_y), (1, 1));
        assert_eq!((local_x, local_y), (30.0, 30.0));
    }

    #[test]
    fn negative_world_coordinates_floor_into_segment_minus_one() {
        let (seg_x, seg_y, local_x, local_y) = world_to_segment(-1.0, -1.0);
        assert_eq!((seg_x, seg_y), (-1, -1));
        assert_eq!((local_x, local_y), (63.0, 63.0));
    }

    #[test]
    fn segment_split_reconstructs_world_exactly() {
        for world in [-130.25, -64.0, -0.5, 0.0, 31.5, 64.0, 94.0, 4095.75] {
            let (seg_x, seg_y, local_x, local_y) = world_to_segment(world, world);
            assert!(local_x >= 0.0 && local_x < 64.0, "local {} out of range", local_x);
            let (back_x, back_y) = segment_to_world(seg_x, seg_y, local_x, local_y);
            assert_eq!(back_x, world);
            assert_eq!(back_y, world);
        }
    }

    #[test]
    fn drift_flags_only_the_axis_that_disagrees() {
        let observation = CoordinateSet {
            local_x: 30.0,
            local_y: 30.0,
            world_x: 94.0,
            world_y: 99.0,
            segment_x: 1,
            segment_y: 1,
            is_gmap: true,
            level_name: None,
            gmap_name: None,
        };
        let drift = observation.drift();
        assert_eq!(drift.len(), 1);
        assert!(drift[0].contains("world y"));
    }

    #[test]
    fn drift_is_empty_outside_gmap_mode() {
        let observation = CoordinateSet {
            local_x: 10.0,
            local_y: 10.0,
            world_x: 500.0,
            world_y: 500.0,
            segment_x: 0,
            segment_y: 0,
            is_gmap: false,
            level_name: None,
            gmap_name: None,
        };
        assert!(observation.drift().is_empty());
    }
}
