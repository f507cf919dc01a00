use crate::world::adjacency::SegmentGraph;
use crate::world::coords::CoordinateSet;
use crate::world::descriptor::{DescriptorCache, GmapDescriptor};
use crate::world::resolver::{CoordinateSource, PositionResolver};
use crate::world::segment_name::{build_segment_name, is_invalid_segment_name};
use serde::Serialize;

/// Read model of the whole GMAP state for rendering and tooling.
///
/// A pure projection: capturing one mutates nothing, so it can be handed
/// to concurrent readers freely.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub active: bool,
    pub dimensions: (i32, i32),
    pub player_world_position: Option<(f64, f64)>,
    pub player_local_position: Option<(f64, f64)>,
    pub current_segment: Option<(i32, i32)>,
    pub segments: Vec<SegmentCell>,
    pub quality: Quality,
    pub validation: Validation,
}

#[derive(Debug, Clone, Serialize)]
pub struct SegmentCell {
    pub x: i32,
    pub y: i32,
    pub level_name: Option<String>,
    pub is_current: bool,
    pub is_loaded: bool,
    pub is_empty: bool,
}

/// How much of the picture is backed by real data right now.
#[derive(Debug, Clone, Serialize)]
pub struct Quality {
    pub has_descriptor: bool,
    pub has_world_coords: bool,
    pub has_segment_data: bool,
    pub current_segment_loaded: bool,
    pub coordinate_source: CoordinateSource,
}

/// Consistency report. `issues` mean the snapshot should not be trusted;
/// `warnings` are informational and expected during transitions.
#[derive(Debug, Clone, Serialize)]
pub struct Validation {
    pub valid: bool,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
}

impl Snapshot {
    pub fn capture(
        resolver: &PositionResolver,
        graph: &SegmentGraph,
        descriptors: &DescriptorCache,
    ) -> Snapshot {
        let active = resolver.in_gmap();
        let (width, height) = resolver.grid_dimensions();
        let descriptor = resolver
            .map_base()
            .and_then(|base| descriptors.peek(base))
            .map(|shared| shared.as_ref());
        let current_segment = resolver.current_segment();

        let mut segments = Vec::with_capacity((width * height).max(0) as usize);
        for y in 0..height {
            for x in 0..width {
                let level_name = cell_name(descriptor, resolver.map_base(), x, y);
                let is_loaded = level_name
                    .as_deref()
                    .map_or(false, |name| graph.is_loaded(name));
                segments.push(SegmentCell {
                    x,
                    y,
                    is_current: current_segment == Some((x, y)),
                    is_loaded,
                    is_empty: level_name.is_none(),
                    level_name,
                });
            }
        }

        let quality = Quality {
            has_descriptor: descriptor.is_some(),
            has_world_coords: resolver.world_position().is_some(),
            has_segment_data: current_segment.is_some(),
            current_segment_loaded: resolver
                .resolved_level()
                .map_or(false, |name| graph.is_loaded(name)),
            coordinate_source: resolver.coordinate_source(),
        };

        let validation = validate(resolver, descriptor, &segments, (width, height));

        Snapshot {
            active,
            dimensions: (width, height),
            player_world_position: resolver.world_position(),
            player_local_position: resolver.local_position(),
            current_segment,
            segments,
            quality,
            validation,
        }
    }
}

/// Level name for one grid cell, by the resolver's own rule: the parsed
/// descriptor is authoritative; before it arrives, names are constructed
/// speculatively from the base name.
fn cell_name(
    descriptor: Option<&GmapDescriptor>,
    base: Option<&str>,
    x: i32,
    y: i32,
) -> Option<String> {
    if let Some(descriptor) = descriptor {
        return descriptor.segment_at(x, y).map(str::to_string);
    }
    let base = base?;
    let speculative = build_segment_name(base, x, y);
    if is_invalid_segment_name(&speculative) {
        return None;
    }
    Some(speculative)
}

fn validate(
    resolver: &PositionResolver,
    descriptor: Option<&GmapDescriptor>,
    segments: &[SegmentCell],
    dimensions: (i32, i32),
) -> Validation {
    let mut issues = Vec::new();
    let mut warnings = Vec::new();

    if resolver.in_gmap() {
        if segments.iter().all(|cell| cell.is_empty) {
            issues.push("no grid cell resolves to a level name".to_string());
        }

        if let Some((seg_x, seg_y)) = resolver.current_segment() {
            let (width, height) = dimensions;
            if seg_x < 0 || seg_y < 0 || seg_x >= width || seg_y >= height {
                issues.push(format!(
                    "current segment ({}, {}) is outside the {}x{} grid",
                    seg_x, seg_y, width, height
                ));
            } else if segments
                .iter()
                .any(|cell| (cell.x, cell.y) == (seg_x, seg_y) && cell.is_empty)
            {
                warnings.push(format!(
                    "current segment ({}, {}) is an empty grid cell",
                    seg_x, seg_y
                ));
            }
        }

        if let (Some(descriptor), Some(resolved)) = (descriptor, resolver.resolved_level()) {
            if !descriptor.segments.iter().any(|name| name == resolved) {
                issues.push(format!(
                    "resolved level {} is not in the segment list",
                    resolved
                ));
            }
        }

        if resolver.is_degraded() {
            warnings.push("resolution degraded; reported values are last known good".to_string());
        }

        if let (Some((world_x, world_y)), Some((local_x, local_y)), Some((seg_x, seg_y))) = (
            resolver.world_position(),
            resolver.local_position(),
            resolver.current_segment(),
        ) {
            let observation = CoordinateSet {
                local_x,
                local_y,
                world_x,
                world_y,
                segment_x: seg_x,
                segment_y: seg_y,
                is_gmap: true,
                level_name: resolver.resolved_level().map(str::to_string),
                gmap_name: resolver.gmap_name().map(str::to_string),
            };
            warnings.extend(observation.drift());
        }
    }

    Validation {
        valid: issues.is_empty(),
        issues,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::properties::PositionUpdate;
    use crate::world::descriptor::parse_descriptor;

    fn chicken_descriptor() -> crate::world::descriptor::GmapDescriptor {
        let mut content = String::from("GLEVELS 3 3\n");
        for i in 1..=9 {
            content.push_str(&format!("chicken{}.nw\n", i));
        }
        parse_descriptor("chicken.gmap", content.as_bytes()).expect("parse")
    }

    fn world_update(x: f64, y: f64) -> PositionUpdate {
        PositionUpdate {
            world: Some((x, y)),
            ..PositionUpdate::default()
        }
    }

    #[test]
    fn inactive_session_snapshots_cleanly() {
        let resolver = PositionResolver::new(3, 3);
        let graph = SegmentGraph::new();
        let descriptors = DescriptorCache::new(4);

        let snapshot = Snapshot::capture(&resolver, &graph, &descriptors);
        assert!(!snapshot.active);
        assert_eq!(snapshot.dimensions, (3, 3));
        assert_eq!(snapshot.segments.len(), 9);
        assert!(snapshot.segments.iter().all(|cell| cell.is_empty));
        assert!(snapshot.validation.valid);
        assert!(snapshot.validation.warnings.is_empty());
    }

    #[test]
    fn active_snapshot_reflects_descriptor_and_position() {
        let mut resolver = PositionResolver::new(3, 3);
        let mut graph = SegmentGraph::new();
        let mut descriptors = DescriptorCache::new(4);
        resolver.on_level_name(&mut graph, "chicken.gmap");
        descriptors.insert(chicken_descriptor());
        resolver.set_grid_dimensions(3, 3);
        resolver.on_position_update(&mut graph, &mut descriptors, &world_update(94.0, 94.0));
        graph.mark_loaded("chicken5.nw", true);

        let snapshot = Snapshot::capture(&resolver, &graph, &descriptors);
        assert!(snapshot.active);
        assert_eq!(snapshot.current_segment, Some((1, 1)));
        assert_eq!(snapshot.player_world_position, Some((94.0, 94.0)));
        assert_eq!(snapshot.player_local_position, Some((30.0, 30.0)));

        let center = snapshot
            .segments
            .iter()
            .find(|cell| (cell.x, cell.y) == (1, 1))
            .expect("center cell");
        assert_eq!(center.level_name.as_deref(), Some("chicken5.nw"));
        assert!(center.is_current);
        assert!(center.is_loaded);
        assert!(!center.is_empty);

        assert!(snapshot.quality.has_descriptor);
        assert!(snapshot.quality.has_world_coords);
        assert!(snapshot.quality.has_segment_data);
        assert!(snapshot.quality.current_segment_loaded);
        assert_eq!(snapshot.quality.coordinate_source, CoordinateSource::Derived);
        assert!(snapshot.validation.valid);
        assert!(snapshot.validation.warnings.is_empty());
    }

    #[test]
    fn speculative_cells_appear_before_the_descriptor() {
        let mut resolver = PositionResolver::new(2, 2);
        let mut graph = SegmentGraph::new();
        let descriptors = DescriptorCache::new(4);
        resolver.on_level_name(&mut graph, "world.gmap");

        let snapshot = Snapshot::capture(&resolver, &graph, &descriptors);
        assert!(!snapshot.quality.has_descriptor);
        let names: Vec<_> = snapshot
            .segments
            .iter()
            .filter_map(|cell| cell.level_name.as_deref())
            .collect();
        assert_eq!(
            names,
            ["world-a0.nw", "world-b0.nw", "world-a1.nw", "world-b1.nw"]
        );
    }

    #[test]
    fn disagreeing_frames_warn_but_stay_valid() {
        let mut resolver = PositionResolver::new(3, 3);
        let mut graph = SegmentGraph::new();
        let mut descriptors = DescriptorCache::new(4);
        resolver.on_level_name(&mut graph, "chicken.gmap");
        descriptors.insert(chicken_descriptor());

        // Segment packet says (2, 1); world coordinates still imply (1, 1).
        let update = PositionUpdate {
            world: Some((94.0, 94.0)),
            local: Some((30.0, 30.0)),
            segment: Some((2, 1)),
            ..PositionUpdate::default()
        };
        resolver.on_position_update(&mut graph, &mut descriptors, &update);

        let snapshot = Snapshot::capture(&resolver, &graph, &descriptors);
        assert_eq!(snapshot.quality.coordinate_source, CoordinateSource::Server);
        assert!(snapshot.validation.valid);
        assert!(snapshot
            .validation
            .warnings
            .iter()
            .any(|warning| warning.contains("world x")));
    }

    #[test]
    fn out_of_grid_segment_is_an_issue() {
        let mut resolver = PositionResolver::new(3, 3);
        let mut graph = SegmentGraph::new();
        let mut descriptors = DescriptorCache::new(4);
        resolver.on_level_name(&mut graph, "world.gmap");
        resolver.on_position_update(&mut graph, &mut descriptors, &world_update(94.0, 400.0));

        let snapshot = Snapshot::capture(&resolver, &graph, &descriptors);
        assert!(!snapshot.validation.valid);
        assert!(snapshot
            .validation
            .issues
            .iter()
            .any(|issue| issue.contains("outside the 3x3 grid")));
    }

    #[test]
    fn all_empty_grid_is_an_issue() {
        let mut resolver = PositionResolver::new(3, 3);
        let mut graph = SegmentGraph::new();
        let mut descriptors = DescriptorCache::new(4);
        resolver.on_level_name(&mut graph, "holes.gmap");
        descriptors.insert(
            parse_descriptor("holes.gmap", b"GLEVELS 1 1\n-\n").expect("parse"),
        );
        resolver.set_grid_dimensions(1, 1);

        let snapshot = Snapshot::capture(&resolver, &graph, &descriptors);
        assert!(!snapshot.validation.valid);
        assert!(snapshot
            .validation
            .issues
            .iter()
            .any(|issue| issue.contains("no grid cell")));
    }

    #[test]
    fn snapshot_serializes_for_tooling() {
        let resolver = PositionResolver::new(2, 2);
        let graph = SegmentGraph::new();
        let descriptors = DescriptorCache::new(4);
        let snapshot = Snapshot::capture(&resolver, &graph, &descriptors);

        let yaml = serde_yaml::to_string(&snapshot).expect("serialize");
        assert!(yaml.contains("coordinate_source: derived"));
        assert!(yaml.contains("valid: true"));
    }
}
