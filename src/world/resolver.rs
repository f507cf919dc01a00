use crate::net::properties::PositionUpdate;
use crate::telemetry::logging;
use crate::world::adjacency::SegmentGraph;
use crate::world::coords::world_to_segment;
use crate::world::descriptor::DescriptorCache;
use crate::world::segment_name::{build_segment_name, is_invalid_segment_name, GMAP_EXTENSION};
use serde::Serialize;

/// Where the current segment indices came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSource {
    /// A dedicated segment-indicating packet named the segment outright.
    Server,
    /// Computed from world coordinates by floor division.
    Derived,
}

/// Stateful core tracking the player through a segment grid.
///
/// Fed by discrete wire events in arrival order; every method is total.
/// "Don't know yet" comes back as the previous still-valid answer plus a
/// degraded flag, never as an error; a frame must always have something
/// to draw.
///
/// The resolver owns only its own fields. The adjacency graph and the
/// descriptor cache are owned by the session and passed in, so parallel
/// sessions in a test harness cannot share state by accident.
#[derive(Debug)]
pub struct PositionResolver {
    gmap_name: Option<String>,
    grid_width: i32,
    grid_height: i32,
    default_grid: (i32, i32),
    last_world: Option<(f64, f64)>,
    last_local: Option<(f64, f64)>,
    current_segment: Option<(i32, i32)>,
    tracked_level: Option<String>,
    last_concrete_level: Option<String>,
    resolved_level: Option<String>,
    degraded: bool,
    source: CoordinateSource,
}

impl PositionResolver {
    pub fn new(default_grid_width: i32, default_grid_height: i32) -> Self {
        PositionResolver {
            gmap_name: None,
            grid_width: default_grid_width,
            grid_height: default_grid_height,
            default_grid: (default_grid_width, default_grid_height),
            last_world: None,
            last_local: None,
            current_segment: None,
            tracked_level: None,
            last_concrete_level: None,
            resolved_level: None,
            degraded: false,
            source: CoordinateSource::Derived,
        }
    }

    /// Handles a level-name notification.
    ///
    /// A descriptor name differing from the tracked map tears down all
    /// per-map state before being adopted: a different GMAP must never
    /// merge with leftovers from the previous one. Any other name is the
    /// new concrete fallback, unconditionally.
    pub fn on_level_name(&mut self, graph: &mut SegmentGraph, name: &str) {
        self.tracked_level = Some(name.to_string());
        if name.ends_with(GMAP_EXTENSION) {
            if self.gmap_name.as_deref() != Some(name) {
                self.reset_for_map(graph, name);
            }
        } else {
            self.last_concrete_level = Some(name.to_string());
        }
    }

    fn reset_for_map(&mut self, graph: &mut SegmentGraph, name: &str) {
        logging::log_map(&format!(
            "switching map to {}, discarding {} cached segments",
            name,
            graph.len()
        ));
        graph.clear();
        let base = name.trim_end_matches(GMAP_EXTENSION);
        graph.set_map_base(base);
        self.gmap_name = Some(name.to_string());
        self.resolved_level = None;
        self.current_segment = None;
        self.last_world = None;
        self.last_local = None;
        self.grid_width = self.default_grid.0;
        self.grid_height = self.default_grid.1;
        self.degraded = false;
        self.source = CoordinateSource::Derived;
    }

    /// Primary update path for one position observation.
    ///
    /// Explicit segment indices are server-truth and beat anything derived
    /// from world coordinates, even when the two disagree: the segment
    /// packet regularly describes the new segment before the coordinate
    /// packet catches up.
    pub fn on_position_update(
        &mut self,
        graph: &mut SegmentGraph,
        descriptors: &mut DescriptorCache,
        update: &PositionUpdate,
    ) {
        if let Some(world) = update.world {
            self.last_world = Some(world);
        }
        if let Some(local) = update.local {
            self.last_local = Some(local);
        }

        let segment = match update.segment {
            Some(explicit) => {
                self.source = CoordinateSource::Server;
                Some(explicit)
            }
            None => match update.world.or(self.last_world) {
                Some((world_x, world_y)) => {
                    self.source = CoordinateSource::Derived;
                    let (seg_x, seg_y, local_x, local_y) = world_to_segment(world_x, world_y);
                    if update.local.is_none() {
                        self.last_local = Some((local_x, local_y));
                    }
                    Some((seg_x, seg_y))
                }
                None => None,
            },
        };

        let Some((seg_x, seg_y)) = segment else {
            self.enter_degraded("position update without any usable coordinates");
            return;
        };
        self.current_segment = Some((seg_x, seg_y));

        match self.resolve_cell(descriptors, seg_x, seg_y) {
            Some(name) => {
                if graph.node(&name).is_none() {
                    graph.register_segment(&name, seg_x, seg_y, false);
                }
                self.resolved_level = Some(name.clone());
                self.last_concrete_level = Some(name);
                self.degraded = false;
            }
            None => {
                // Sticky fallback: the previous resolution stands.
                self.enter_degraded(&format!(
                    "segment ({}, {}) did not resolve to a level name",
                    seg_x, seg_y
                ));
            }
        }
    }

    /// Maps a grid cell to its concrete level name.
    ///
    /// A parsed descriptor is authoritative, empty cells included; its
    /// names may be arbitrary strings the codec could never rebuild.
    /// Before the descriptor has arrived the name is constructed
    /// speculatively rather than blocking on the download.
    fn resolve_cell(
        &self,
        descriptors: &mut DescriptorCache,
        seg_x: i32,
        seg_y: i32,
    ) -> Option<String> {
        let base = self.map_base()?.to_string();
        if let Some(descriptor) = descriptors.get(&base) {
            return descriptor.segment_at(seg_x, seg_y).map(str::to_string);
        }
        let speculative = build_segment_name(&base, seg_x, seg_y);
        if is_invalid_segment_name(&speculative) {
            return None;
        }
        Some(speculative)
    }

    fn enter_degraded(&mut self, reason: &str) {
        if !self.degraded {
            logging::log_map(&format!("degraded resolution: {}", reason));
        }
        self.degraded = true;
    }

    /// Best level name for movement and collision, in priority order:
    /// the last known-good concrete level while in GMAP mode, then the
    /// tracked level when it is itself concrete, then the best-effort
    /// resolved name, then whatever name is tracked, possibly the
    /// descriptor itself, which callers must tolerate.
    pub fn effective_level_name(&self) -> Option<&str> {
        if self.in_gmap() {
            if let Some(name) = self.last_concrete_level.as_deref() {
                return Some(name);
            }
        }
        if let Some(name) = self.tracked_level.as_deref() {
            if !name.ends_with(GMAP_EXTENSION) {
                return Some(name);
            }
        }
        if let Some(name) = self.resolved_level.as_deref() {
            return Some(name);
        }
        self.tracked_level.as_deref()
    }

    pub fn in_gmap(&self) -> bool {
        self.gmap_name.is_some()
    }

    pub fn gmap_name(&self) -> Option<&str> {
        self.gmap_name.as_deref()
    }

    /// Map name without the descriptor extension.
    pub fn map_base(&self) -> Option<&str> {
        self.gmap_name
            .as_deref()
            .map(|name| name.trim_end_matches(GMAP_EXTENSION))
    }

    pub fn set_grid_dimensions(&mut self, width: i32, height: i32) {
        if width > 0 && height > 0 {
            self.grid_width = width;
            self.grid_height = height;
        }
    }

    pub fn grid_dimensions(&self) -> (i32, i32) {
        (self.grid_width, self.grid_height)
    }

    pub fn world_position(&self) -> Option<(f64, f64)> {
        self.last_world
    }

    pub fn local_position(&self) -> Option<(f64, f64)> {
        self.last_local
    }

    pub fn current_segment(&self) -> Option<(i32, i32)> {
        self.current_segment
    }

    pub fn resolved_level(&self) -> Option<&str> {
        self.resolved_level.as_deref()
    }

    pub fn last_concrete_level(&self) -> Option<&str> {
        self.last_concrete_level.as_deref()
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn coordinate_source(&self) -> CoordinateSource {
        self.source
    }
}
