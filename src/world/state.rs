use crate::config::ClientConfig;
use crate::net::properties::{PositionUpdate, PropValue};
use crate::world::adjacency::{Direction, SegmentGraph};
use crate::world::crossing::detect_crossing;
use crate::world::descriptor::{parse_descriptor, DescriptorCache, DescriptorError};
use crate::world::resolver::PositionResolver;
use crate::world::segment_name::parse_segment_name;
use crate::world::snapshot::Snapshot;
use std::collections::HashSet;

/// One client session's view of the world.
///
/// Owns the resolver, the adjacency graph, and the descriptor cache, and
/// is the surface the wire layer and the rendering layer talk to. All
/// updates go through `&mut self` in packet-arrival order; there is no
/// internal concurrency and nothing here blocks or performs I/O.
pub struct GmapWorld {
    config: ClientConfig,
    resolver: PositionResolver,
    graph: SegmentGraph,
    descriptors: DescriptorCache,
}

impl GmapWorld {
    pub fn new(config: ClientConfig) -> Self {
        let resolver =
            PositionResolver::new(config.default_grid_width, config.default_grid_height);
        let descriptors = DescriptorCache::new(config.descriptor_cache_capacity);
        GmapWorld {
            config,
            resolver,
            graph: SegmentGraph::new(),
            descriptors,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// A level-name notification from the wire layer.
    pub fn on_level_name(&mut self, name: &str) {
        self.resolver.on_level_name(&mut self.graph, name);
        if !self.resolver.in_gmap() {
            return;
        }
        let Some(base) = self.resolver.map_base().map(str::to_string) else {
            return;
        };
        // A map seen earlier in the session still has its parse cached.
        if let Some(descriptor) = self.descriptors.get(&base) {
            self.resolver
                .set_grid_dimensions(descriptor.width, descriptor.height);
        }
        // A segment-shaped name tells us its grid cell exists before any
        // content for it has arrived.
        if let Some(parsed) = parse_segment_name(name) {
            if parsed.base == base {
                self.graph.register_segment(name, parsed.x, parsed.y, false);
            }
        }
    }

    /// A burst of player properties straight off the wire.
    pub fn on_player_props(&mut self, props: &[(u8, PropValue)]) -> Option<Direction> {
        let update = PositionUpdate::from_props(props);
        self.on_position_update(&update)
    }

    /// One position observation; returns the segment-boundary crossing it
    /// produced, if any, for transition triggers (level-enter events).
    pub fn on_position_update(&mut self, update: &PositionUpdate) -> Option<Direction> {
        if let Some(name) = update.level_name.clone() {
            self.on_level_name(&name);
        }
        let before = self.resolver.world_position();
        self.resolver
            .on_position_update(&mut self.graph, &mut self.descriptors, update);
        let after = self.resolver.world_position();
        match (before, after) {
            (Some(old), Some(new)) => detect_crossing(old, new),
            _ => None,
        }
    }

    /// A completed file download. `Ok(true)` when the file was a map
    /// descriptor and has been adopted; `Ok(false)` when it was some other
    /// file this core does not consume.
    pub fn on_file_received(
        &mut self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<bool, DescriptorError> {
        let descriptor = match parse_descriptor(filename, bytes) {
            Ok(descriptor) => descriptor,
            Err(DescriptorError::NotADescriptor(_)) => return Ok(false),
            Err(err) => return Err(err),
        };
        let base = descriptor.base_name.clone();
        let dimensions = (descriptor.width, descriptor.height);
        self.descriptors.insert(descriptor);
        if self.resolver.map_base() == Some(base.as_str()) {
            self.resolver.set_grid_dimensions(dimensions.0, dimensions.1);
        }
        Ok(true)
    }

    /// A level-content-loaded notification.
    pub fn on_level_loaded(&mut self, name: &str, loaded: bool) {
        self.graph.mark_loaded(name, loaded);
    }

    /// Level name movement and collision code should use right now.
    pub fn effective_level_name(&self) -> Option<&str> {
        self.resolver.effective_level_name()
    }

    /// Neighbor segments worth downloading next. Empty until the current
    /// segment has resolved.
    pub fn needs_fetch(&mut self) -> HashSet<String> {
        match self.resolver.resolved_level().map(str::to_string) {
            Some(current) => self.graph.needs_fetch(&current),
            None => HashSet::new(),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.resolver, &self.graph, &self.descriptors)
    }

    pub fn resolver(&self) -> &PositionResolver {
        &self.resolver
    }

    pub fn graph(&self) -> &SegmentGraph {
        &self.graph
    }
}

impl Default for GmapWorld {
    fn default() -> Self {
        GmapWorld::new(ClientConfig::default())
    }
}
