pub mod config;
pub mod net;
pub mod telemetry;
pub mod world;

pub use config::ClientConfig;
pub use net::properties::{
    PositionUpdate, PropValue, PLPROP_CURLEVEL, PLPROP_GMAPLEVELX, PLPROP_GMAPLEVELY, PLPROP_X,
    PLPROP_X2, PLPROP_Y, PLPROP_Y2,
};
pub use world::adjacency::{Direction, SegmentGraph, SegmentNode, ALL_DIRECTIONS};
pub use world::coords::{
    pixels_to_tiles, segment_to_world, tiles_to_pixels, world_to_segment, CoordinateSet,
    SEGMENT_TILES,
};
pub use world::crossing::detect_crossing;
pub use world::descriptor::{
    parse_descriptor, CacheStats, DescriptorCache, DescriptorError, GmapDescriptor,
};
pub use world::resolver::{CoordinateSource, PositionResolver};
pub use world::segment_name::{
    build_segment_name, is_gmap_related, is_invalid_segment_name, parse_segment_name,
    ParsedSegment, GMAP_EXTENSION, LEVEL_EXTENSION,
};
pub use world::snapshot::{Quality, SegmentCell, Snapshot, Validation};
pub use world::state::GmapWorld;
