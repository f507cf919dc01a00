use crate::telemetry::logging;
use crate::world::segment_name::{
    build_segment_name, is_invalid_segment_name, parse_segment_name,
};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
    Northeast,
    Northwest,
    Southeast,
    Southwest,
}

pub const ALL_DIRECTIONS: [Direction; 8] = [
    Direction::North,
    Direction::East,
    Direction::South,
    Direction::West,
    Direction::Northeast,
    Direction::Northwest,
    Direction::Southeast,
    Direction::Southwest,
];

impl Direction {
    /// Geometric compass offset: east is +x, south is +y.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
            Direction::Northeast => (1, -1),
            Direction::Northwest => (-1, -1),
            Direction::Southeast => (1, 1),
            Direction::Southwest => (-1, 1),
        }
    }

    /// Grid offset under the legacy naming convention.
    ///
    /// The classic map layout stores `e8` west of `d8`: east *decreases*
    /// the column index, west increases it. Diagonals inherit the
    /// horizontal flip. Only segment naming uses this; geometric movement
    /// goes through [`Direction::delta`].
    pub fn map_offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (-1, 0),
            Direction::South => (0, 1),
            Direction::West => (1, 0),
            Direction::Northeast => (-1, -1),
            Direction::Northwest => (1, -1),
            Direction::Southeast => (-1, 1),
            Direction::Southwest => (1, 1),
        }
    }

    pub fn from_map_offset(dx: i32, dy: i32) -> Option<Direction> {
        ALL_DIRECTIONS
            .into_iter()
            .find(|direction| direction.map_offset() == (dx, dy))
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::Northeast => Direction::Southwest,
            Direction::Northwest => Direction::Southeast,
            Direction::Southeast => Direction::Northwest,
            Direction::Southwest => Direction::Northeast,
        }
    }

    pub fn is_diagonal(self) -> bool {
        matches!(
            self,
            Direction::Northeast
                | Direction::Northwest
                | Direction::Southeast
                | Direction::Southwest
        )
    }
}

/// One cell of the adjacency graph.
///
/// Neighbors are recorded by level name, not by reference: a neighbor may
/// be known to exist long before its level content arrives.
#[derive(Debug, Clone)]
pub struct SegmentNode {
    pub coordinates: (i32, i32),
    pub level_name: String,
    pub neighbors: HashMap<Direction, String>,
    pub is_loaded: bool,
}

/// Per-map registry of segments and their expected neighbors.
///
/// Owned and injected by the session state; reset wholesale when the map
/// changes, never evicted piecemeal.
#[derive(Debug, Default)]
pub struct SegmentGraph {
    nodes: HashMap<String, SegmentNode>,
    by_coord: HashMap<(i32, i32), String>,
    pending_fetch: HashSet<String>,
    map_base: Option<String>,
}

impl SegmentGraph {
    pub fn new() -> Self {
        SegmentGraph::default()
    }

    /// Base map name used to construct expected neighbor names for
    /// segments whose own names do not encode one.
    pub fn set_map_base(&mut self, base: &str) {
        self.map_base = Some(base.to_string());
    }

    /// Adds a segment at a grid cell and wires up its neighbors.
    ///
    /// Idempotent: re-registering an already-loaded segment is ignored, so
    /// duplicate network events cannot clobber established links.
    pub fn register_segment(&mut self, name: &str, x: i32, y: i32, loaded: bool) {
        if let Some(node) = self.nodes.get_mut(name) {
            if node.is_loaded {
                logging::log_net(&format!("duplicate segment registration ignored: {}", name));
                return;
            }
            node.is_loaded = node.is_loaded || loaded;
            if loaded {
                self.pending_fetch.remove(name);
            }
            return;
        }

        let base = parse_segment_name(name)
            .map(|parsed| parsed.base)
            .or_else(|| self.map_base.clone());

        let mut neighbors = HashMap::new();
        if let Some(base) = base.as_deref() {
            for direction in ALL_DIRECTIONS {
                let (dx, dy) = direction.map_offset();
                let expected = build_segment_name(base, x + dx, y + dy);
                if is_invalid_segment_name(&expected) {
                    continue;
                }
                neighbors.insert(direction, expected);
            }
        }

        // Cross-check against segments already present: any node one cell
        // away links back regardless of what the name computation said.
        for direction in ALL_DIRECTIONS {
            let (dx, dy) = direction.map_offset();
            let Some(other_name) = self.by_coord.get(&(x + dx, y + dy)).cloned() else {
                continue;
            };
            neighbors.insert(direction, other_name.clone());
            if let Some(other) = self.nodes.get_mut(&other_name) {
                other
                    .neighbors
                    .insert(direction.opposite(), name.to_string());
            }
        }

        self.by_coord.insert((x, y), name.to_string());
        self.nodes.insert(
            name.to_string(),
            SegmentNode {
                coordinates: (x, y),
                level_name: name.to_string(),
                neighbors,
                is_loaded: loaded,
            },
        );
        if loaded {
            self.pending_fetch.remove(name);
        }
    }

    pub fn node(&self, name: &str) -> Option<&SegmentNode> {
        self.nodes.get(name)
    }

    pub fn node_at(&self, x: i32, y: i32) -> Option<&SegmentNode> {
        self.by_coord
            .get(&(x, y))
            .and_then(|name| self.nodes.get(name))
    }

    pub fn get_neighbor(&self, name: &str, direction: Direction) -> Option<&str> {
        self.nodes
            .get(name)?
            .neighbors
            .get(&direction)
            .map(String::as_str)
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.nodes.get(name).map_or(false, |node| node.is_loaded)
    }

    /// Records a level-content-loaded notification.
    ///
    /// Unknown names are registered lazily when their name encodes a grid
    /// cell; otherwise the notification is dropped. `loaded = false`
    /// re-arms the name for fetching.
    pub fn mark_loaded(&mut self, name: &str, loaded: bool) {
        self.pending_fetch.remove(name);
        if let Some(node) = self.nodes.get_mut(name) {
            node.is_loaded = loaded;
            return;
        }
        if loaded {
            if let Some(parsed) = parse_segment_name(name) {
                self.register_segment(name, parsed.x, parsed.y, true);
            }
        }
    }

    /// Neighbor names of `current` whose content is still missing and has
    /// not already been handed out for fetching.
    ///
    /// A set, not a queue: no ordering among neighbors. Returned names are
    /// remembered as requested, so calling this every frame cannot flood
    /// the downloader with duplicates.
    pub fn needs_fetch(&mut self, current: &str) -> HashSet<String> {
        let Some(node) = self.nodes.get(current) else {
            return HashSet::new();
        };
        let mut wanted = HashSet::new();
        for neighbor in node.neighbors.values() {
            if self.pending_fetch.contains(neighbor) {
                continue;
            }
            if self.nodes.get(neighbor).map_or(false, |n| n.is_loaded) {
                continue;
            }
            wanted.insert(neighbor.clone());
        }
        for name in &wanted {
            self.pending_fetch.insert(name.clone());
        }
        wanted
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Wholesale reset on map change; partial eviction is never done.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.by_coord.clear();
        self.pending_fetch.clear();
        self.map_base = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_an_involution() {
        for direction in ALL_DIRECTIONS {
            assert_eq!(direction.opposite().opposite(), direction);
        }
    }

    #[test]
    fn map_offset_negates_under_opposite() {
        for direction in ALL_DIRECTIONS {
            let (dx, dy) = direction.map_offset();
            assert_eq!(direction.opposite().map_offset(), (-dx, -dy));
        }
    }

    #[test]
    fn map_offset_mirrors_only_the_horizontal_axis() {
        assert_eq!(Direction::East.delta(), (1, 0));
        assert_eq!(Direction::East.map_offset(), (-1, 0));
        assert_eq!(Direction::North.delta(), Direction::North.map_offset());
        assert_eq!(Direction::South.delta(), Direction::South.map_offset());
    }

    #[test]
    fn column_zero_has_no_east_neighbor() {
        let mut graph = SegmentGraph::new();
        graph.register_segment("world-a0.nw", 0, 0, true);

        // Legacy convention: east decreases the column, which from column
        // zero builds the invalid marker and is dropped.
        assert_eq!(graph.get_neighbor("world-a0.nw", Direction::East), None);
        assert_eq!(
            graph.get_neighbor("world-a0.nw", Direction::West),
            Some("world-b0.nw")
        );
        assert_eq!(
            graph.get_neighbor("world-a0.nw", Direction::South),
            Some("world-a1.nw")
        );
    }

    #[test]
    fn registered_neighbors_link_reciprocally() {
        let mut graph = SegmentGraph::new();
        graph.register_segment("world-a0.nw", 0, 0, true);
        graph.register_segment("world-b0.nw", 1, 0, true);
        graph.register_segment("world-b1.nw", 1, 1, true);

        for name in ["world-a0.nw", "world-b0.nw", "world-b1.nw"] {
            let node = graph.node(name).expect("node");
            for (direction, neighbor) in &node.neighbors {
                let Some(other) = graph.node(neighbor) else {
                    continue;
                };
                assert_eq!(
                    other.neighbors.get(&direction.opposite()).map(String::as_str),
                    Some(name),
                    "{} -> {} in {:?} must link back",
                    name,
                    neighbor,
                    direction
                );
            }
        }
    }

    #[test]
    fn reciprocal_linking_works_without_codec_names() {
        // Descriptor-style names the codec cannot parse; only the
        // coordinate cross-check can connect them.
        let mut graph = SegmentGraph::new();
        graph.register_segment("chicken1.nw", 0, 0, true);
        graph.register_segment("chicken2.nw", 1, 0, true);

        assert_eq!(
            graph.get_neighbor("chicken1.nw", Direction::West),
            Some("chicken2.nw")
        );
        assert_eq!(
            graph.get_neighbor("chicken2.nw", Direction::East),
            Some("chicken1.nw")
        );
    }

    #[test]
    fn duplicate_registration_is_a_no_op() {
        let mut graph = SegmentGraph::new();
        graph.register_segment("world-b1.nw", 1, 1, true);
        let before = graph.node("world-b1.nw").expect("node").neighbors.clone();

        graph.register_segment("world-b1.nw", 1, 1, true);
        let after = graph.node("world-b1.nw").expect("node").neighbors.clone();

        assert_eq!(before, after);
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn late_registration_upgrades_an_unloaded_node() {
        let mut graph = SegmentGraph::new();
        graph.register_segment("world-b1.nw", 1, 1, false);
        assert!(!graph.is_loaded("world-b1.nw"));

        graph.register_segment("world-b1.nw", 1, 1, true);
        assert!(graph.is_loaded("world-b1.nw"));
    }

    #[test]
    fn needs_fetch_excludes_loaded_and_already_requested() {
        let mut graph = SegmentGraph::new();
        graph.register_segment("world-b1.nw", 1, 1, true);

        let first = graph.needs_fetch("world-b1.nw");
        assert!(first.contains("world-a1.nw"));
        assert!(first.contains("world-c1.nw"));
        assert!(first.contains("world-b0.nw"));
        assert!(first.contains("world-b2.nw"));
        assert_eq!(first.len(), 8);

        // Everything is now pending; nothing new to hand out.
        assert!(graph.needs_fetch("world-b1.nw").is_empty());

        // A loaded neighbor stays excluded, an unloaded one is re-armed.
        graph.mark_loaded("world-a1.nw", true);
        graph.mark_loaded("world-b0.nw", false);
        let again = graph.needs_fetch("world-b1.nw");
        assert!(!again.contains("world-a1.nw"));
        assert!(again.contains("world-b0.nw"));
        assert_eq!(again.len(), 1);
    }

    #[test]
    fn needs_fetch_for_unknown_segment_is_empty() {
        let mut graph = SegmentGraph::new();
        assert!(graph.needs_fetch("nowhere.nw").is_empty());
    }

    #[test]
    fn mark_loaded_registers_parseable_names_lazily() {
        let mut graph = SegmentGraph::new();
        graph.mark_loaded("world-c2.nw", true);
        let node = graph.node("world-c2.nw").expect("lazily registered");
        assert_eq!(node.coordinates, (2, 2));
        assert!(node.is_loaded);

        // Nothing to anchor an unparseable name to; dropped.
        graph.mark_loaded("lonely.nw", true);
        assert!(graph.node("lonely.nw").is_none());
    }

    #[test]
    fn clear_discards_everything() {
        let mut graph = SegmentGraph::new();
        graph.set_map_base("world");
        graph.register_segment("world-a0.nw", 0, 0, true);
        graph.needs_fetch("world-a0.nw");

        graph.clear();
        assert!(graph.is_empty());
        assert!(graph.node("world-a0.nw").is_none());
        assert!(graph.needs_fetch("world-a0.nw").is_empty());
    }
}
