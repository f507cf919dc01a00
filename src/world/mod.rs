pub mod adjacency;
pub mod coords;
pub mod crossing;
pub mod descriptor;
pub mod resolver;
pub mod segment_name;
pub mod snapshot;
pub mod state;
