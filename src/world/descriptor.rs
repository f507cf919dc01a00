use crate::telemetry::logging;
use crate::world::segment_name::GMAP_EXTENSION;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Header keyword opening a map descriptor file.
const HEADER_KEYWORD: &str = "GLEVELS";

/// Row placeholder for a grid cell with no level.
const EMPTY_CELL: &str = "-";

/// A parsed `.gmap` file: grid dimensions plus segment names in row-major
/// order. Immutable after parse; a re-download replaces the whole value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GmapDescriptor {
    pub base_name: String,
    pub width: i32,
    pub height: i32,
    pub segments: Vec<String>,
}

impl GmapDescriptor {
    /// Level name occupying a grid cell.
    ///
    /// `None` for out-of-range cells, placeholder cells, and cells beyond a
    /// short segment list. The declared dimensions are not validated
    /// against the list length at parse time, so lookups stay defensive.
    pub fn segment_at(&self, x: i32, y: i32) -> Option<&str> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        let index = (y * self.width + x) as usize;
        self.segments
            .get(index)
            .map(String::as_str)
            .filter(|name| !name.is_empty() && *name != EMPTY_CELL)
    }

    pub fn cell_count(&self) -> usize {
        (self.width * self.height) as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    /// Filename lacks the descriptor extension; a type discriminator, not a
    /// data problem.
    NotADescriptor(String),
    /// Header missing or unparsable. A garbled download the caller should
    /// know about, e.g. to schedule a re-fetch.
    MalformedDescriptor(String),
}

impl std::fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DescriptorError::NotADescriptor(name) => {
                write!(f, "{} is not a map descriptor", name)
            }
            DescriptorError::MalformedDescriptor(reason) => {
                write!(f, "malformed map descriptor: {}", reason)
            }
        }
    }
}

impl std::error::Error for DescriptorError {}

/// Parses downloaded map-descriptor bytes.
///
/// Line one is `GLEVELS <width> <height>`; every following non-blank line
/// is one segment name, row-major. The count is not checked against
/// `width * height`; short and long lists are the consumers' problem.
pub fn parse_descriptor(filename: &str, bytes: &[u8]) -> Result<GmapDescriptor, DescriptorError> {
    let base_name = filename
        .strip_suffix(GMAP_EXTENSION)
        .ok_or_else(|| DescriptorError::NotADescriptor(filename.to_string()))?;

    let content = match std::str::from_utf8(bytes) {
        Ok(content) => content.to_string(),
        Err(_) => {
            logging::log_error(&format!(
                "descriptor {} contained undecodable bytes; decoding lossy",
                filename
            ));
            String::from_utf8_lossy(bytes).into_owned()
        }
    };

    let mut lines = content.lines().map(str::trim).filter(|line| !line.is_empty());

    let header = lines.next().ok_or_else(|| {
        DescriptorError::MalformedDescriptor(format!("{} is empty", filename))
    })?;
    let (width, height) = parse_header(filename, header)?;

    let segments: Vec<String> = lines.map(str::to_string).collect();

    logging::log_map(&format!(
        "parsed descriptor {}: {}x{}, {} segment lines",
        filename,
        width,
        height,
        segments.len()
    ));

    Ok(GmapDescriptor {
        base_name: base_name.to_string(),
        width,
        height,
        segments,
    })
}

fn parse_header(filename: &str, header: &str) -> Result<(i32, i32), DescriptorError> {
    let mut fields = header.split_whitespace();
    let keyword = fields.next().unwrap_or_default();
    if keyword != HEADER_KEYWORD {
        return Err(DescriptorError::MalformedDescriptor(format!(
            "{} header starts with {:?}, expected {}",
            filename, keyword, HEADER_KEYWORD
        )));
    }
    let width = parse_dimension(filename, fields.next(), "width")?;
    let height = parse_dimension(filename, fields.next(), "height")?;
    if fields.next().is_some() {
        return Err(DescriptorError::MalformedDescriptor(format!(
            "{} header has trailing fields",
            filename
        )));
    }
    Ok((width, height))
}

fn parse_dimension(
    filename: &str,
    field: Option<&str>,
    label: &str,
) -> Result<i32, DescriptorError> {
    let raw = field.ok_or_else(|| {
        DescriptorError::MalformedDescriptor(format!("{} header missing {}", filename, label))
    })?;
    let value = raw.parse::<i32>().map_err(|_| {
        DescriptorError::MalformedDescriptor(format!(
            "{} header {} {:?} is not an integer",
            filename, label, raw
        ))
    })?;
    if value <= 0 {
        return Err(DescriptorError::MalformedDescriptor(format!(
            "{} header {} must be positive, got {}",
            filename, label, value
        )));
    }
    Ok(value)
}

/// Cache statistics for the descriptor cache.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub loads: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64) / (total as f64)
        }
    }
}

/// Parsed descriptors keyed by base name, with LRU eviction.
///
/// Re-inserting a base name overwrites the old entry wholesale; that is
/// how a re-download after invalidation takes effect.
pub struct DescriptorCache {
    cache: LruCache<String, Arc<GmapDescriptor>>,
    stats: CacheStats,
}

impl DescriptorCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        DescriptorCache {
            cache: LruCache::new(capacity),
            stats: CacheStats::default(),
        }
    }

    pub fn insert(&mut self, descriptor: GmapDescriptor) -> Arc<GmapDescriptor> {
        let key = descriptor.base_name.clone();
        let shared = Arc::new(descriptor);
        if let Some((evicted_key, _)) = self.cache.push(key.clone(), Arc::clone(&shared)) {
            if evicted_key != key {
                self.stats.evictions += 1;
            }
        }
        self.stats.loads += 1;
        shared
    }

    pub fn get(&mut self, base_name: &str) -> Option<Arc<GmapDescriptor>> {
        match self.cache.get(base_name) {
            Some(descriptor) => {
                self.stats.hits += 1;
                Some(Arc::clone(descriptor))
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Lookup without touching recency or stats; for snapshot assembly.
    pub fn peek(&self, base_name: &str) -> Option<&Arc<GmapDescriptor>> {
        self.cache.peek(base_name)
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}
