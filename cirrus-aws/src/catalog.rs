//! Builder discovery.
//!
//! Every archive (a resource root) may ship a `META-INF/aws.builders` file
//! listing fully-qualified builder type names, one per line. Lines starting
//! with `#` are comments. The catalog merges all files visible to a loading
//! context into one set and caches it for the life of the catalog.

use crate::error::{AutoConfigureError, Result};
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, trace};

/// Default discovery resource.
pub const BUILDERS_RESOURCE: &str = "META-INF/aws.builders";

/// Source of named resources for one loading context.
pub trait ResourceLoader: Send + Sync {
    /// Identity of the loading context. Catalog entries are cached per id.
    fn context_id(&self) -> &str;

    /// Contents of every resource with this logical name, one entry per
    /// archive that contains it.
    fn resources(&self, name: &str) -> io::Result<Vec<String>>;
}

/// Resources read from a list of directories, each acting as an archive.
#[derive(Debug, Clone)]
pub struct DirectoryResourceLoader {
    id: String,
    roots: Vec<PathBuf>,
}

impl DirectoryResourceLoader {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            roots: Vec::new(),
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }
}

impl ResourceLoader for DirectoryResourceLoader {
    fn context_id(&self) -> &str {
        &self.id
    }

    fn resources(&self, name: &str) -> io::Result<Vec<String>> {
        let mut contents = Vec::new();
        for root in &self.roots {
            let path = root.join(name);
            match fs::read_to_string(&path) {
                Ok(content) => {
                    trace!(path = %path.display(), "Read discovery resource");
                    contents.push(content);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(contents)
    }
}

/// Resources held in memory, mostly for statically linked SDK modules.
#[derive(Debug, Clone, Default)]
pub struct StaticResourceLoader {
    id: String,
    resources: HashMap<String, Vec<String>>,
}

impl StaticResourceLoader {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            resources: HashMap::new(),
        }
    }

    /// Add one archive's copy of resource `name`.
    pub fn with_resource(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.resources
            .entry(name.into())
            .or_default()
            .push(content.into());
        self
    }
}

impl ResourceLoader for StaticResourceLoader {
    fn context_id(&self) -> &str {
        &self.id
    }

    fn resources(&self, name: &str) -> io::Result<Vec<String>> {
        Ok(self.resources.get(name).cloned().unwrap_or_default())
    }
}

/// Cached, per-context set of discoverable builder type names.
#[derive(Debug)]
pub struct BuilderNameCatalog {
    location: String,
    cache: RwLock<HashMap<String, Arc<BTreeSet<String>>>>,
}

impl BuilderNameCatalog {
    pub fn new() -> Self {
        Self::with_location(BUILDERS_RESOURCE)
    }

    /// Catalog reading a different resource name.
    pub fn with_location(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Builder names visible to `loader`, loaded on first request.
    pub fn builder_names(&self, loader: &dyn ResourceLoader) -> Result<Arc<BTreeSet<String>>> {
        let context = loader.context_id();
        if let Some(names) = self.cache.read().get(context) {
            trace!(context, count = names.len(), "Builder catalog cache hit");
            return Ok(names.clone());
        }

        let contents = loader
            .resources(&self.location)
            .map_err(|source| AutoConfigureError::Catalog {
                location: self.location.clone(),
                source,
            })?;

        let names: BTreeSet<String> = contents
            .iter()
            .flat_map(|content| parse_builder_names(content))
            .collect();
        debug!(
            context,
            location = %self.location,
            archives = contents.len(),
            count = names.len(),
            "Loaded builder catalog"
        );

        let names = Arc::new(names);
        self.cache
            .write()
            .insert(context.to_string(), names.clone());
        Ok(names)
    }

    /// Forget the cached entry for one context.
    pub fn evict(&self, context_id: &str) {
        self.cache.write().remove(context_id);
    }
}

impl Default for BuilderNameCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Entries of one discovery resource. Comment and blank lines are dropped.
pub fn parse_builder_names(content: &str) -> impl Iterator<Item = String> + '_ {
    content
        .lines()
        .filter(|line| !line.starts_with('#'))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingLoader {
        inner: StaticResourceLoader,
        calls: std::sync::atomic::AtomicUsize,
    }

    impl ResourceLoader for CountingLoader {
        fn context_id(&self) -> &str {
            self.inner.context_id()
        }

        fn resources(&self, name: &str) -> io::Result<Vec<String>> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.inner.resources(name)
        }
    }

    #[test]
    fn test_comment_lines_are_excluded() {
        let names: Vec<String> =
            parse_builder_names("# AmazonFoo\nAmazonFoo\n  AmazonBar  \n\n").collect();
        assert_eq!(names, vec!["AmazonFoo", "AmazonBar"]);
    }

    #[test]
    fn test_archives_merge_into_one_set() {
        let loader = StaticResourceLoader::new("app")
            .with_resource(BUILDERS_RESOURCE, "a.SqsBuilder\nb.SnsBuilder\n")
            .with_resource(BUILDERS_RESOURCE, "a.SqsBuilder\n# c.Hidden\nc.S3Builder\n");

        let names = BuilderNameCatalog::new().builder_names(&loader).unwrap();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["a.SqsBuilder", "b.SnsBuilder", "c.S3Builder"]);
    }

    #[test]
    fn test_names_are_cached_per_context() {
        let loader = CountingLoader {
            inner: StaticResourceLoader::new("ctx").with_resource(BUILDERS_RESOURCE, "a.Builder"),
            calls: Default::default(),
        };
        let catalog = BuilderNameCatalog::new();

        let first = catalog.builder_names(&loader).unwrap();
        let second = catalog.builder_names(&loader).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.calls.load(std::sync::atomic::Ordering::SeqCst), 1);

        catalog.evict("ctx");
        catalog.builder_names(&loader).unwrap();
        assert_eq!(loader.calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[test]
    fn test_concurrent_fills_agree() {
        let loader = StaticResourceLoader::new("ctx")
            .with_resource(BUILDERS_RESOURCE, "a.SqsBuilder\nb.SnsBuilder\n")
            .with_resource(BUILDERS_RESOURCE, "c.S3Builder\n");
        let catalog = BuilderNameCatalog::new();

        let results: Vec<Arc<BTreeSet<String>>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| catalog.builder_names(&loader).unwrap()))
                .collect();
            handles.into_iter().map(|handle| handle.join().unwrap()).collect()
        });

        let cached = catalog.builder_names(&loader).unwrap();
        assert_eq!(cached.len(), 3);
        for names in &results {
            assert_eq!(**names, *cached);
        }
    }

    #[test]
    fn test_custom_location() {
        let loader = StaticResourceLoader::new("ctx")
            .with_resource(BUILDERS_RESOURCE, "a.Builder")
            .with_resource("META-INF/custom.builders", "b.Builder");

        let names = BuilderNameCatalog::with_location("META-INF/custom.builders")
            .builder_names(&loader)
            .unwrap();
        assert!(names.contains("b.Builder"));
        assert!(!names.contains("a.Builder"));
    }
}
