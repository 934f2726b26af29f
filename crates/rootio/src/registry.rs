//! Class-name to constructor registry.
//!
//! Polymorphic fields only learn the concrete type of a record from the
//! class name stored in the stream. The registry turns that name into a
//! blank record ready to be decoded.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::opaque::Opaque;
use crate::record::Record;
use crate::{rbase, rcont};

/// Zero-argument factory producing a blank record.
pub type Constructor = Arc<dyn Fn() -> Box<dyn Record> + Send + Sync>;

/// Class name under which plain strings are sometimes stored.
const STRING_ALIAS: &str = "string";
const STRING_CLASS: &str = "TObjString";

/// How a class name was matched by [`TypeRegistry::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Exact,
    /// `"string"` mapped onto the registered string record.
    StringAlias,
    /// No constructor: the record is kept as raw bytes.
    Opaque,
}

/// A resolved class: its name and the constructor to use for it.
#[derive(Clone)]
pub struct ClassEntry {
    pub name: String,
    pub resolution: Resolution,
    ctor: Constructor,
}

impl ClassEntry {
    pub fn instantiate(&self) -> Box<dyn Record> {
        (self.ctor)()
    }

    pub fn is_opaque(&self) -> bool {
        self.resolution == Resolution::Opaque
    }
}

impl fmt::Debug for ClassEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassEntry")
            .field("name", &self.name)
            .field("resolution", &self.resolution)
            .finish()
    }
}

/// Thread-safe class registry.
///
/// Lookups take a shared lock and never block each other; registration takes
/// the exclusive lock.
#[derive(Default)]
pub struct TypeRegistry {
    db: RwLock<HashMap<String, Constructor>>,
    /// Per class, the version each known layout checksum stands for.
    checksums: RwLock<HashMap<String, HashMap<u32, i16>>>,
}

impl TypeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in record type.
    pub fn with_builtins() -> Self {
        let reg = Self::new();
        rbase::register(&reg);
        rcont::register(&reg);
        reg
    }

    /// Registers `ctor` under `class`. The last registration wins.
    pub fn register(&self, class: impl Into<String>, ctor: Constructor) {
        let class = class.into();
        let mut db = self.db.write();
        if db.contains_key(&class) {
            warn!(class = %class, "replacing registered constructor");
        } else {
            debug!(class = %class, "registered class");
        }
        db.insert(class, ctor);
    }

    /// Registers `T` under the class name of its default value.
    pub fn register_default<T: Record + Default + 'static>(&self) {
        let class = T::default().class_name().to_owned();
        self.register(class, Arc::new(|| Box::new(T::default()) as Box<dyn Record>));
    }

    /// Records that a version-0 header of `class` followed by `checksum`
    /// denotes on-disk version `version`.
    pub fn register_checksum(&self, class: impl Into<String>, checksum: u32, version: i16) {
        let class = class.into();
        debug!(class = %class, checksum, version, "registered class checksum");
        self.checksums
            .write()
            .entry(class)
            .or_default()
            .insert(checksum, version);
    }

    /// Whether version-0 headers of `class` carry a checksum.
    pub fn has_checksums(&self, class: &str) -> bool {
        self.checksums.read().contains_key(class)
    }

    /// The version a layout checksum of `class` stands for.
    pub fn checksum_version(&self, class: &str, checksum: u32) -> Option<i16> {
        self.checksums.read().get(class)?.get(&checksum).copied()
    }

    pub fn get(&self, class: &str) -> Option<Constructor> {
        self.db.read().get(class).cloned()
    }

    pub fn contains(&self, class: &str) -> bool {
        self.db.read().contains_key(class)
    }

    pub fn len(&self) -> usize {
        self.db.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.read().is_empty()
    }

    /// Registered class names, sorted.
    pub fn classes(&self) -> Vec<String> {
        let mut out: Vec<String> = self.db.read().keys().cloned().collect();
        out.sort();
        out
    }

    /// Finds the constructor for `class`.
    ///
    /// Never fails: `"string"` falls back to the string record when one is
    /// registered, and any other unknown name to an [`Opaque`] record
    /// carrying that name.
    pub fn resolve(&self, class: &str) -> ClassEntry {
        let db = self.db.read();
        if let Some(ctor) = db.get(class) {
            return ClassEntry {
                name: class.to_owned(),
                resolution: Resolution::Exact,
                ctor: ctor.clone(),
            };
        }
        if class == STRING_ALIAS {
            if let Some(ctor) = db.get(STRING_CLASS) {
                return ClassEntry {
                    name: class.to_owned(),
                    resolution: Resolution::StringAlias,
                    ctor: ctor.clone(),
                };
            }
        }
        let name = class.to_owned();
        ClassEntry {
            name: class.to_owned(),
            resolution: Resolution::Opaque,
            ctor: Arc::new(move || Box::new(Opaque::new(name.clone())) as Box<dyn Record>),
        }
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("classes", &self.classes())
            .finish()
    }
}

/// The process-wide registry, populated with the built-in types on first use.
pub fn global() -> &'static TypeRegistry {
    static REGISTRY: OnceLock<TypeRegistry> = OnceLock::new();
    REGISTRY.get_or_init(TypeRegistry::with_builtins)
}
