//! Class registry and cross-reference resolution.
//!
//! Classes live in a name-keyed arena and are referenced by [`ClassKey`]
//! handles; parent, ancestor, and child sets are plain key collections into
//! that arena. A class is registered *before* its parents are resolved, so
//! a pathological self-referential oracle answer cannot recurse forever.

use indexmap::IndexMap;
use serde_json::{json, Value};
use tracing::debug;

use crate::core::model::{FileId, TemplateVars};
use crate::core::oracle::TypeOracle;
use crate::core::typedesc::describe;

/// Stable handle to a class in the registry arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassKey(pub usize);

/// A data member newly declared by one class.
///
/// Ownership is ancestor-exclusive: a member whose name already appears in
/// any ancestor's field mapping is never re-added to a descendant.
#[derive(Debug, Clone)]
pub struct Field {
    /// Member name as reported by the oracle.
    pub name: String,
    /// Human-readable rendering of the member's declared shape.
    pub type_desc: String,
}

impl TemplateVars for Field {
    fn variable(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(json!(self.name)),
            "type" => Some(json!(self.type_desc)),
            _ => None,
        }
    }
}

/// A property synthesized from a class's accessor-style methods.
#[derive(Debug, Clone)]
pub struct Property {
    /// Property name (lowercased keyword name).
    pub name: String,
    /// Readable through a `GetProperty` method.
    pub is_gettable: bool,
    /// Writable through a `SetProperty` method.
    pub is_settable: bool,
    /// Settable only at construction, through an `Init` keyword.
    pub is_init_only: bool,
}

impl TemplateVars for Property {
    fn variable(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(json!(self.name)),
            "is_gettable" => Some(json!(self.is_gettable)),
            "is_settable" => Some(json!(self.is_settable)),
            "is_init_only" => Some(json!(self.is_init_only)),
            _ => None,
        }
    }
}

/// Accessor naming conventions that promote keyword arguments to
/// properties. Matched as a fixed suffix on the method name,
/// case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorKind {
    /// `Class::Init` constructor keyword.
    Init,
    /// `Class::GetProperty` keyword.
    Getter,
    /// `Class::SetProperty` keyword.
    Setter,
}

/// Identify the accessor convention a method name follows, if any.
pub fn accessor_kind(routine_name: &str) -> Option<AccessorKind> {
    let lower = routine_name.to_lowercase();
    if lower.ends_with("::init") {
        Some(AccessorKind::Init)
    } else if lower.ends_with("::getproperty") {
        Some(AccessorKind::Getter)
    } else if lower.ends_with("::setproperty") {
        Some(AccessorKind::Setter)
    } else {
        None
    }
}

/// Class name portion of a `Class::method` routine name.
pub fn method_class_name(routine_name: &str) -> Option<&str> {
    let cut = routine_name.find("::")?;
    let class = &routine_name[..cut];
    if class.is_empty() {
        None
    } else {
        Some(class)
    }
}

/// One class in the hierarchy.
///
/// Created on first reference, either from a file that declares its methods
/// or from another class discovering it as a superclass.
#[derive(Debug, Clone)]
pub struct ClassEntity {
    /// Class name with first-seen casing.
    pub name: String,
    /// File that defines the class structure, when one was parsed.
    pub file: Option<FileId>,
    /// Direct superclasses, in oracle-reported order.
    pub parents: Vec<ClassKey>,
    /// Flattened, order-preserving, duplicate-free transitive ancestors.
    pub ancestors: Vec<ClassKey>,
    /// Classes that list this one as a direct parent.
    pub children: Vec<ClassKey>,
    /// Fields newly declared by this class, keyed by lowercased name.
    pub fields: IndexMap<String, Field>,
    /// Properties keyed by lowercased name.
    pub properties: IndexMap<String, Property>,
}

impl ClassEntity {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: None,
            parents: Vec::new(),
            ancestors: Vec::new(),
            children: Vec::new(),
            fields: IndexMap::new(),
            properties: IndexMap::new(),
        }
    }
}

/// Arena of all classes discovered during a run, keyed case-insensitively
/// by name.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    arena: Vec<ClassEntity>,
    by_name: IndexMap<String, ClassKey>,
}

impl ClassRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of classes in the registry.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// True when no classes have been registered.
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Borrow a class by handle.
    pub fn get(&self, key: ClassKey) -> &ClassEntity {
        &self.arena[key.0]
    }

    /// Mutably borrow a class by handle.
    pub fn get_mut(&mut self, key: ClassKey) -> &mut ClassEntity {
        &mut self.arena[key.0]
    }

    /// Look up a class by case-insensitive name.
    pub fn find(&self, name: &str) -> Option<ClassKey> {
        self.by_name.get(&name.to_lowercase()).copied()
    }

    /// Iterate over all classes in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (ClassKey, &ClassEntity)> {
        self.arena
            .iter()
            .enumerate()
            .map(|(index, entity)| (ClassKey(index), entity))
    }

    /// Record the file that defines a class structure.
    pub fn set_defining_file(&mut self, key: ClassKey, file: FileId) {
        self.arena[key.0].file = Some(file);
    }

    /// Resolve a class by name, creating and linking it (and, recursively,
    /// its ancestors) on first reference.
    ///
    /// Resolution runs once, synchronously, at creation: the class is
    /// registered first, then each oracle-reported parent is resolved and
    /// wired both ways, then the class's own structure is introspected and
    /// only ancestor-exclusive members become fields. Oracle failures are
    /// reported through `warnings` and leave the class with zero fields.
    pub fn resolve(
        &mut self,
        name: &str,
        oracle: &dyn TypeOracle,
        warnings: &mut Vec<String>,
    ) -> ClassKey {
        let lower = name.to_lowercase();
        if let Some(key) = self.by_name.get(&lower) {
            return *key;
        }

        let key = ClassKey(self.arena.len());
        self.arena.push(ClassEntity::new(name));
        self.by_name.insert(lower, key);
        debug!(class = name, "resolving class");

        for parent_name in oracle.superclasses(name) {
            let parent = self.resolve(&parent_name, oracle, warnings);
            if parent == key {
                // A class can never be its own ancestor.
                warnings.push(format!("class '{name}' reports itself as a superclass"));
                continue;
            }
            self.arena[key.0].parents.push(parent);
            if !self.arena[parent.0].children.contains(&key) {
                self.arena[parent.0].children.push(key);
            }
            self.add_ancestor(key, parent);
            let inherited: Vec<ClassKey> = self.arena[parent.0].ancestors.clone();
            for ancestor in inherited {
                self.add_ancestor(key, ancestor);
            }
        }

        match oracle.own_structure(name) {
            Ok(members) => {
                for (member_name, value) in members {
                    let member_lower = member_name.to_lowercase();
                    if self.is_inherited_field(key, &member_lower) {
                        continue;
                    }
                    self.arena[key.0].fields.insert(
                        member_lower,
                        Field {
                            name: member_name,
                            type_desc: describe(&value),
                        },
                    );
                }
            }
            Err(err) => warnings.push(err.to_string()),
        }

        key
    }

    /// Look up or create a property and union the flag for the given
    /// accessor kind. Repeated calls never clear previously raised flags.
    pub fn promote_keyword_to_property(
        &mut self,
        class: ClassKey,
        keyword_name: &str,
        kind: AccessorKind,
    ) {
        let lower = keyword_name.to_lowercase();
        let property = self.arena[class.0]
            .properties
            .entry(lower.clone())
            .or_insert_with(|| Property {
                name: lower,
                is_gettable: false,
                is_settable: false,
                is_init_only: false,
            });
        match kind {
            AccessorKind::Init => property.is_init_only = true,
            AccessorKind::Getter => property.is_gettable = true,
            AccessorKind::Setter => property.is_settable = true,
        }
    }

    /// Template-variable surface for a class; needs the registry to render
    /// related class names.
    pub fn class_variable(&self, key: ClassKey, name: &str) -> Option<Value> {
        let entity = self.get(key);
        let names = |keys: &[ClassKey]| -> Vec<String> {
            keys.iter().map(|k| self.get(*k).name.clone()).collect()
        };
        match name {
            "name" => Some(json!(entity.name)),
            "parents" => Some(json!(names(&entity.parents))),
            "ancestors" => Some(json!(names(&entity.ancestors))),
            "children" => Some(json!(names(&entity.children))),
            "n_fields" => Some(json!(entity.fields.len())),
            "fields" => Some(json!(entity
                .fields
                .values()
                .map(|f| format!("{}: {}", f.name, f.type_desc))
                .collect::<Vec<_>>())),
            "properties" => Some(json!(entity
                .properties
                .values()
                .map(|p| p.name.clone())
                .collect::<Vec<_>>())),
            _ => None,
        }
    }

    fn add_ancestor(&mut self, class: ClassKey, ancestor: ClassKey) {
        if ancestor == class {
            return;
        }
        if !self.arena[class.0].ancestors.contains(&ancestor) {
            self.arena[class.0].ancestors.push(ancestor);
        }
    }

    fn is_inherited_field(&self, class: ClassKey, lower_name: &str) -> bool {
        self.arena[class.0]
            .ancestors
            .iter()
            .any(|a| self.arena[a.0].fields.contains_key(lower_name))
    }
}
