//! Builder API for ergonomic Language construction.
//!
//! Entities and features are declared by name; keys are derived by a
//! [`KeyGenerator`] when the language is built, and type references by
//! name are resolved against the language's own entities.
//!
//! # Example
//!
//! ```rust
//! use lionweb::language::{builtins, LanguageBuilder, Multiplicity};
//!
//! let files = LanguageBuilder::new("Files", "files", "1")
//!     .concept("Folder", |c| c
//!         .implements(builtins::inamed())
//!         .containment("items", "File", Multiplicity::ZeroOrMore)
//!     )
//!     .concept("File", |c| c
//!         .implements(builtins::inamed())
//!         .optional_property("size", builtins::integer())
//!     )
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(files.entities.len(), 2);
//! ```

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::SchemaError;
use crate::language::{
    Annotation, Concept, Entity, Enumeration, EnumerationLiteral, Feature, FeatureKind,
    Interface, KeyGenerator, Language, LanguageRef, MetaPointer, Multiplicity, PrimitiveType,
    QualifiedNameKeys,
};

/// A type named either locally (by entity name) or by meta-pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Local(String),
    Pointer(MetaPointer),
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        TypeRef::Local(name.to_string())
    }
}

impl From<String> for TypeRef {
    fn from(name: String) -> Self {
        TypeRef::Local(name)
    }
}

impl From<MetaPointer> for TypeRef {
    fn from(pointer: MetaPointer) -> Self {
        TypeRef::Pointer(pointer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClassifierKind {
    Concept,
    Annotation,
    Interface,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkKind {
    Property,
    Containment,
    Reference,
}

#[derive(Debug, Clone)]
struct PendingFeature {
    name: String,
    kind: LinkKind,
    ty: TypeRef,
    multiplicity: Multiplicity,
}

#[derive(Debug, Clone)]
enum PendingEntity {
    Classifier {
        name: String,
        kind: ClassifierKind,
        builder: ClassifierBuilder,
    },
    Enumeration {
        name: String,
        literals: Vec<String>,
    },
    Primitive {
        name: String,
    },
}

impl PendingEntity {
    fn name(&self) -> &str {
        match self {
            PendingEntity::Classifier { name, .. }
            | PendingEntity::Enumeration { name, .. }
            | PendingEntity::Primitive { name } => name,
        }
    }
}

/// Builder for constructing a Language.
#[derive(Debug, Clone)]
pub struct LanguageBuilder<K = QualifiedNameKeys> {
    name: String,
    key: String,
    version: String,
    keys: K,
    depends_on: Vec<LanguageRef>,
    entities: Vec<PendingEntity>,
}

impl LanguageBuilder<QualifiedNameKeys> {
    /// Creates a builder using [`QualifiedNameKeys`].
    pub fn new(
        name: impl Into<String>,
        key: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            version: version.into(),
            keys: QualifiedNameKeys,
            depends_on: Vec::new(),
            entities: Vec::new(),
        }
    }
}

impl<K: KeyGenerator> LanguageBuilder<K> {
    /// Replaces the key derivation strategy.
    pub fn with_keys<K2: KeyGenerator>(self, keys: K2) -> LanguageBuilder<K2> {
        LanguageBuilder {
            name: self.name,
            key: self.key,
            version: self.version,
            keys,
            depends_on: self.depends_on,
            entities: self.entities,
        }
    }

    /// Declares a dependency on another language.
    pub fn depends_on(mut self, language: &Language) -> Self {
        self.depends_on.push(language.reference());
        self
    }

    /// Declares a dependency by key and version.
    pub fn depends_on_ref(mut self, language: LanguageRef) -> Self {
        self.depends_on.push(language);
        self
    }

    // =========================================================================
    // Entities
    // =========================================================================

    pub fn concept<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(ClassifierBuilder) -> ClassifierBuilder,
    {
        self.classifier(name.into(), ClassifierKind::Concept, f)
    }

    pub fn annotation<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(ClassifierBuilder) -> ClassifierBuilder,
    {
        self.classifier(name.into(), ClassifierKind::Annotation, f)
    }

    pub fn interface<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(ClassifierBuilder) -> ClassifierBuilder,
    {
        self.classifier(name.into(), ClassifierKind::Interface, f)
    }

    pub fn enumeration(mut self, name: impl Into<String>, literals: &[&str]) -> Self {
        self.entities.push(PendingEntity::Enumeration {
            name: name.into(),
            literals: literals.iter().map(|l| l.to_string()).collect(),
        });
        self
    }

    pub fn primitive_type(mut self, name: impl Into<String>) -> Self {
        self.entities.push(PendingEntity::Primitive { name: name.into() });
        self
    }

    fn classifier<F>(mut self, name: String, kind: ClassifierKind, f: F) -> Self
    where
        F: FnOnce(ClassifierBuilder) -> ClassifierBuilder,
    {
        let builder = f(ClassifierBuilder::default());
        self.entities.push(PendingEntity::Classifier {
            name,
            kind,
            builder,
        });
        self
    }

    /// Derives keys, resolves local type names and builds the language.
    pub fn build(self) -> Result<Language, SchemaError> {
        let mut seen_keys = FxHashSet::default();
        let mut local: FxHashMap<String, String> = FxHashMap::default();

        for pending in &self.entities {
            let key = self.keys.key(&self.key, pending.name());
            self.claim_key(&mut seen_keys, &key)?;
            local.insert(pending.name().to_string(), key);
        }

        let mut language = Language::new(self.name.clone(), self.key.clone(), self.version.clone());
        language.depends_on = self.depends_on.clone();

        for pending in &self.entities {
            let entity_name = pending.name();
            let key = local[entity_name].clone();
            let entity = match pending {
                PendingEntity::Primitive { name } => Entity::PrimitiveType(PrimitiveType {
                    key,
                    name: name.clone(),
                }),
                PendingEntity::Enumeration { name, literals } => {
                    let mut built = Vec::with_capacity(literals.len());
                    for literal in literals {
                        let literal_key = self.keys.key(&self.key, &format!("{}.{}", name, literal));
                        self.claim_key(&mut seen_keys, &literal_key)?;
                        built.push(EnumerationLiteral {
                            key: literal_key,
                            name: literal.clone(),
                        });
                    }
                    Entity::Enumeration(Enumeration {
                        key,
                        name: name.clone(),
                        literals: built,
                    })
                }
                PendingEntity::Classifier {
                    name,
                    kind,
                    builder,
                } => {
                    let mut features = Vec::with_capacity(builder.features.len());
                    for pending_feature in &builder.features {
                        let qualified = format!("{}.{}", name, pending_feature.name);
                        let feature_key = self.keys.key(&self.key, &qualified);
                        self.claim_key(&mut seen_keys, &feature_key)?;
                        let ty = self.resolve(&local, &qualified, &pending_feature.ty)?;
                        features.push(match pending_feature.kind {
                            LinkKind::Property => Feature {
                                key: feature_key,
                                name: pending_feature.name.clone(),
                                optional: pending_feature.multiplicity.is_optional(),
                                kind: FeatureKind::Property { ty },
                            },
                            LinkKind::Containment => Feature::containment(
                                feature_key,
                                pending_feature.name.clone(),
                                ty,
                                pending_feature.multiplicity,
                            ),
                            LinkKind::Reference => Feature::reference(
                                feature_key,
                                pending_feature.name.clone(),
                                ty,
                                pending_feature.multiplicity,
                            ),
                        });
                    }

                    let mut extends = Vec::with_capacity(builder.extends.len());
                    for ty in &builder.extends {
                        extends.push(self.resolve(&local, name, ty)?);
                    }
                    let mut implements = Vec::with_capacity(builder.implements.len());
                    for ty in &builder.implements {
                        implements.push(self.resolve(&local, name, ty)?);
                    }

                    match kind {
                        ClassifierKind::Interface => {
                            extends.extend(implements);
                            Entity::Interface(Interface {
                                key,
                                name: name.clone(),
                                extends,
                                features,
                            })
                        }
                        ClassifierKind::Concept | ClassifierKind::Annotation => {
                            if extends.len() > 1 {
                                return Err(SchemaError::InvalidSupertype {
                                    element: name.clone(),
                                    pointer: extends.swap_remove(1),
                                    role: "super-concept",
                                    expected: "a single super-concept",
                                });
                            }
                            let extends = extends.pop();
                            if *kind == ClassifierKind::Concept {
                                Entity::Concept(Concept {
                                    key,
                                    name: name.clone(),
                                    is_abstract: builder.is_abstract,
                                    partition: builder.partition,
                                    extends,
                                    implements,
                                    features,
                                })
                            } else {
                                let annotates = match &builder.annotates {
                                    Some(ty) => Some(self.resolve(&local, name, ty)?),
                                    None => None,
                                };
                                Entity::Annotation(Annotation {
                                    key,
                                    name: name.clone(),
                                    annotates,
                                    extends,
                                    implements,
                                    features,
                                })
                            }
                        }
                    }
                }
            };
            language.entities.push(entity);
        }

        Ok(language)
    }

    fn claim_key(&self, seen: &mut FxHashSet<String>, key: &str) -> Result<(), SchemaError> {
        if !seen.insert(key.to_string()) {
            return Err(SchemaError::DuplicateKey {
                language: self.key.clone(),
                key: key.to_string(),
            });
        }
        Ok(())
    }

    fn resolve(
        &self,
        local: &FxHashMap<String, String>,
        element: &str,
        ty: &TypeRef,
    ) -> Result<MetaPointer, SchemaError> {
        match ty {
            TypeRef::Pointer(pointer) => Ok(pointer.clone()),
            TypeRef::Local(name) => local
                .get(name)
                .map(|key| MetaPointer::new(self.key.clone(), self.version.clone(), key.clone()))
                .ok_or_else(|| SchemaError::UnknownLocalType {
                    element: element.to_string(),
                    name: name.clone(),
                }),
        }
    }
}

/// Builder for the supertypes and features of a concept, annotation or interface.
#[derive(Debug, Clone, Default)]
pub struct ClassifierBuilder {
    extends: Vec<TypeRef>,
    implements: Vec<TypeRef>,
    annotates: Option<TypeRef>,
    is_abstract: bool,
    partition: bool,
    features: Vec<PendingFeature>,
}

impl ClassifierBuilder {
    /// Super-concept for concepts and annotations; super-interface for interfaces.
    pub fn extends(mut self, ty: impl Into<TypeRef>) -> Self {
        self.extends.push(ty.into());
        self
    }

    pub fn implements(mut self, ty: impl Into<TypeRef>) -> Self {
        self.implements.push(ty.into());
        self
    }

    /// The classifier an annotation may be attached to.
    pub fn annotates(mut self, ty: impl Into<TypeRef>) -> Self {
        self.annotates = Some(ty.into());
        self
    }

    pub fn abstract_concept(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn partition(mut self) -> Self {
        self.partition = true;
        self
    }

    /// Adds a required property.
    pub fn property(self, name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        self.feature(name.into(), LinkKind::Property, ty.into(), Multiplicity::Single)
    }

    pub fn optional_property(self, name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        self.feature(name.into(), LinkKind::Property, ty.into(), Multiplicity::Optional)
    }

    pub fn containment(
        self,
        name: impl Into<String>,
        ty: impl Into<TypeRef>,
        multiplicity: Multiplicity,
    ) -> Self {
        self.feature(name.into(), LinkKind::Containment, ty.into(), multiplicity)
    }

    pub fn reference(
        self,
        name: impl Into<String>,
        ty: impl Into<TypeRef>,
        multiplicity: Multiplicity,
    ) -> Self {
        self.feature(name.into(), LinkKind::Reference, ty.into(), multiplicity)
    }

    fn feature(
        mut self,
        name: String,
        kind: LinkKind,
        ty: TypeRef,
        multiplicity: Multiplicity,
    ) -> Self {
        self.features.push(PendingFeature {
            name,
            kind,
            ty,
            multiplicity,
        });
        self
    }
}
