//! Hash-indexed set of languages.
//!
//! Building a registry checks every schema invariant once: unique keys,
//! registered and acyclic dependencies, resolvable type pointers of the
//! right kind, acyclic inheritance and unique inherited feature keys.
//! Lookups by [`MetaPointer`] are then O(1).

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::SchemaError;
use crate::language::builtins::BUILTINS;
use crate::language::{
    Entity, Enumeration, EnumerationLiteral, Feature, FeatureKind, Language, LanguageRef,
    MetaPointer,
};

#[derive(Debug, Clone, Copy)]
enum Slot {
    Entity(usize, usize),
    Feature(usize, usize, usize),
    Literal(usize, usize, usize),
}

/// A resolved schema element.
#[derive(Debug, Clone, Copy)]
pub enum Element<'a> {
    Entity(&'a Entity),
    Feature {
        owner: &'a Entity,
        feature: &'a Feature,
    },
    Literal {
        enumeration: &'a Enumeration,
        literal: &'a EnumerationLiteral,
    },
}

/// A feature together with the meta-pointer nodes use for it.
#[derive(Debug, Clone, Copy)]
pub struct FeatureRef<'a> {
    pub pointer: &'a MetaPointer,
    pub feature: &'a Feature,
}

/// Languages indexed for resolution. Always contains the builtins.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    languages: Vec<Language>,
    language_index: FxHashMap<LanguageRef, usize>,
    elements: FxHashMap<MetaPointer, Slot>,
    /// Classifier -> all features, inherited first.
    features: FxHashMap<MetaPointer, Vec<MetaPointer>>,
    /// Classifier -> the same features, for membership tests.
    feature_sets: FxHashMap<MetaPointer, FxHashSet<MetaPointer>>,
    /// Classifier -> transitive supertypes.
    ancestors: FxHashMap<MetaPointer, FxHashSet<MetaPointer>>,
}

impl LanguageRegistry {
    /// Builds a registry from the given languages plus the builtins.
    pub fn new(languages: impl IntoIterator<Item = Language>) -> Result<Self, SchemaError> {
        let builtins = BUILTINS.reference();
        let mut all = vec![BUILTINS.clone()];
        all.extend(languages.into_iter().filter(|l| l.reference() != builtins));
        Self::build(all)
    }

    /// Adds a language. On error the registry is left unchanged.
    pub fn register(&mut self, language: Language) -> Result<(), SchemaError> {
        let mut languages = self.languages.clone();
        languages.push(language);
        *self = Self::build(languages)?;
        Ok(())
    }

    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    pub fn language(&self, reference: &LanguageRef) -> Option<&Language> {
        self.language_index
            .get(reference)
            .map(|&index| &self.languages[index])
    }

    pub fn has_language(&self, reference: &LanguageRef) -> bool {
        self.language_index.contains_key(reference)
    }

    /// Resolves any entity, feature or literal.
    pub fn resolve(&self, pointer: &MetaPointer) -> Option<Element<'_>> {
        let slot = self.elements.get(pointer)?;
        Some(match *slot {
            Slot::Entity(l, e) => Element::Entity(&self.languages[l].entities[e]),
            Slot::Feature(l, e, f) => {
                let owner = &self.languages[l].entities[e];
                Element::Feature {
                    owner,
                    feature: &owner.features()[f],
                }
            }
            Slot::Literal(l, e, i) => match &self.languages[l].entities[e] {
                Entity::Enumeration(enumeration) => Element::Literal {
                    enumeration,
                    literal: &enumeration.literals[i],
                },
                _ => return None,
            },
        })
    }

    pub fn entity(&self, pointer: &MetaPointer) -> Option<&Entity> {
        match self.resolve(pointer)? {
            Element::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn feature(&self, pointer: &MetaPointer) -> Option<&Feature> {
        match self.resolve(pointer)? {
            Element::Feature { feature, .. } => Some(feature),
            _ => None,
        }
    }

    /// All features of a classifier: supertypes first (super-concept, then
    /// interfaces in declaration order), then local ones.
    pub fn all_features(&self, classifier: &MetaPointer) -> Option<Vec<FeatureRef<'_>>> {
        let pointers = self.features.get(classifier)?;
        Some(
            pointers
                .iter()
                .filter_map(|pointer| {
                    self.feature(pointer)
                        .map(|feature| FeatureRef { pointer, feature })
                })
                .collect(),
        )
    }

    /// Looks up a feature only if the classifier has it (directly or inherited).
    pub fn feature_of(&self, classifier: &MetaPointer, feature: &MetaPointer) -> Option<&Feature> {
        if self.feature_sets.get(classifier)?.contains(feature) {
            self.feature(feature)
        } else {
            None
        }
    }

    /// True if `sub` is `sup` or (transitively) extends/implements it.
    pub fn is_subtype(&self, sub: &MetaPointer, sup: &MetaPointer) -> bool {
        sub == sup
            || self
                .ancestors
                .get(sub)
                .is_some_and(|ancestors| ancestors.contains(sup))
    }

    // =========================================================================
    // Construction
    // =========================================================================

    fn build(languages: Vec<Language>) -> Result<Self, SchemaError> {
        let mut language_index = FxHashMap::default();
        for (index, language) in languages.iter().enumerate() {
            if language_index.insert(language.reference(), index).is_some() {
                return Err(SchemaError::DuplicateLanguage {
                    key: language.key.clone(),
                    version: language.version.clone(),
                });
            }
        }

        check_dependencies(&languages, &language_index)?;

        let mut elements = FxHashMap::default();
        for (l, language) in languages.iter().enumerate() {
            let mut keys = FxHashSet::default();
            let mut claim = |key: &str, slot: Slot| -> Result<(), SchemaError> {
                if !keys.insert(key.to_string()) {
                    return Err(SchemaError::DuplicateKey {
                        language: language.key.clone(),
                        key: key.to_string(),
                    });
                }
                elements.insert(language.pointer(key), slot);
                Ok(())
            };

            for (e, entity) in language.entities.iter().enumerate() {
                claim(entity.key(), Slot::Entity(l, e))?;
                for (f, feature) in entity.features().iter().enumerate() {
                    claim(&feature.key, Slot::Feature(l, e, f))?;
                }
                if let Entity::Enumeration(enumeration) = entity {
                    for (i, literal) in enumeration.literals.iter().enumerate() {
                        claim(&literal.key, Slot::Literal(l, e, i))?;
                    }
                }
            }
        }

        let mut registry = Self {
            languages,
            language_index,
            elements,
            features: FxHashMap::default(),
            feature_sets: FxHashMap::default(),
            ancestors: FxHashMap::default(),
        };
        registry.check_type_pointers()?;
        registry.check_inheritance_cycles()?;
        registry.index_features()?;

        log::debug!(
            languages = registry.languages.len(),
            elements = registry.elements.len();
            "Built language registry"
        );
        Ok(registry)
    }

    fn check_type_pointers(&self) -> Result<(), SchemaError> {
        for language in &self.languages {
            for entity in &language.entities {
                let element = format!("{}#{}", language.reference(), entity.name());
                match entity {
                    Entity::Concept(concept) => {
                        if let Some(extends) = &concept.extends {
                            self.expect_kind(&element, extends, "super-concept", "a concept", |e| {
                                matches!(e, Entity::Concept(_))
                            })?;
                        }
                        for interface in &concept.implements {
                            self.expect_interface(&element, interface)?;
                        }
                    }
                    Entity::Annotation(annotation) => {
                        if let Some(extends) = &annotation.extends {
                            self.expect_kind(&element, extends, "super-annotation", "an annotation", |e| {
                                matches!(e, Entity::Annotation(_))
                            })?;
                        }
                        for interface in &annotation.implements {
                            self.expect_interface(&element, interface)?;
                        }
                        if let Some(annotates) = &annotation.annotates {
                            self.expect_kind(&element, annotates, "annotated type", "a classifier", Entity::is_classifier)?;
                        }
                    }
                    Entity::Interface(interface) => {
                        for extends in &interface.extends {
                            self.expect_interface(&element, extends)?;
                        }
                    }
                    Entity::Enumeration(_) | Entity::PrimitiveType(_) => {}
                }

                for feature in entity.features() {
                    let element = format!("{}.{}", element, feature.name);
                    match &feature.kind {
                        FeatureKind::Property { ty } => {
                            self.expect_kind(&element, ty, "property type", "a data type", Entity::is_data_type)?;
                        }
                        FeatureKind::Containment { ty, .. } | FeatureKind::Reference { ty, .. } => {
                            self.expect_kind(&element, ty, "link type", "a classifier", Entity::is_classifier)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn expect_interface(&self, element: &str, pointer: &MetaPointer) -> Result<(), SchemaError> {
        self.expect_kind(element, pointer, "interface", "an interface", |e| {
            matches!(e, Entity::Interface(_))
        })
    }

    fn expect_kind(
        &self,
        element: &str,
        pointer: &MetaPointer,
        role: &'static str,
        expected: &'static str,
        accept: impl Fn(&Entity) -> bool,
    ) -> Result<(), SchemaError> {
        match self.entity(pointer) {
            None => Err(SchemaError::UnresolvedType {
                element: element.to_string(),
                pointer: pointer.clone(),
            }),
            Some(entity) if !accept(entity) => Err(SchemaError::InvalidSupertype {
                element: element.to_string(),
                pointer: pointer.clone(),
                role,
                expected,
            }),
            Some(_) => Ok(()),
        }
    }

    fn classifier_pointers(&self) -> Vec<MetaPointer> {
        self.languages
            .iter()
            .flat_map(|language| {
                language
                    .entities
                    .iter()
                    .filter(|e| e.is_classifier())
                    .map(|e| language.pointer(e.key()))
            })
            .collect()
    }

    fn check_inheritance_cycles(&self) -> Result<(), SchemaError> {
        // 1 = on the current path, 2 = finished
        let mut state: FxHashMap<MetaPointer, u8> = FxHashMap::default();

        for start in self.classifier_pointers() {
            if state.contains_key(&start) {
                continue;
            }
            let mut path: Vec<MetaPointer> = vec![start.clone()];
            let mut stack: Vec<(MetaPointer, usize)> = vec![(start.clone(), 0)];
            state.insert(start, 1);

            while let Some((current, next)) = stack.last().cloned() {
                let supertypes: Vec<MetaPointer> = self
                    .entity(&current)
                    .map(|e| e.supertypes().into_iter().cloned().collect())
                    .unwrap_or_default();

                if next >= supertypes.len() {
                    state.insert(current, 2);
                    stack.pop();
                    path.pop();
                    continue;
                }
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }

                let sup = supertypes[next].clone();
                match state.get(&sup).copied() {
                    Some(1) => {
                        let begin = path.iter().position(|p| *p == sup).unwrap_or(0);
                        let mut chain: Vec<String> =
                            path[begin..].iter().map(ToString::to_string).collect();
                        chain.push(sup.to_string());
                        return Err(SchemaError::CyclicInheritance { chain });
                    }
                    Some(_) => {}
                    None => {
                        state.insert(sup.clone(), 1);
                        path.push(sup.clone());
                        stack.push((sup, 0));
                    }
                }
            }
        }
        Ok(())
    }

    fn index_features(&mut self) -> Result<(), SchemaError> {
        let mut features = FxHashMap::default();
        let mut ancestors = FxHashMap::default();
        for classifier in self.classifier_pointers() {
            self.collect_features(&classifier, &mut features, &mut ancestors)?;
        }
        self.feature_sets = features
            .iter()
            .map(|(classifier, pointers)| (classifier.clone(), pointers.iter().cloned().collect()))
            .collect();
        self.features = features;
        self.ancestors = ancestors;
        Ok(())
    }

    /// Memoized; inheritance is known to be acyclic at this point.
    fn collect_features(
        &self,
        classifier: &MetaPointer,
        features: &mut FxHashMap<MetaPointer, Vec<MetaPointer>>,
        ancestors: &mut FxHashMap<MetaPointer, FxHashSet<MetaPointer>>,
    ) -> Result<(), SchemaError> {
        if features.contains_key(classifier) {
            return Ok(());
        }
        let Some(entity) = self.entity(classifier) else {
            return Ok(());
        };

        let mut merged: Vec<MetaPointer> = Vec::new();
        let mut by_key: FxHashMap<String, MetaPointer> = FxHashMap::default();
        let mut all_ancestors = FxHashSet::default();

        let mut push = |pointer: MetaPointer, merged: &mut Vec<MetaPointer>| {
            match by_key.get(&pointer.key) {
                Some(existing) if *existing == pointer => Ok(()),
                Some(_) => Err(SchemaError::DuplicateFeatureKey {
                    classifier: classifier.clone(),
                    key: pointer.key.clone(),
                }),
                None => {
                    by_key.insert(pointer.key.clone(), pointer.clone());
                    merged.push(pointer);
                    Ok(())
                }
            }
        };

        for sup in entity.supertypes() {
            self.collect_features(sup, features, ancestors)?;
            for pointer in features.get(sup).cloned().unwrap_or_default() {
                push(pointer, &mut merged)?;
            }
            all_ancestors.insert(sup.clone());
            if let Some(inherited) = ancestors.get(sup) {
                all_ancestors.extend(inherited.iter().cloned());
            }
        }

        for feature in entity.features() {
            let pointer = MetaPointer::new(
                classifier.language.clone(),
                classifier.version.clone(),
                feature.key.clone(),
            );
            push(pointer, &mut merged)?;
        }

        features.insert(classifier.clone(), merged);
        ancestors.insert(classifier.clone(), all_ancestors);
        Ok(())
    }
}

fn check_dependencies(
    languages: &[Language],
    index: &FxHashMap<LanguageRef, usize>,
) -> Result<(), SchemaError> {
    for language in languages {
        for dependency in &language.depends_on {
            if !index.contains_key(dependency) {
                return Err(SchemaError::MissingDependency {
                    language: language.reference().to_string(),
                    key: dependency.key.clone(),
                    version: dependency.version.clone(),
                });
            }
        }
    }

    // 0 = unvisited, 1 = on the current path, 2 = finished
    let mut state = vec![0u8; languages.len()];
    for start in 0..languages.len() {
        if state[start] != 0 {
            continue;
        }
        let mut path = vec![start];
        let mut stack = vec![(start, 0usize)];
        state[start] = 1;

        while let Some(&(current, next)) = stack.last() {
            let deps = &languages[current].depends_on;
            if next >= deps.len() {
                state[current] = 2;
                stack.pop();
                path.pop();
                continue;
            }
            if let Some(top) = stack.last_mut() {
                top.1 += 1;
            }

            let dep = index[&deps[next]];
            match state[dep] {
                1 => {
                    let begin = path.iter().position(|&p| p == dep).unwrap_or(0);
                    let mut chain: Vec<String> = path[begin..]
                        .iter()
                        .map(|&i| languages[i].reference().to_string())
                        .collect();
                    chain.push(languages[dep].reference().to_string());
                    return Err(SchemaError::CyclicDependency { chain });
                }
                2 => {}
                _ => {
                    state[dep] = 1;
                    path.push(dep);
                    stack.push((dep, 0));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{builtins, Concept, Interface, LanguageBuilder, Multiplicity};

    fn files() -> Language {
        LanguageBuilder::new("Files", "files", "1")
            .concept("Node", |c| c.abstract_concept().implements(builtins::inamed()))
            .concept("Folder", |c| {
                c.extends("Node")
                    .containment("items", "Node", Multiplicity::ZeroOrMore)
            })
            .concept("File", |c| {
                c.extends("Node")
                    .optional_property("size", builtins::integer())
                    .reference("link", "Node", Multiplicity::Optional)
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_resolve_by_meta_pointer() {
        let registry = LanguageRegistry::new([files()]).unwrap();

        let folder = MetaPointer::new("files", "1", "files-Folder");
        assert!(matches!(registry.resolve(&folder), Some(Element::Entity(Entity::Concept(_)))));

        let items = MetaPointer::new("files", "1", "files-Folder-items");
        assert!(registry.feature(&items).is_some_and(Feature::is_containment));

        assert!(registry.resolve(&MetaPointer::new("files", "2", "files-Folder")).is_none());
        assert!(registry.entity(&builtins::string()).is_some());
    }

    #[test]
    fn test_all_features_super_first() {
        let registry = LanguageRegistry::new([files()]).unwrap();
        let file = MetaPointer::new("files", "1", "files-File");
        let names: Vec<_> = registry
            .all_features(&file)
            .unwrap()
            .iter()
            .map(|f| f.feature.name.as_str())
            .collect();
        assert_eq!(names, ["name", "size", "link"]);

        let name = builtins::inamed_name();
        assert!(registry.feature_of(&file, &name).is_some());
        let items = MetaPointer::new("files", "1", "files-Folder-items");
        assert!(registry.feature_of(&file, &items).is_none());
    }

    #[test]
    fn test_feature_of_matches_all_features() {
        let mut registry = LanguageRegistry::new([files()]).unwrap();
        let extra = LanguageBuilder::new("Extra", "extra", "1")
            .concept("Link", |c| c.reference("target", builtins::inamed(), Multiplicity::Single))
            .build()
            .unwrap();
        registry.register(extra).unwrap();

        let classifiers = [
            MetaPointer::new("files", "1", "files-Folder"),
            MetaPointer::new("files", "1", "files-File"),
            MetaPointer::new("extra", "1", "extra-Link"),
            builtins::inamed(),
        ];
        for classifier in &classifiers {
            for feature in registry.all_features(classifier).unwrap() {
                assert_eq!(registry.feature_of(classifier, feature.pointer), Some(feature.feature));
            }
        }

        let target = MetaPointer::new("extra", "1", "extra-Link-target");
        assert!(registry.feature_of(&classifiers[2], &target).is_some());
        assert!(registry.feature_of(&classifiers[0], &target).is_none());
        assert!(registry
            .feature_of(&MetaPointer::new("extra", "1", "extra-Missing"), &target)
            .is_none());
    }

    #[test]
    fn test_is_subtype() {
        let registry = LanguageRegistry::new([files()]).unwrap();
        let file = MetaPointer::new("files", "1", "files-File");
        let node = MetaPointer::new("files", "1", "files-Node");
        assert!(registry.is_subtype(&file, &node));
        assert!(registry.is_subtype(&file, &builtins::inamed()));
        assert!(!registry.is_subtype(&node, &file));
    }

    #[test]
    fn test_duplicate_inherited_feature_key() {
        let mut language = Language::new("L", "l", "1");
        let ty = builtins::string();
        language.entities = vec![
            Entity::Interface(Interface {
                key: "a".into(),
                name: "A".into(),
                extends: vec![],
                features: vec![Feature::property("shared", "x", ty.clone(), true)],
            }),
        ];
        let mut other = Language::new("M", "m", "1");
        other.entities = vec![
            Entity::Interface(Interface {
                key: "b".into(),
                name: "B".into(),
                extends: vec![],
                features: vec![Feature::property("shared", "y", ty, true)],
            }),
            Entity::Concept(Concept {
                key: "c".into(),
                name: "C".into(),
                implements: vec![
                    MetaPointer::new("l", "1", "a"),
                    MetaPointer::new("m", "1", "b"),
                ],
                ..Default::default()
            }),
        ];
        other.depends_on.push(language.reference());

        let result = LanguageRegistry::new([language, other]);
        assert!(matches!(result, Err(SchemaError::DuplicateFeatureKey { ref key, .. }) if key == "shared"));
    }

    #[test]
    fn test_diamond_interfaces_share_feature() {
        let language = LanguageBuilder::new("L", "l", "1")
            .interface("Base", |i| i.optional_property("tag", builtins::string()))
            .interface("Left", |i| i.extends("Base"))
            .interface("Right", |i| i.extends("Base"))
            .concept("Both", |c| c.implements("Left").implements("Right"))
            .build()
            .unwrap();
        let registry = LanguageRegistry::new([language]).unwrap();
        let both = MetaPointer::new("l", "1", "l-Both");
        assert_eq!(registry.all_features(&both).unwrap().len(), 1);
    }

    #[test]
    fn test_cyclic_dependency_rejected() {
        let mut a = Language::new("A", "a", "1");
        let mut b = Language::new("B", "b", "1");
        a.depends_on.push(b.reference());
        b.depends_on.push(a.reference());

        let result = LanguageRegistry::new([a, b]);
        assert!(matches!(result, Err(SchemaError::CyclicDependency { .. })));
    }

    #[test]
    fn test_register_cycle_leaves_registry_unchanged() {
        let a = Language::new("A", "a", "1");
        let mut registry = LanguageRegistry::new([a.clone()]).unwrap();

        let mut b = Language::new("B", "b", "1");
        b.depends_on.push(a.reference());
        registry.register(b.clone()).unwrap();

        let mut a2 = a.clone();
        a2.version = "2".into();
        a2.depends_on.push(b.reference());
        // a@2 -> b@1 -> a@1 is fine; a self-loop is not
        registry.register(a2).unwrap();

        let mut c = Language::new("C", "c", "1");
        c.depends_on.push(LanguageRef::new("c", "1"));
        let before = registry.languages().len();
        assert!(matches!(
            registry.register(c),
            Err(SchemaError::CyclicDependency { .. })
        ));
        assert_eq!(registry.languages().len(), before);
    }

    #[test]
    fn test_missing_dependency() {
        let mut a = Language::new("A", "a", "1");
        a.depends_on.push(LanguageRef::new("zzz", "1"));
        assert!(matches!(
            LanguageRegistry::new([a]),
            Err(SchemaError::MissingDependency { .. })
        ));
    }

    #[test]
    fn test_cyclic_inheritance_rejected() {
        let result = LanguageBuilder::new("L", "l", "1")
            .concept("A", |c| c.extends("B"))
            .concept("B", |c| c.extends("A"))
            .build()
            .map(|language| LanguageRegistry::new([language]));
        assert!(matches!(result, Ok(Err(SchemaError::CyclicInheritance { .. }))));
    }

    #[test]
    fn test_unresolved_type_pointer() {
        let language = LanguageBuilder::new("L", "l", "1")
            .concept("A", |c| c.optional_property("p", MetaPointer::new("x", "1", "y")))
            .build()
            .unwrap();
        assert!(matches!(
            LanguageRegistry::new([language]),
            Err(SchemaError::UnresolvedType { .. })
        ));
    }

    #[test]
    fn test_property_must_be_data_type() {
        let language = LanguageBuilder::new("L", "l", "1")
            .concept("A", |c| c.property("p", "A"))
            .build()
            .unwrap();
        assert!(matches!(
            LanguageRegistry::new([language]),
            Err(SchemaError::InvalidSupertype { role: "property type", .. })
        ));
    }

    #[test]
    fn test_duplicate_language() {
        let a = Language::new("A", "a", "1");
        assert!(matches!(
            LanguageRegistry::new([a.clone(), a]),
            Err(SchemaError::DuplicateLanguage { .. })
        ));
    }
}
