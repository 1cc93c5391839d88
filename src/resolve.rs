//! Fixed-point resolution of a candidate set
//!
//! The [Resolver] repeatedly sweeps the pending descriptors, building every component whose
//! constructor dependencies are already registered. Each pass either builds at least one
//! component or ends the resolution: a pass without progress means that the remaining
//! components are part of a cycle or depend on a type that no candidate provides.
//!
//! * The [Instantiator] trait performs the actual construction call.
//! * The [ResolverConfig] selects the policies for ambiguous capabilities and bean name collisions.
//! * The resolved [Registry] is returned by value, so independent resolutions never share state.

use std::collections::HashMap;
use std::fmt;

use indexmap::map::{Entry, IndexMap};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::descriptor::{
    Arguments, BoxError, ComponentDescriptor, ConstructorSignature, Erased, TypeKey,
};
use crate::helpers::bean_name;
use crate::registry::{Bean, Registry};

/// Perform the construction call of a component from its injected arguments
pub trait Instantiator {
    fn instantiate(
        &self,
        descriptor: &ComponentDescriptor,
        signature: &ConstructorSignature,
        args: Arguments,
    ) -> Result<Erased, BoxError>;
}

/// Default instantiator: call the constructor declared in the descriptor
#[derive(Debug, Default, Clone, Copy)]
pub struct Invoke;

impl Instantiator for Invoke {
    fn instantiate(
        &self,
        _descriptor: &ComponentDescriptor,
        signature: &ConstructorSignature,
        args: Arguments,
    ) -> Result<Erased, BoxError> {
        signature.invoke(args)
    }
}

/// Policy when several candidates provide a required type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ambiguity {
    /// Reject the whole graph before building anything
    #[default]
    Reject,
    /// Inject the first provider in discovery order, waiting for it to be built
    DiscoveryOrder,
}

/// Policy when two components derive the same bean name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameCollision {
    /// Reject the whole graph before building anything
    #[default]
    Reject,
    /// The component built last replaces the earlier one
    Overwrite,
}

/// Resolution policies
#[derive(Debug, Clone, Default)]
pub struct ResolverConfig {
    pub ambiguity: Ambiguity,
    pub name_collision: NameCollision,
}

impl ResolverConfig {
    pub fn with_ambiguity(mut self, ambiguity: Ambiguity) -> Self {
        self.ambiguity = ambiguity;
        self
    }

    pub fn with_name_collision(mut self, name_collision: NameCollision) -> Self {
        self.name_collision = name_collision;
        self
    }
}

/// Descriptors to resolve, in discovery order and without duplicates
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    descriptors: IndexMap<TypeKey, ComponentDescriptor>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor.
    ///
    /// Returns false if a descriptor with the same identity was already present,
    /// in which case the first one is kept.
    pub fn insert(&mut self, descriptor: ComponentDescriptor) -> bool {
        match self.descriptors.entry(descriptor.identity()) {
            Entry::Occupied(_) => {
                debug!(
                    component = descriptor.type_name(),
                    "Ignoring duplicate component descriptor"
                );
                false
            }
            Entry::Vacant(v) => {
                v.insert(descriptor);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentDescriptor> + '_ {
        self.descriptors.values()
    }
}

impl FromIterator<ComponentDescriptor> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = ComponentDescriptor>>(iter: I) -> Self {
        let mut candidates = Self::new();
        candidates.extend(iter);
        candidates
    }
}

impl Extend<ComponentDescriptor> for CandidateSet {
    fn extend<I: IntoIterator<Item = ComponentDescriptor>>(&mut self, iter: I) {
        for descriptor in iter {
            self.insert(descriptor);
        }
    }
}

/// A component left unbuilt by a failed resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved {
    pub name: String,
    pub type_name: &'static str,
    /// Required types still missing for the constructor closest to being satisfied
    pub missing: Vec<&'static str>,
}

impl fmt::Display for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.missing.is_empty() {
            write!(f, "{} ({}, no constructor)", self.name, self.type_name)
        } else {
            write!(
                f,
                "{} ({}, missing {})",
                self.name,
                self.type_name,
                self.missing.join(", ")
            )
        }
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(T::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors triggered during the autowiring process
#[derive(Error, Debug)]
pub enum WiringError {
    #[error("Cyclic or unsatisfiable dependencies, no progress for: {}", join(.pending))]
    Unresolvable { pending: Vec<Unresolved> },
    #[error("Ambiguous dependency: `{component}` requires `{required}`, provided by {}", .candidates.join(", "))]
    AmbiguousDependency {
        component: &'static str,
        required: &'static str,
        candidates: Vec<&'static str>,
    },
    #[error("Duplicate bean name `{name}` derived from `{existing}` and `{incoming}`")]
    DuplicateName {
        name: String,
        existing: &'static str,
        incoming: &'static str,
    },
    #[error("Failed to construct `{component}`: {source}")]
    Construction {
        component: &'static str,
        source: BoxError,
    },
    #[error("Failed to discover components in `{base_package}`: {source}")]
    Discovery {
        base_package: String,
        source: BoxError,
    },
    #[error("Consistency error: the context is already initialized")]
    AlreadyInitialized,
    #[error("The context is unusable after a failed initialization")]
    Invalidated,
}

impl WiringError {
    /// Bean names of the components left unbuilt, if the graph was unresolvable
    pub fn unresolved_names(&self) -> Option<Vec<&str>> {
        match self {
            WiringError::Unresolvable { pending } => {
                Some(pending.iter().map(|u| u.name.as_str()).collect())
            }
            _ => None,
        }
    }
}

/// Outcome of a successful resolution
#[derive(Debug)]
pub struct Resolution {
    pub registry: Registry,
    /// Number of sweeps over the pending set
    pub passes: usize,
}

/// Providers of each type, as candidate positions in discovery order
type ProviderIndex = HashMap<TypeKey, Vec<usize>>;

/// Fixed-point resolver building every candidate exactly once
pub struct Resolver<'a> {
    instantiator: &'a dyn Instantiator,
    config: &'a ResolverConfig,
}

impl<'a> Resolver<'a> {
    pub fn new(instantiator: &'a dyn Instantiator, config: &'a ResolverConfig) -> Self {
        Self {
            instantiator,
            config,
        }
    }

    pub fn resolve(&self, candidates: &CandidateSet) -> Result<Resolution, WiringError> {
        let descriptors: Vec<&ComponentDescriptor> = candidates.iter().collect();
        let names: Vec<String> = descriptors
            .iter()
            .map(|d| bean_name(d.identity().simple_name()))
            .collect();
        if self.config.name_collision == NameCollision::Reject {
            check_names(&descriptors, &names)?;
        }
        let providers = index_providers(&descriptors);
        if self.config.ambiguity == Ambiguity::Reject {
            check_ambiguity(&descriptors, &providers)?;
        }

        let mut pending: Vec<usize> = (0..descriptors.len()).collect();
        let mut built = vec![false; descriptors.len()];
        let mut registry = Registry::default();
        let mut passes = 0;

        while !pending.is_empty() {
            passes += 1;
            let before = pending.len();
            let mut blocked = Vec::with_capacity(before);

            for index in pending {
                let descriptor = descriptors[index];
                let Some((signature, args)) =
                    self.select(index, descriptor, &registry, &built, &providers)
                else {
                    blocked.push(index);
                    continue;
                };
                let bean = self.construct(index, descriptor, &names[index], signature, args)?;
                built[index] = true;
                if let Some(replaced) = registry.insert(bean) {
                    warn!(
                        name = %names[index],
                        replaced = replaced.type_name(),
                        component = descriptor.type_name(),
                        "Overwriting bean with the same name"
                    );
                }
            }

            pending = blocked;
            debug!(
                pass = passes,
                built = before - pending.len(),
                pending = pending.len(),
                "Resolution pass complete"
            );

            if pending.len() == before {
                let unresolved = pending
                    .iter()
                    .map(|&i| Unresolved {
                        name: names[i].clone(),
                        type_name: descriptors[i].type_name(),
                        missing: self.missing(i, descriptors[i], &registry, &built, &providers),
                    })
                    .collect();
                return Err(WiringError::Unresolvable {
                    pending: unresolved,
                });
            }
        }

        info!(
            components = registry.len(),
            passes, "Dependency graph resolved"
        );
        Ok(Resolution { registry, passes })
    }

    /// Pick the most specific constructor whose parameters are all registered
    fn select<'d>(
        &self,
        consumer: usize,
        descriptor: &'d ComponentDescriptor,
        registry: &Registry,
        built: &[bool],
        providers: &ProviderIndex,
    ) -> Option<(&'d ConstructorSignature, Vec<Erased>)> {
        for signature in descriptor.constructors_by_specificity() {
            let args = signature
                .parameter_types()
                .iter()
                .map(|required| {
                    self.find_argument(consumer, required, registry, built, providers)
                })
                .collect::<Option<Vec<_>>>();
            match args {
                Some(args) => return Some((signature, args)),
                None => trace!(
                    component = descriptor.type_name(),
                    arity = signature.arity(),
                    "Constructor not satisfiable yet"
                ),
            }
        }
        None
    }

    fn find_argument(
        &self,
        consumer: usize,
        required: &TypeKey,
        registry: &Registry,
        built: &[bool],
        providers: &ProviderIndex,
    ) -> Option<Erased> {
        let bean = match self.config.ambiguity {
            Ambiguity::Reject => registry
                .iter()
                .find(|b| b.origin() != consumer && b.satisfies(required)),
            Ambiguity::DiscoveryOrder => {
                // Wait for the first pending provider, skipping the ones replaced by
                // an overwritten bean name
                let mut found = None;
                for &p in providers.get(required)? {
                    if p == consumer {
                        continue;
                    }
                    if !built[p] {
                        return None;
                    }
                    if let Some(bean) = registry.iter().find(|b| b.origin() == p) {
                        found = Some(bean);
                        break;
                    }
                }
                found
            }
        }?;
        bean.view(required).cloned()
    }

    fn construct(
        &self,
        index: usize,
        descriptor: &ComponentDescriptor,
        name: &str,
        signature: &ConstructorSignature,
        args: Vec<Erased>,
    ) -> Result<Bean, WiringError> {
        trace!(
            component = descriptor.type_name(),
            stereotype = %descriptor.stereotype(),
            arity = signature.arity(),
            "Constructing component"
        );
        let instance = self
            .instantiator
            .instantiate(descriptor, signature, Arguments::new(args))
            .map_err(|source| WiringError::Construction {
                component: descriptor.type_name(),
                source,
            })?;
        Bean::new(name.to_owned(), index, descriptor, instance).ok_or_else(|| {
            WiringError::Construction {
                component: descriptor.type_name(),
                source: format!(
                    "instantiator returned a value of another type than `{}`",
                    descriptor.type_name()
                )
                .into(),
            }
        })
    }

    /// Missing types of the constructor closest to being satisfied
    fn missing(
        &self,
        consumer: usize,
        descriptor: &ComponentDescriptor,
        registry: &Registry,
        built: &[bool],
        providers: &ProviderIndex,
    ) -> Vec<&'static str> {
        let mut best: Option<Vec<&'static str>> = None;
        for signature in descriptor.constructors_by_specificity() {
            let missing: Vec<&'static str> = signature
                .parameter_types()
                .iter()
                .filter(|required| {
                    self.find_argument(consumer, required, registry, built, providers)
                        .is_none()
                })
                .map(TypeKey::name)
                .collect();
            if best.as_ref().map_or(true, |b| missing.len() < b.len()) {
                best = Some(missing);
            }
        }
        best.unwrap_or_default()
    }
}

fn index_providers(descriptors: &[&ComponentDescriptor]) -> ProviderIndex {
    let mut providers = ProviderIndex::new();
    for (index, descriptor) in descriptors.iter().enumerate() {
        for key in descriptor.provided_types() {
            providers.entry(key).or_default().push(index);
        }
    }
    providers
}

fn check_names(descriptors: &[&ComponentDescriptor], names: &[String]) -> Result<(), WiringError> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (index, name) in names.iter().enumerate() {
        if let Some(&existing) = seen.get(name.as_str()) {
            return Err(WiringError::DuplicateName {
                name: name.clone(),
                existing: descriptors[existing].type_name(),
                incoming: descriptors[index].type_name(),
            });
        }
        seen.insert(name.as_str(), index);
    }
    Ok(())
}

/// A component is never counted as a provider of its own parameters
fn check_ambiguity(
    descriptors: &[&ComponentDescriptor],
    providers: &ProviderIndex,
) -> Result<(), WiringError> {
    for (index, descriptor) in descriptors.iter().enumerate() {
        for signature in descriptor.constructors() {
            for required in signature.parameter_types() {
                let others: Vec<usize> = providers
                    .get(required)
                    .into_iter()
                    .flatten()
                    .copied()
                    .filter(|&p| p != index)
                    .collect();
                if others.len() > 1 {
                    return Err(WiringError::AmbiguousDependency {
                        component: descriptor.type_name(),
                        required: required.name(),
                        candidates: others
                            .iter()
                            .map(|&p| descriptors[p].type_name())
                            .collect(),
                    });
                }
            }
        }
    }
    Ok(())
}
