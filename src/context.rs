use once_cell::sync::OnceCell;
use tracing::{error, info};

use crate::descriptor::{BoxError, ComponentDescriptor};
use crate::discovery::{Discovery, FixedDiscovery, StaticDiscovery};
use crate::registry::{Bean, Registry};
use crate::resolve::{CandidateSet, Instantiator, Invoke, Resolver, ResolverConfig, WiringError};

enum State {
    Ready(Registry),
    Failed,
}

/// Application context wiring the components of a base package.
///
/// The context is initialized at most once. After a successful [Context::init], the registry
/// is frozen and can be read concurrently. After a failed one, the context stays unusable.
pub struct Context {
    base_package: String,
    discovery: Box<dyn Discovery + Send + Sync>,
    instantiator: Box<dyn Instantiator + Send + Sync>,
    config: ResolverConfig,
    state: OnceCell<State>,
}

impl Context {
    /// Context over the components registered with [component!](crate::component)
    /// in the given module path
    pub fn new(base_package: impl Into<String>) -> Self {
        Self {
            base_package: base_package.into(),
            discovery: Box::new(StaticDiscovery),
            instantiator: Box::new(Invoke),
            config: ResolverConfig::default(),
            state: OnceCell::new(),
        }
    }

    /// Context over an explicit list of descriptors
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = ComponentDescriptor>) -> Self {
        Self::new("").with_discovery(FixedDiscovery::new(descriptors))
    }

    pub fn with_discovery(mut self, discovery: impl Discovery + Send + Sync + 'static) -> Self {
        self.discovery = Box::new(discovery);
        self
    }

    pub fn with_instantiator(
        mut self,
        instantiator: impl Instantiator + Send + Sync + 'static,
    ) -> Self {
        self.instantiator = Box::new(instantiator);
        self
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn base_package(&self) -> &str {
        &self.base_package
    }

    /// Discover, resolve and build all components.
    ///
    /// Return an error if the graph can not be fully built, or if the context was already
    /// initialized. Any failure leaves the context unusable.
    pub fn init(&self) -> Result<(), WiringError> {
        let mut outcome = None;
        self.state.get_or_init(|| match self.wire() {
            Ok(registry) => {
                outcome = Some(Ok(()));
                State::Ready(registry)
            }
            Err(e) => {
                error!(
                    base_package = %self.base_package,
                    error = %e,
                    "Context initialization failed"
                );
                outcome = Some(Err(e));
                State::Failed
            }
        });
        match (outcome, self.state.get()) {
            (Some(result), _) => result,
            (None, Some(State::Failed)) => Err(WiringError::Invalidated),
            (None, _) => Err(WiringError::AlreadyInitialized),
        }
    }

    fn wire(&self) -> Result<Registry, WiringError> {
        let descriptors = self
            .discovery
            .discover(&self.base_package)
            .map_err(|source: BoxError| WiringError::Discovery {
                base_package: self.base_package.clone(),
                source,
            })?;
        let candidates: CandidateSet = descriptors.into_iter().collect();
        let resolution =
            Resolver::new(self.instantiator.as_ref(), &self.config).resolve(&candidates)?;
        info!(
            base_package = %self.base_package,
            components = resolution.registry.len(),
            passes = resolution.passes,
            "Context initialized"
        );
        Ok(resolution.registry)
    }

    /// Whether [Context::init] completed successfully
    pub fn is_ready(&self) -> bool {
        self.registry().is_some()
    }

    /// The frozen registry, once initialized
    pub fn registry(&self) -> Option<&Registry> {
        match self.state.get() {
            Some(State::Ready(registry)) => Some(registry),
            _ => None,
        }
    }

    /// Look up a bean by name.
    ///
    /// Absent before initialization, after a failed initialization, or for unknown names.
    pub fn get(&self, name: &str) -> Option<&Bean> {
        self.registry()?.get(name)
    }
}
