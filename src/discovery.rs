//! Discovery of the candidate components of a namespace
//!
//! Components are registered at link time with the [component!](crate::component) macro,
//! which records the module path of the registration. [StaticDiscovery] collects the
//! registrations below a base module path.

use tracing::debug;

use crate::descriptor::{BoxError, ComponentDescriptor};

/// Produce the component descriptors of a namespace
pub trait Discovery {
    fn discover(&self, base_package: &str) -> Result<Vec<ComponentDescriptor>, BoxError>;
}

/// Link-time registration of a component descriptor
pub struct Registration {
    module_path: &'static str,
    describe: fn() -> ComponentDescriptor,
}

impl Registration {
    pub const fn new(module_path: &'static str, describe: fn() -> ComponentDescriptor) -> Self {
        Self {
            module_path,
            describe,
        }
    }

    pub fn module_path(&self) -> &'static str {
        self.module_path
    }

    pub fn describe(&self) -> ComponentDescriptor {
        (self.describe)()
    }

    /// Whether the registration lives in `base_package` or one of its submodules.
    ///
    /// An empty base package matches every registration.
    pub fn is_within(&self, base_package: &str) -> bool {
        base_package.is_empty()
            || self
                .module_path
                .strip_prefix(base_package)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
    }
}

inventory::collect!(Registration);

/// Discover the components registered with [component!](crate::component)
///
/// Descriptors are ordered by module path then type name, independently of link order.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticDiscovery;

impl Discovery for StaticDiscovery {
    fn discover(&self, base_package: &str) -> Result<Vec<ComponentDescriptor>, BoxError> {
        let mut found: Vec<(&'static str, ComponentDescriptor)> = inventory::iter::<Registration>
            .into_iter()
            .filter(|reg| reg.is_within(base_package))
            .map(|reg| (reg.module_path(), reg.describe()))
            .collect();
        found.sort_by(|(a_path, a), (b_path, b)| {
            a_path
                .cmp(b_path)
                .then_with(|| a.type_name().cmp(b.type_name()))
        });
        debug!(
            base_package,
            components = found.len(),
            "Discovered registered components"
        );
        Ok(found.into_iter().map(|(_, descriptor)| descriptor).collect())
    }
}

/// A fixed list of descriptors, returned for any namespace
#[derive(Debug, Clone, Default)]
pub struct FixedDiscovery(Vec<ComponentDescriptor>);

impl FixedDiscovery {
    pub fn new(descriptors: impl IntoIterator<Item = ComponentDescriptor>) -> Self {
        Self(descriptors.into_iter().collect())
    }
}

impl Discovery for FixedDiscovery {
    fn discover(&self, _base_package: &str) -> Result<Vec<ComponentDescriptor>, BoxError> {
        Ok(self.0.clone())
    }
}
