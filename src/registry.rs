//! Constructed singletons and their lookup by bean name

use std::fmt;
use std::sync::Arc;

use indexmap::map::{Entry, IndexMap};

use crate::descriptor::{ComponentDescriptor, Erased, Stereotype, TypeKey};

/// A constructed component instance.
///
/// The instance is shared: every view returned by [Bean::get] points to the same allocation.
#[derive(Clone)]
pub struct Bean {
    name: String,
    type_key: TypeKey,
    stereotype: Stereotype,
    origin: usize,
    instance: Erased,
    views: Vec<(TypeKey, Erased)>,
}

impl Bean {
    /// Wrap a freshly built instance, precomputing one view per declared capability.
    ///
    /// Returns None if the instance is not of the descriptor's concrete type.
    pub(crate) fn new(
        name: String,
        origin: usize,
        descriptor: &ComponentDescriptor,
        instance: Erased,
    ) -> Option<Self> {
        if (*instance).type_id() != descriptor.identity().id() {
            return None;
        }
        let views = descriptor
            .capabilities()
            .iter()
            .map(|c| Some((c.key, (c.upcast)(&instance)?)))
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            name,
            type_key: descriptor.identity(),
            stereotype: descriptor.stereotype(),
            origin,
            instance,
            views,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }

    pub fn type_name(&self) -> &'static str {
        self.type_key.name()
    }

    pub fn stereotype(&self) -> Stereotype {
        self.stereotype
    }

    /// Position of the descriptor in the candidate set
    pub(crate) fn origin(&self) -> usize {
        self.origin
    }

    /// Capability query: can this bean be injected where `required` is expected?
    pub fn satisfies(&self, required: &TypeKey) -> bool {
        self.views.iter().any(|(key, _)| key == required)
    }

    pub(crate) fn view(&self, required: &TypeKey) -> Option<&Erased> {
        self.views
            .iter()
            .find(|(key, _)| key == required)
            .map(|(_, view)| view)
    }

    /// Obtain the bean as its concrete type or as one of its declared trait objects.
    ///
    /// Returns None if the bean does not provide the requested type.
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.view(&TypeKey::of::<T>())?
            .downcast_ref::<Arc<T>>()
            .cloned()
    }

    /// The raw instance, downcastable to the concrete component type
    pub fn instance(&self) -> &Erased {
        &self.instance
    }
}

impl fmt::Debug for Bean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bean")
            .field("name", &self.name)
            .field("type", &self.type_key)
            .field("stereotype", &self.stereotype)
            .field(
                "provides",
                &self.views.iter().map(|(key, _)| key).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Insertion-ordered mapping from bean name to constructed instance
#[derive(Default, Debug)]
pub struct Registry {
    beans: IndexMap<String, Bean>,
}

impl Registry {
    pub fn get(&self, name: &str) -> Option<&Bean> {
        self.beans.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.beans.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.beans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beans.is_empty()
    }

    /// Bean names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.beans.keys().map(String::as_str)
    }

    /// Beans in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Bean> + '_ {
        self.beans.values()
    }

    /// Store a bean under its name, returning the bean it replaced if any.
    ///
    /// A replaced bean keeps its position in the registration order.
    pub(crate) fn insert(&mut self, bean: Bean) -> Option<Bean> {
        match self.beans.entry(bean.name.clone()) {
            Entry::Occupied(mut o) => Some(o.insert(bean)),
            Entry::Vacant(v) => {
                v.insert(bean);
                None
            }
        }
    }
}
