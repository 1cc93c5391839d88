//! Component metadata consumed by the resolver
//!
//! A [ComponentDescriptor] names a concrete type, the capabilities it satisfies and the
//! constructors that can build it. Capabilities replace runtime reflection: each descriptor
//! lists the types a built instance can be injected as, always including its own concrete type.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use thiserror::Error;

use crate::helpers::simple_name;

/// Type-erased shared value
pub type Erased = Arc<dyn Any + Send + Sync>;

/// Boxed error returned by constructors, instantiators and discovery
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

type Upcast = Arc<dyn Fn(&Erased) -> Option<Erased> + Send + Sync>;
type Invoke = Arc<dyn Fn(Arguments) -> Result<Erased, BoxError> + Send + Sync>;

/// Nominal identity of a concrete type or trait object.
///
/// Equality and hashing only consider the [TypeId], the name is kept for reporting.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last path segment of the type name, without generic arguments
    pub fn simple_name(&self) -> &'static str {
        simple_name(self.name)
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Role marker of a component, reported in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stereotype {
    #[default]
    Component,
    Service,
    Repository,
    Configuration,
}

impl fmt::Display for Stereotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stereotype::Component => "component",
            Stereotype::Service => "service",
            Stereotype::Repository => "repository",
            Stereotype::Configuration => "configuration",
        };
        f.write_str(label)
    }
}

/// Errors raised while handing injected values to a constructor
#[derive(Error, Debug)]
pub enum ArgumentError {
    #[error("Missing constructor argument at position {position}")]
    Missing { position: usize },
    #[error("Constructor argument at position {position} is not a `{expected}`")]
    TypeMismatch {
        position: usize,
        expected: &'static str,
    },
}

/// Ordered dependencies injected into a constructor
pub struct Arguments {
    values: std::vec::IntoIter<Erased>,
    position: usize,
}

impl Arguments {
    pub(crate) fn new(values: Vec<Erased>) -> Self {
        Self {
            values: values.into_iter(),
            position: 0,
        }
    }

    /// Take the next argument as a shared instance of the requested type.
    ///
    /// The requested type must match the parameter type declared at this position,
    /// either a concrete component type or one of its declared trait objects.
    pub fn inject<T: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Arc<T>, ArgumentError> {
        let position = self.position;
        self.position += 1;
        let value = self
            .values
            .next()
            .ok_or(ArgumentError::Missing { position })?;
        value
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or(ArgumentError::TypeMismatch {
                position,
                expected: type_name::<T>(),
            })
    }

    /// Number of arguments not consumed yet
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

/// Typed constructor of a component, usually created with [constructor!](crate::constructor)
pub struct Constructor<C> {
    parameters: Vec<TypeKey>,
    invoke: Box<dyn Fn(&mut Arguments) -> Result<C, BoxError> + Send + Sync>,
}

impl<C: Send + Sync + 'static> Constructor<C> {
    pub fn new<F>(parameters: Vec<TypeKey>, invoke: F) -> Self
    where
        F: Fn(&mut Arguments) -> Result<C, BoxError> + Send + Sync + 'static,
    {
        Self {
            parameters,
            invoke: Box::new(invoke),
        }
    }

    fn erase(self) -> ConstructorSignature {
        let Constructor { parameters, invoke } = self;
        ConstructorSignature {
            parameters,
            invoke: Arc::new(move |mut args: Arguments| -> Result<Erased, BoxError> {
                let instance: Erased = Arc::new(invoke(&mut args)?);
                Ok(instance)
            }),
        }
    }
}

/// Type-erased constructor: parameter types and the call building the instance
#[derive(Clone)]
pub struct ConstructorSignature {
    parameters: Vec<TypeKey>,
    invoke: Invoke,
}

impl ConstructorSignature {
    pub fn parameter_types(&self) -> &[TypeKey] {
        &self.parameters
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Build a new instance from a complete argument list
    pub fn invoke(&self, args: Arguments) -> Result<Erased, BoxError> {
        (self.invoke)(args)
    }
}

impl fmt::Debug for ConstructorSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorSignature")
            .field("parameters", &self.parameters)
            .field("invoke", &"<function>")
            .finish()
    }
}

#[derive(Clone)]
pub(crate) struct Capability {
    pub(crate) key: TypeKey,
    pub(crate) upcast: Upcast,
}

/// Immutable metadata of a component eligible for automatic construction
#[derive(Clone)]
pub struct ComponentDescriptor {
    identity: TypeKey,
    stereotype: Stereotype,
    capabilities: Vec<Capability>,
    constructors: Vec<ConstructorSignature>,
}

impl ComponentDescriptor {
    /// Start describing the concrete component type `C`
    pub fn of<C: Send + Sync + 'static>() -> DescriptorBuilder<C> {
        let concrete: Upcast = Arc::new(|instance: &Erased| -> Option<Erased> {
            let concrete = instance.clone().downcast::<C>().ok()?;
            let view: Erased = Arc::new(concrete);
            Some(view)
        });
        DescriptorBuilder {
            descriptor: ComponentDescriptor {
                identity: TypeKey::of::<C>(),
                stereotype: Stereotype::default(),
                capabilities: vec![Capability {
                    key: TypeKey::of::<C>(),
                    upcast: concrete,
                }],
                constructors: Vec::new(),
            },
            _component: PhantomData,
        }
    }

    pub fn identity(&self) -> TypeKey {
        self.identity
    }

    pub fn type_name(&self) -> &'static str {
        self.identity.name()
    }

    pub fn stereotype(&self) -> Stereotype {
        self.stereotype
    }

    /// Constructors in declaration order
    pub fn constructors(&self) -> &[ConstructorSignature] {
        &self.constructors
    }

    /// Constructors from most to fewest parameters, ties in declaration order
    pub fn constructors_by_specificity(&self) -> Vec<&ConstructorSignature> {
        let mut ordered: Vec<&ConstructorSignature> = self.constructors.iter().collect();
        ordered.sort_by(|a, b| b.arity().cmp(&a.arity()));
        ordered
    }

    /// Types an instance of this component can be injected as
    pub fn provided_types(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.capabilities.iter().map(|c| c.key)
    }

    pub fn provides(&self, required: &TypeKey) -> bool {
        self.capabilities.iter().any(|c| &c.key == required)
    }

    pub(crate) fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("identity", &self.identity)
            .field("stereotype", &self.stereotype)
            .field("provides", &self.provided_types().collect::<Vec<_>>())
            .field("constructors", &self.constructors)
            .finish()
    }
}

/// Typed builder ensuring that capabilities and constructors match the component type
pub struct DescriptorBuilder<C> {
    descriptor: ComponentDescriptor,
    _component: PhantomData<fn() -> C>,
}

impl<C: Send + Sync + 'static> DescriptorBuilder<C> {
    pub fn stereotype(mut self, stereotype: Stereotype) -> Self {
        self.descriptor.stereotype = stereotype;
        self
    }

    /// Declare that the component can be injected where `I` is required.
    ///
    /// The upcast is usually the identity closure, relying on unsized coercion:
    /// ```ignore
    /// ComponentDescriptor::of::<MemoryRepo>().implements::<dyn Repo>(|it| it)
    /// ```
    pub fn implements<I>(mut self, upcast: fn(Arc<C>) -> Arc<I>) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let key = TypeKey::of::<I>();
        if self.descriptor.provides(&key) {
            return self;
        }
        let upcast: Upcast = Arc::new(move |instance: &Erased| -> Option<Erased> {
            let concrete = instance.clone().downcast::<C>().ok()?;
            let view: Erased = Arc::new(upcast(concrete));
            Some(view)
        });
        self.descriptor.capabilities.push(Capability { key, upcast });
        self
    }

    pub fn constructor(mut self, constructor: Constructor<C>) -> Self {
        self.descriptor.constructors.push(constructor.erase());
        self
    }

    pub fn build(self) -> ComponentDescriptor {
        self.descriptor
    }
}

impl<C: Send + Sync + 'static> From<DescriptorBuilder<C>> for ComponentDescriptor {
    fn from(builder: DescriptorBuilder<C>) -> Self {
        builder.build()
    }
}
