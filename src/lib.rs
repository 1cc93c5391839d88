//! Singleton component wiring by constructor injection, resolved as a fixed point.
//!
//! # Simple use case
//!
//! ```
//! # use std::sync::Arc;
//! # use ikebana::*;
//! // Define traits and implementors
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! #[derive(Default)]
//! struct English;
//!
//! impl Greeter for English {
//!     fn greet(&self) -> String {
//!         "Hello world".to_string()
//!     }
//! }
//!
//! struct Herald {
//!     greeter: Arc<dyn Greeter>,
//! }
//!
//! impl Herald {
//!     fn new(greeter: Arc<dyn Greeter>) -> Self {
//!         Self { greeter }
//!     }
//! }
//!
//! # fn main() -> Result<(), WiringError> {
//! // Describe the components: what they provide and how to build them
//! let context = Context::from_descriptors([
//!     ComponentDescriptor::of::<Herald>()
//!         .constructor(constructor!(Herald::new, dyn Greeter))
//!         .build(),
//!     ComponentDescriptor::of::<English>()
//!         .implements::<dyn Greeter>(|it| it)
//!         .constructor(constructor!(English::default))
//!         .build(),
//! ]);
//!
//! context.init()?;
//! let herald: Arc<Herald> = context.get("herald").and_then(|bean| bean.get()).unwrap();
//! assert_eq!(herald.greeter.greet(), "Hello world");
//! # Ok(())
//! # }
//! ```
//!
//! # Mechanism
//!
//! Each [ComponentDescriptor] lists the types its instances can be injected as (their own concrete
//! type and the trait objects declared with ```implements```) and one or more constructors,
//! each with the ordered list of the types it requires.
//!
//! * The [Discovery] trait produces the descriptors of a namespace. [StaticDiscovery] collects
//!   the descriptor functions registered with the [component!] macro below a module path.
//! * The [Resolver] sweeps the pending descriptors until all of them are built. For each
//!   descriptor, the constructor with the most parameters that can be satisfied by already
//!   built components is used. A sweep without progress means that the remaining components
//!   form a cycle or depend on a type that nothing provides.
//! * The [Registry] stores each instance once, under the bean name derived from its type name
//!   (```UserService``` is registered as ```userService```).
//! * The [Context] combines these steps and exposes the frozen registry after ```init```.

mod context;
mod descriptor;
mod discovery;
mod helpers;
mod registry;
mod resolve;

pub use context::Context;
pub use descriptor::{
    ArgumentError, Arguments, BoxError, ComponentDescriptor, Constructor, ConstructorSignature,
    DescriptorBuilder, Erased, Stereotype, TypeKey,
};
pub use discovery::{Discovery, FixedDiscovery, Registration, StaticDiscovery};
pub use helpers::{bean_name, simple_name};
pub use registry::{Bean, Registry};
pub use resolve::{
    Ambiguity, CandidateSet, Instantiator, Invoke, NameCollision, Resolution, Resolver,
    ResolverConfig, Unresolved, WiringError,
};

#[doc(hidden)]
pub use inventory;
