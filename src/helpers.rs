/// Last path segment of a type name, without generic arguments.
///
/// `my_app::repo::MemoryRepo<u32>` becomes `MemoryRepo`.
pub fn simple_name(type_name: &str) -> &str {
    let base = match type_name.find('<') {
        Some(idx) => &type_name[..idx],
        None => type_name,
    };
    base.rsplit("::").next().unwrap_or(base)
}

/// Derive the bean name of a component from its simple type name.
///
/// Only the first character is lower-cased: `UserService` becomes `userService`.
pub fn bean_name(simple_name: &str) -> String {
    let mut chars = simple_name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Build a [Constructor](crate::Constructor) from an infallible constructor function.
///
/// Each listed parameter type is injected in order as an ```Arc<$param>```,
/// where ```$param``` is either a component type or a declared trait object.
///
/// ```ignore
/// constructor!(Facade::new, Svc, dyn Repo)
/// ```
#[macro_export]
macro_rules! constructor {
    ($ctor:expr $(, $param:ty)*) => {
        $crate::Constructor::new(
            vec![$($crate::TypeKey::of::<$param>()),*],
            |_args: &mut $crate::Arguments| Ok($ctor($(_args.inject::<$param>()?),*)),
        )
    };
}

/// Build a [Constructor](crate::Constructor) from a constructor function returning a ```Result```.
///
/// Errors returned by the function abort the resolution as construction faults.
#[macro_export]
macro_rules! try_constructor {
    ($ctor:expr $(, $param:ty)*) => {
        $crate::Constructor::new(
            vec![$($crate::TypeKey::of::<$param>()),*],
            |_args: &mut $crate::Arguments| {
                $ctor($(_args.inject::<$param>()?),*).map_err(::core::convert::Into::into)
            },
        )
    };
}

/// Register a descriptor function for [StaticDiscovery](crate::StaticDiscovery).
///
/// The registration is tagged with the module path of the invocation site,
/// which is matched against the base package of a [Context](crate::Context).
#[macro_export]
macro_rules! component {
    ($($describe:path),+ $(,)?) => {
        $(
        $crate::inventory::submit! {
            $crate::Registration::new(module_path!(), $describe)
        }
        )+
    };
}
