//! Dependency tokens
//!
//! A token is either a nominal key (`"Database"`) compared by value, or a
//! constructor identity ([`Class`]) compared by `TypeId`.

use crate::class::{Class, Constructor};
use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// `TypeId` plus the type's name for diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key for type `T`
    #[inline]
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Identifier used to request a dependency.
///
/// # Examples
///
/// ```rust
/// use di_engine::Token;
///
/// let a = Token::from("Database");
/// let b = Token::from(String::from("Database"));
/// assert_eq!(a, b);
/// assert!(a.is_name());
/// ```
#[derive(Clone)]
pub enum Token {
    /// Nominal key, equal by value
    Name(Arc<str>),
    /// Constructor used as its own token, equal by identity
    Class(Class),
}

impl Token {
    /// Constructor token for `T`
    #[inline]
    pub fn of<T: Constructor>() -> Self {
        Token::Class(Class::of::<T>())
    }

    /// Deferred-construction placeholder for `T`
    #[inline]
    pub fn delayed<T: Constructor>() -> Self {
        Token::Class(Class::delayed::<T>())
    }

    /// Whether this is a plain identifier (cannot self-construct)
    #[inline]
    pub fn is_name(&self) -> bool {
        matches!(self, Token::Name(_))
    }

    /// The constructor behind this token, if any
    #[inline]
    pub fn as_class(&self) -> Option<&Class> {
        match self {
            Token::Class(class) => Some(class),
            Token::Name(_) => None,
        }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Token::Name(a), Token::Name(b)) => a == b,
            (Token::Class(a), Token::Class(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Token::Name(name) => {
                0u8.hash(state);
                name.hash(state);
            }
            Token::Class(class) => {
                1u8.hash(state);
                class.hash(state);
            }
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Name(name) => f.write_str(name),
            Token::Class(class) => f.write_str(class.name()),
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Token::Class(class) => f.debug_tuple("Class").field(&class.name()).finish(),
        }
    }
}

impl From<&str> for Token {
    #[inline]
    fn from(name: &str) -> Self {
        Token::Name(Arc::from(name))
    }
}

impl From<String> for Token {
    #[inline]
    fn from(name: String) -> Self {
        Token::Name(Arc::from(name))
    }
}

impl From<Arc<str>> for Token {
    #[inline]
    fn from(name: Arc<str>) -> Self {
        Token::Name(name)
    }
}

impl From<Class> for Token {
    #[inline]
    fn from(class: Class) -> Self {
        Token::Class(class)
    }
}

impl From<&Token> for Token {
    #[inline]
    fn from(token: &Token) -> Self {
        token.clone()
    }
}
