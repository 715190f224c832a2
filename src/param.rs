//! Constructor parameter descriptors and resolved arguments

use crate::class::Constructor;
use crate::{DiError, Injectable, Instance, Result, Token};
use std::fmt;
use std::sync::Arc;

/// Pipes a resolved dependency through custom logic before injection.
///
/// # Examples
///
/// ```rust
/// use di_engine::{Argument, Instance, Result, Transform};
/// use std::sync::Arc;
///
/// struct Upper;
///
/// impl Transform for Upper {
///     fn transform(&self, incoming: Argument, _args: &[Instance]) -> Result<Instance> {
///         let text = incoming.expect_single::<String>("greeting")?;
///         Ok(Arc::new(text.to_uppercase()))
///     }
/// }
/// ```
pub trait Transform: Injectable {
    /// Transform the resolved subject, with any static extra arguments
    fn transform(&self, incoming: Argument, args: &[Instance]) -> Result<Instance>;
}

type ApplyFn = fn(&Instance, Argument, &[Instance]) -> Result<Instance>;

fn apply_erased<X: Transform>(
    transformer: &Instance,
    incoming: Argument,
    args: &[Instance],
) -> Result<Instance> {
    let transformer = transformer
        .downcast_ref::<X>()
        .ok_or_else(|| DiError::type_mismatch::<X>("transform"))?;
    transformer.transform(incoming, args)
}

/// Transform descriptor: resolve `transform` and `token`, then apply.
#[derive(Clone)]
pub struct TransformParam {
    pub(crate) token: Token,
    pub(crate) transform: Token,
    pub(crate) args: Vec<Instance>,
    pub(crate) multiple: bool,
    apply: ApplyFn,
}

impl TransformParam {
    #[inline]
    pub fn token(&self) -> &Token {
        &self.token
    }

    #[inline]
    pub fn transform_token(&self) -> &Token {
        &self.transform
    }

    #[inline]
    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    #[inline]
    pub(crate) fn apply(&self, transformer: &Instance, incoming: Argument) -> Result<Instance> {
        (self.apply)(transformer, incoming, &self.args)
    }
}

/// One entry of a constructor's ordered parameter list.
#[derive(Clone)]
pub enum Param {
    /// Resolve a single instance
    Token(Token),
    /// Resolve every registration, injected as a sequence
    All(Token),
    /// Resolve through a transformer
    Transform(TransformParam),
}

impl Param {
    /// Single-instance parameter
    #[inline]
    pub fn token(token: impl Into<Token>) -> Self {
        Param::Token(token.into())
    }

    /// Single-instance parameter using `T` as its own token
    #[inline]
    pub fn of<T: Constructor>() -> Self {
        Param::Token(Token::of::<T>())
    }

    /// Deferred `T`, injected as a [`Delayed<T>`](crate::Delayed)
    #[inline]
    pub fn delayed<T: Constructor>() -> Self {
        Param::Token(Token::delayed::<T>())
    }

    /// Sequence parameter over every registration of `token`
    #[inline]
    pub fn all(token: impl Into<Token>) -> Self {
        Param::All(token.into())
    }

    /// Resolve `token`, then pipe it through the `X` resolved from `transform`
    pub fn transform<X: Transform>(
        token: impl Into<Token>,
        transform: impl Into<Token>,
        args: Vec<Instance>,
    ) -> Self {
        Param::Transform(TransformParam {
            token: token.into(),
            transform: transform.into(),
            args,
            multiple: false,
            apply: apply_erased::<X>,
        })
    }

    /// Like [`Param::transform`], but the subject resolves as a sequence
    pub fn transform_all<X: Transform>(
        token: impl Into<Token>,
        transform: impl Into<Token>,
        args: Vec<Instance>,
    ) -> Self {
        Param::Transform(TransformParam {
            token: token.into(),
            transform: transform.into(),
            args,
            multiple: true,
            apply: apply_erased::<X>,
        })
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Token(token) => f.debug_tuple("Token").field(token).finish(),
            Param::All(token) => f.debug_tuple("All").field(token).finish(),
            Param::Transform(t) => f
                .debug_struct("Transform")
                .field("token", &t.token)
                .field("transform", &t.transform)
                .field("args", &t.args.len())
                .field("multiple", &t.multiple)
                .finish(),
        }
    }
}

/// A resolved constructor argument
#[derive(Clone)]
pub enum Argument {
    Single(Instance),
    Multiple(Vec<Instance>),
}

impl Argument {
    /// Downcast a single argument
    pub fn downcast<T: Injectable>(&self) -> Option<Arc<T>> {
        match self {
            Argument::Single(instance) => Arc::clone(instance).downcast::<T>().ok(),
            Argument::Multiple(_) => None,
        }
    }

    /// Downcast every element of a sequence argument
    pub fn downcast_all<T: Injectable>(&self) -> Option<Vec<Arc<T>>> {
        match self {
            Argument::Multiple(items) => items
                .iter()
                .map(|instance| Arc::clone(instance).downcast::<T>().ok())
                .collect(),
            Argument::Single(_) => None,
        }
    }

    /// [`Argument::downcast`], failing with `TypeMismatch` naming `what`
    pub fn expect_single<T: Injectable>(&self, what: &str) -> Result<Arc<T>> {
        self.downcast::<T>()
            .ok_or_else(|| DiError::type_mismatch::<T>(what))
    }

    /// [`Argument::downcast_all`], failing with `TypeMismatch` naming `what`
    pub fn expect_multiple<T: Injectable>(&self, what: &str) -> Result<Vec<Arc<T>>> {
        self.downcast_all::<T>()
            .ok_or_else(|| DiError::type_mismatch::<Vec<Arc<T>>>(what))
    }
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Single(_) => f.write_str("Single(..)"),
            Argument::Multiple(items) => write!(f, "Multiple({} items)", items.len()),
        }
    }
}

/// Positionally resolved arguments handed to [`Constructor::construct`].
pub struct Args {
    class: &'static str,
    values: Vec<Argument>,
}

impl Args {
    pub(crate) fn new(class: &'static str, values: Vec<Argument>) -> Self {
        Self { class, values }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw argument at `index`
    #[inline]
    pub fn argument(&self, index: usize) -> Option<&Argument> {
        self.values.get(index)
    }

    /// Single instance at `index`
    pub fn get<T: Injectable>(&self, index: usize) -> Result<Arc<T>> {
        self.at(index)?
            .expect_single::<T>(&self.position(index))
    }

    /// Sequence at `index`
    pub fn all<T: Injectable>(&self, index: usize) -> Result<Vec<Arc<T>>> {
        self.at(index)?
            .expect_multiple::<T>(&self.position(index))
    }

    fn at(&self, index: usize) -> Result<&Argument> {
        self.values.get(index).ok_or_else(|| DiError::CreationFailed {
            type_name: self.class,
            reason: format!("no argument supplied at position #{index}"),
        })
    }

    fn position(&self, index: usize) -> String {
        format!("{}#{}", self.class, index)
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args")
            .field("class", &self.class)
            .field("values", &self.values)
            .finish()
    }
}
