//! Selections: typed descriptions of what to request and how to decode it.
//!
//! A [`Selection`] exposes two capabilities to the pipeline: building the wire
//! payload and decoding the envelope's `data` field into a caller-facing type.
//! Schema-aware selection builders implement this trait; [`Document`] is a
//! serde-driven implementation for hand-written documents.
//!
//! Selections come in two flavors. *Nullable* selections decode an absent
//! `data` into their own null representation (usually `None`). [`NonNull`]
//! wraps a nullable selection and fails when the data is absent.
//!
//! ```ignore
//! use lattice_graphql::{Document, Selection};
//!
//! #[derive(serde::Deserialize)]
//! struct Hero { name: String }
//!
//! // Nullable: decodes to Option<Hero>
//! let hero = Document::<Hero>::query("{ hero { name } }");
//!
//! // Non-null: decodes to Hero, fails on `"data": null`
//! let hero = hero.non_null();
//! ```

use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::request::GraphQLRequest;

/// Failure of a selection's decode capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// Data was required but the server sent null.
    #[error("expected non-null data")]
    NullData,
    /// The data did not match what the selection expects.
    #[error("{0}")]
    Decode(String),
}

impl SelectionError {
    /// Create a decode failure from any displayable error.
    pub fn decode(err: impl fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }
}

/// A typed selection over a GraphQL response.
///
/// `TypeLock` is the wire shape the envelope's `data` field is deserialized
/// into before the selection sees it. `Output` is what callers receive.
/// Implementations must be referentially transparent: the same selection is
/// reused across requests and never mutated by them.
pub trait Selection {
    /// The decoded, caller-facing value.
    type Output;
    /// The wire shape of the envelope's `data` field.
    type TypeLock: DeserializeOwned;

    /// Build the wire payload for this selection.
    fn payload(&self, operation_name: Option<&str>) -> GraphQLRequest;

    /// Decode the envelope's `data` field.
    fn decode(&self, data: Option<Self::TypeLock>) -> Result<Self::Output, SelectionError>;

    /// Wrap a nullable selection so that null data becomes an error.
    fn non_null<T>(self) -> NonNull<Self>
    where
        Self: Sized + Selection<Output = Option<T>>,
    {
        NonNull::new(self)
    }

    /// Transform the decoded output.
    fn map<F, U>(self, f: F) -> Map<Self, F>
    where
        Self: Sized,
        F: Fn(Self::Output) -> U,
    {
        Map { inner: self, f }
    }

    /// Transform the decoded output with a fallible function.
    fn try_map<F, U>(self, f: F) -> TryMap<Self, F>
    where
        Self: Sized,
        F: Fn(Self::Output) -> Result<U, SelectionError>,
    {
        TryMap { inner: self, f }
    }
}

impl<S: Selection + ?Sized> Selection for &S {
    type Output = S::Output;
    type TypeLock = S::TypeLock;

    fn payload(&self, operation_name: Option<&str>) -> GraphQLRequest {
        (**self).payload(operation_name)
    }

    fn decode(&self, data: Option<Self::TypeLock>) -> Result<Self::Output, SelectionError> {
        (**self).decode(data)
    }
}

/// Presence-asserting adapter over a nullable selection.
///
/// Delegates payload building unchanged. Decoding runs the inner selection
/// and fails with [`SelectionError::NullData`] if it yields `None`.
#[derive(Debug, Clone)]
pub struct NonNull<S> {
    inner: S,
}

impl<S> NonNull<S> {
    /// Wrap a nullable selection.
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Get the wrapped selection.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S, T> Selection for NonNull<S>
where
    S: Selection<Output = Option<T>>,
{
    type Output = T;
    type TypeLock = S::TypeLock;

    fn payload(&self, operation_name: Option<&str>) -> GraphQLRequest {
        self.inner.payload(operation_name)
    }

    fn decode(&self, data: Option<Self::TypeLock>) -> Result<T, SelectionError> {
        self.inner.decode(data)?.ok_or(SelectionError::NullData)
    }
}

/// Selection returned by [`Selection::map`].
#[derive(Clone)]
pub struct Map<S, F> {
    inner: S,
    f: F,
}

impl<S, F, U> Selection for Map<S, F>
where
    S: Selection,
    F: Fn(S::Output) -> U,
{
    type Output = U;
    type TypeLock = S::TypeLock;

    fn payload(&self, operation_name: Option<&str>) -> GraphQLRequest {
        self.inner.payload(operation_name)
    }

    fn decode(&self, data: Option<Self::TypeLock>) -> Result<U, SelectionError> {
        self.inner.decode(data).map(&self.f)
    }
}

impl<S: fmt::Debug, F> fmt::Debug for Map<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Map").field("inner", &self.inner).finish()
    }
}

/// Selection returned by [`Selection::try_map`].
#[derive(Clone)]
pub struct TryMap<S, F> {
    inner: S,
    f: F,
}

impl<S, F, U> Selection for TryMap<S, F>
where
    S: Selection,
    F: Fn(S::Output) -> Result<U, SelectionError>,
{
    type Output = U;
    type TypeLock = S::TypeLock;

    fn payload(&self, operation_name: Option<&str>) -> GraphQLRequest {
        self.inner.payload(operation_name)
    }

    fn decode(&self, data: Option<Self::TypeLock>) -> Result<U, SelectionError> {
        self.inner.decode(data).and_then(&self.f)
    }
}

impl<S: fmt::Debug, F> fmt::Debug for TryMap<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TryMap").field("inner", &self.inner).finish()
    }
}

/// A nullable selection over a hand-written GraphQL document.
///
/// The envelope's `data` is deserialized straight into `T`; the output is
/// `Option<T>`, `None` when the server sent null.
pub struct Document<T> {
    request: GraphQLRequest,
    _data: PhantomData<fn() -> T>,
}

impl<T> Document<T> {
    /// Create a selection from an existing payload.
    pub fn new(request: GraphQLRequest) -> Self {
        Self {
            request,
            _data: PhantomData,
        }
    }

    /// Create a query selection.
    pub fn query(query: impl Into<String>) -> Self {
        Self::new(GraphQLRequest::query(query))
    }

    /// Create a mutation selection.
    pub fn mutation(query: impl Into<String>) -> Self {
        Self::new(GraphQLRequest::mutation(query))
    }

    /// Set a variable.
    pub fn variable(mut self, name: impl Into<String>, value: impl Serialize) -> Self {
        self.request = self.request.variable(name, value);
        self
    }

    /// Replace all variables.
    pub fn variables(mut self, variables: impl Serialize) -> Self {
        self.request = self.request.variables(variables);
        self
    }

    /// Get the underlying payload.
    pub fn request(&self) -> &GraphQLRequest {
        &self.request
    }
}

impl<T> Clone for Document<T> {
    fn clone(&self) -> Self {
        Self::new(self.request.clone())
    }
}

impl<T> fmt::Debug for Document<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("request", &self.request)
            .finish()
    }
}

impl<T: DeserializeOwned> Selection for Document<T> {
    type Output = Option<T>;
    type TypeLock = T;

    fn payload(&self, operation_name: Option<&str>) -> GraphQLRequest {
        let mut request = self.request.clone();
        if let Some(name) = operation_name {
            request.operation_name = Some(name.to_string());
        }
        request
    }

    fn decode(&self, data: Option<T>) -> Result<Option<T>, SelectionError> {
        Ok(data)
    }
}
