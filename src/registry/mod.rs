//! Component registry keyed by prefix.
//!
//! # Data Flow
//! ```text
//! ServiceBuilder::with_runnable(c)
//!     → Registry::register(prefix, Arc<C>)
//!           stores Arc<dyn Runnable>   (lifecycle iteration, in order)
//!           stores Arc<dyn Any>        (typed lookup)
//!     → moved into the service, read-only from then on
//!
//! ServiceContext::get::<C>(prefix)     → Option<Arc<C>>
//! ServiceContext::must_get::<C>(prefix) → Arc<C> or panic
//! ```
//!
//! # Design Decisions
//! - Mutation needs `&mut self`, which only the builder has; once the service is
//!   built the map is shared immutably, so concurrent lookups need no lock
//! - A duplicate prefix is an error rather than a silent overwrite
//! - Typed lookup goes through `Any`, checked against the concrete type requested

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::component::{Retrievable, Runnable};

/// Error type for registration.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("prefix `{prefix}` is already registered by `{existing}`")]
    DuplicatePrefix { prefix: String, existing: String },
}

impl RegistryError {
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistryError::DuplicatePrefix { .. } => "registry_duplicate_prefix",
        }
    }
}

/// Error type for lookups.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("no component registered under prefix `{prefix}`")]
    NotFound { prefix: String },

    #[error("component `{prefix}` is not a `{expected}`")]
    TypeMismatch {
        prefix: String,
        expected: &'static str,
    },
}

impl LookupError {
    pub fn as_label(&self) -> &'static str {
        match self {
            LookupError::NotFound { .. } => "lookup_not_found",
            LookupError::TypeMismatch { .. } => "lookup_type_mismatch",
        }
    }
}

#[derive(Clone)]
struct Entry {
    runnable: Arc<dyn Runnable>,
    any: Arc<dyn Any + Send + Sync>,
}

/// Prefix → component map that also remembers registration order.
#[derive(Clone, Default)]
pub struct Registry {
    entries: HashMap<String, Entry>,
    order: Vec<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `component` under `prefix` and appends it to the lifecycle order.
    pub fn register<R: Runnable>(
        &mut self,
        prefix: impl Into<String>,
        component: Arc<R>,
    ) -> Result<(), RegistryError> {
        let prefix = prefix.into();
        if let Some(existing) = self.entries.get(&prefix) {
            return Err(RegistryError::DuplicatePrefix {
                prefix,
                existing: existing.runnable.name().to_string(),
            });
        }

        tracing::debug!(prefix = %prefix, component = %component.name(), "Component registered");
        let entry = Entry {
            runnable: component.clone(),
            any: component,
        };
        self.order.push(prefix.clone());
        self.entries.insert(prefix, entry);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.entries.contains_key(prefix)
    }

    /// Prefixes in registration order.
    pub fn prefixes(&self) -> &[String] {
        &self.order
    }

    /// Components in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Runnable>)> + '_ {
        self.order.iter().filter_map(move |prefix| {
            self.entries
                .get(prefix)
                .map(|entry| (prefix.as_str(), &entry.runnable))
        })
    }

    /// Lifecycle view of a component.
    pub fn get_runnable(&self, prefix: &str) -> Option<Arc<dyn Runnable>> {
        self.entries.get(prefix).map(|e| e.runnable.clone())
    }

    /// Best-effort typed lookup. `None` if absent or of another type.
    pub fn get<T: Any + Send + Sync>(&self, prefix: &str) -> Option<Arc<T>> {
        self.try_get(prefix).ok()
    }

    /// Typed lookup reporting why it failed.
    pub fn try_get<T: Any + Send + Sync>(&self, prefix: &str) -> Result<Arc<T>, LookupError> {
        let entry = self.entries.get(prefix).ok_or_else(|| LookupError::NotFound {
            prefix: prefix.to_string(),
        })?;
        entry
            .any
            .clone()
            .downcast::<T>()
            .map_err(|_| LookupError::TypeMismatch {
                prefix: prefix.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Typed lookup for a required dependency.
    ///
    /// # Panics
    /// Panics when nothing is registered under `prefix`, or when the component is
    /// not a `T`. Both are wiring mistakes in the calling code.
    pub fn must_get<T: Any + Send + Sync>(&self, prefix: &str) -> Arc<T> {
        match self.try_get(prefix) {
            Ok(component) => component,
            Err(e) => panic!("{e}"),
        }
    }

    /// Looks up a [`Retrievable`] component and returns its inner value.
    pub fn get_target<C>(&self, prefix: &str) -> Option<C::Target>
    where
        C: Retrievable + Any + Send + Sync,
    {
        self.get::<C>(prefix).and_then(|c| c.get())
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").field("order", &self.order).finish()
    }
}
