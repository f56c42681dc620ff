//! Process-wide memoised [`TypeSpec`] resolution.

use crate::error::{CborError, Result};
use crate::schema::TypeSpec;
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Static description of a schema type's wire layout.
pub trait CborSchema {
    fn describe() -> TypeSpec;
}

static SPECS: OnceLock<DashMap<TypeId, Arc<TypeSpec>>> = OnceLock::new();

fn specs() -> &'static DashMap<TypeId, Arc<TypeSpec>> {
    SPECS.get_or_init(DashMap::new)
}

/// Resolves the validated [`TypeSpec`] of `T`, building it on first use.
///
/// Concurrent first calls may each build the description; the first one published
/// is returned to every caller from then on.
pub fn spec<T: CborSchema + 'static>() -> Result<Arc<TypeSpec>> {
    let id = TypeId::of::<T>();
    if let Some(spec) = specs().get(&id) {
        return Ok(Arc::clone(spec.value()));
    }

    let spec = T::describe();
    spec.validate().map_err(|reason| CborError::SchemaError {
        type_name: spec.name,
        reason,
    })?;
    debug!(
        type_name = spec.name,
        category = ?spec.category,
        fields = spec.fields.len(),
        "registered CBOR type"
    );
    let published = specs().entry(id).or_insert_with(|| Arc::new(spec));
    Ok(Arc::clone(published.value()))
}

/// Whether `T` has already been resolved.
pub fn is_registered<T: 'static>() -> bool {
    specs().contains_key(&TypeId::of::<T>())
}

pub fn registered_count() -> usize {
    specs().len()
}
