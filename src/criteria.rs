//! Search criteria: records whose `search`-tagged fields can be
//! overridden from the query string, and `SearchLink`, the value that
//! embeds a criteria record into a page as a search widget.

use std::any::{Any, TypeId, type_name};

use anyhow::Result;

use crate::{capability::{Data, Shape, SearchCriteriaHolder},
            error::GtmlError,
            path_codec::FieldValue,
            query::QueryString,
            schema::{FieldTag, Schema}};

/// Implemented by `criteria_record!`.
pub trait Criteria: Data + Sized {
    fn criteria_schema() -> &'static Schema;

    /// The current value of the field at `index`, as the text to
    /// pre-fill its input with.
    fn field_segment(&self, index: usize) -> Option<String>;

    /// A new instance with the `search` fields replaced by the values
    /// found in `query` under `Name.Label`; the rest are copied.
    fn apply_overrides(&self, query: &QueryString) -> Result<Self>;
}

/// The object safe view of a `Criteria`, as seen by the engine.
pub trait DynCriteria: Send + Sync {
    fn schema(&self) -> &'static Schema;
    fn criteria_type_id(&self) -> TypeId;
    fn criteria_type_name(&self) -> &'static str;
    fn field_segment(&self, index: usize) -> Option<String>;
    fn with_overrides(&self, query: &QueryString) -> Result<Box<dyn DynCriteria>>;
    fn as_any(&self) -> &dyn Any;
}

impl<C: Criteria + Send + Sync + 'static> DynCriteria for C {
    fn schema(&self) -> &'static Schema {
        C::criteria_schema()
    }
    fn criteria_type_id(&self) -> TypeId {
        TypeId::of::<C>()
    }
    fn criteria_type_name(&self) -> &'static str {
        type_name::<C>()
    }
    fn field_segment(&self, index: usize) -> Option<String> {
        Criteria::field_segment(self, index)
    }
    fn with_overrides(&self, query: &QueryString) -> Result<Box<dyn DynCriteria>> {
        Ok(Box::new(self.apply_overrides(query)?))
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The query string key for `field` of `schema`.
pub fn query_key(schema: &Schema, label: &str) -> String {
    format!("{}.{}", schema.name, label)
}

/// The new value for the field `ident` of a criteria record: parsed
/// from the query if the field is `search`-tagged and the key is
/// present, `current` otherwise.
pub fn override_field<V: FieldValue + Clone>(
    schema: &Schema,
    ident: &str,
    current: &V,
    query: &QueryString,
) -> Result<V> {
    let field = match schema.field_index(ident) {
        Some(i) => &schema.fields[i],
        None => return Ok(current.clone()),
    };
    if !field.has_tag(FieldTag::Search) {
        return Ok(current.clone())
    }
    let key = query_key(schema, &field.label);
    match query.get(&key) {
        Some(raw) => V::from_segment(raw).map_err(
            |e| GtmlError::DecodeFailure(format!("query parameter {key:?}: {e}")).into()),
        None => Ok(current.clone()),
    }
}

/// Problems with a criteria shape, checked when its search function
/// is registered.
pub fn check_criteria_schema<C: Criteria>() -> Result<()> {
    C::criteria_schema().check().map_err(
        |reason| GtmlError::InvalidCriteriaShape {
            shape: type_name::<C>(),
            reason
        }.into())
}


/// Wraps criteria to make them render as a search form plus the
/// results of running the registered search function on them.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchLink<C> {
    criteria: C,
}

impl<C: Criteria + Send + Sync + 'static> SearchLink<C> {
    pub fn new(criteria: C) -> Self {
        SearchLink { criteria }
    }
}

impl<C: Criteria + Send + Sync + 'static> SearchCriteriaHolder for SearchLink<C> {
    fn criteria(&self) -> &dyn DynCriteria {
        &self.criteria
    }
}

impl<C: Criteria + Send + Sync + 'static> Data for SearchLink<C> {
    fn shape(&self) -> Shape<'_> {
        self.criteria.shape()
    }
    fn as_criteria_holder(&self) -> Option<&dyn SearchCriteriaHolder> {
        Some(self)
    }
    fn text(&self) -> String {
        self.criteria.text()
    }
}
