//! What the rendering engine can find out about a value: its shape
//! (absent, text, other scalar, record, sequence), and which of the
//! optional capabilities it has.

//! Capabilities are queried at render time through the `as_*`
//! methods of `Data`, which default to `None`; the `record!` macros
//! switch them on per type.

use std::{borrow::Cow, rc::Rc, sync::Arc, any::type_name};

use anyhow::Result;
use itertools::Itertools;
use kstring::KString;

use crate::{criteria::DynCriteria,
            html::{HtmlAllocator, Node},
            path_codec::Link,
            schema::Schema};

/// A record (struct-like value) whose fields are described by a
/// `Schema`.
pub trait Record {
    fn schema(&self) -> &'static Schema;
    /// The value of the field at `index` in the schema.
    fn field(&self, index: usize) -> Option<&dyn Data>;
}

pub struct Sequence<'a> {
    /// The schema of the element type, if it is a record; present
    /// even if `items` is empty.
    pub element: Option<&'static Schema>,
    pub element_type: &'static str,
    pub items: Vec<&'a dyn Data>,
}

pub enum Shape<'a> {
    Absent,
    /// Textual scalar.
    Text(Cow<'a, str>),
    /// Numbers, booleans: just their default text form.
    Scalar(String),
    Record(&'a dyn Record),
    Sequence(Sequence<'a>),
}

/// Produces the canonical identity record for the value, which is
/// turned into a path by the path codec.
pub trait Linkable {
    fn link(&self) -> Box<dyn Link>;
}

/// Produces its HTML directly; no further introspection happens.
pub trait SelfRendering {
    fn html(&self, html: &HtmlAllocator) -> Result<Node>;
}

/// Holds search criteria; rendered as a search form plus the search
/// results instead of its own shape.
pub trait SearchCriteriaHolder {
    fn criteria(&self) -> &dyn DynCriteria;
}

pub trait Data {
    fn shape(&self) -> Shape<'_>;

    /// The schema of `Self` if it is a record type.
    fn record_schema() -> Option<&'static Schema> where Self: Sized {
        None
    }

    fn as_linkable(&self) -> Option<&dyn Linkable> {
        None
    }

    fn as_self_rendering(&self) -> Option<&dyn SelfRendering> {
        None
    }

    fn as_criteria_holder(&self) -> Option<&dyn SearchCriteriaHolder> {
        None
    }

    /// The default text form, used e.g. in table cells.
    fn text(&self) -> String {
        shape_text(&self.shape())
    }
}

pub const ABSENT_TEXT: &str = "N/A";

pub fn shape_text(shape: &Shape) -> String {
    match shape {
        Shape::Absent => ABSENT_TEXT.into(),
        Shape::Text(s) => s.to_string(),
        Shape::Scalar(s) => s.clone(),
        Shape::Record(r) => {
            let schema = r.schema();
            format!("{{{}}}",
                    (0..schema.fields.len())
                    .filter_map(|i| r.field(i))
                    .map(|v| v.text())
                    .join(" "))
        }
        Shape::Sequence(seq) =>
            format!("[{}]", seq.items.iter().map(|v| v.text()).join(" ")),
    }
}


// ------------------------------------------------------------------
// Scalars

macro_rules! scalar_data {
    { $($t:ty)* } => {
        $(
            impl Data for $t {
                fn shape(&self) -> Shape<'_> {
                    Shape::Scalar(self.to_string())
                }
            }
        )*
    }
}

scalar_data! { i8 i16 i32 i64 i128 isize u8 u16 u32 u64 u128 usize f32 f64 bool }

impl Data for String {
    fn shape(&self) -> Shape<'_> {
        Shape::Text(Cow::Borrowed(self))
    }
}

impl Data for KString {
    fn shape(&self) -> Shape<'_> {
        Shape::Text(Cow::Borrowed(self.as_str()))
    }
}

impl Data for char {
    fn shape(&self) -> Shape<'_> {
        Shape::Text(Cow::Owned(self.to_string()))
    }
}


// ------------------------------------------------------------------
// Containers

impl<T: Data> Data for Option<T> {
    fn shape(&self) -> Shape<'_> {
        match self {
            Some(v) => v.shape(),
            None => Shape::Absent,
        }
    }
    fn record_schema() -> Option<&'static Schema> {
        T::record_schema()
    }
    fn as_linkable(&self) -> Option<&dyn Linkable> {
        self.as_ref()?.as_linkable()
    }
    fn as_self_rendering(&self) -> Option<&dyn SelfRendering> {
        self.as_ref()?.as_self_rendering()
    }
    fn as_criteria_holder(&self) -> Option<&dyn SearchCriteriaHolder> {
        self.as_ref()?.as_criteria_holder()
    }
    fn text(&self) -> String {
        match self {
            Some(v) => v.text(),
            None => ABSENT_TEXT.into(),
        }
    }
}

impl<T: Data> Data for Vec<T> {
    fn shape(&self) -> Shape<'_> {
        Shape::Sequence(Sequence {
            element: T::record_schema(),
            element_type: type_name::<T>(),
            items: self.iter().map(|v| v as &dyn Data).collect(),
        })
    }
}

// References are transparent: they have the shape and capabilities
// of their referent.
macro_rules! reference_data {
    { $($r:ident)* } => {
        $(
            impl<T: Data> Data for $r<T> {
                fn shape(&self) -> Shape<'_> {
                    (**self).shape()
                }
                fn record_schema() -> Option<&'static Schema> {
                    T::record_schema()
                }
                fn as_linkable(&self) -> Option<&dyn Linkable> {
                    (**self).as_linkable()
                }
                fn as_self_rendering(&self) -> Option<&dyn SelfRendering> {
                    (**self).as_self_rendering()
                }
                fn as_criteria_holder(&self) -> Option<&dyn SearchCriteriaHolder> {
                    (**self).as_criteria_holder()
                }
                fn text(&self) -> String {
                    (**self).text()
                }
            }
        )*
    }
}

reference_data! { Box Rc Arc }

impl<'t, T: Data> Data for &'t T {
    fn shape(&self) -> Shape<'_> {
        (**self).shape()
    }
    fn record_schema() -> Option<&'static Schema> {
        T::record_schema()
    }
    fn as_linkable(&self) -> Option<&dyn Linkable> {
        (**self).as_linkable()
    }
    fn as_self_rendering(&self) -> Option<&dyn SelfRendering> {
        (**self).as_self_rendering()
    }
    fn as_criteria_holder(&self) -> Option<&dyn SearchCriteriaHolder> {
        (**self).as_criteria_holder()
    }
    fn text(&self) -> String {
        (**self).text()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_scalar_text() {
        assert_eq!(50.0f64.text(), "50");
        assert_eq!(2.5f64.text(), "2.5");
        assert_eq!((-10i32).text(), "-10");
        assert_eq!(true.text(), "true");
        assert_eq!(String::from("Jarlsberg").text(), "Jarlsberg");
        assert_eq!(None::<String>.text(), "N/A");
        assert_eq!(Some(Arc::new(3u8)).text(), "3");
        assert_eq!(vec![1i32, 2, 3].text(), "[1 2 3]");
    }

    #[test]
    fn t_shapes() {
        assert!(matches!(None::<i32>.shape(), Shape::Absent));
        assert!(matches!(String::from("x").shape(), Shape::Text(_)));
        assert!(matches!(1u32.shape(), Shape::Scalar(_)));
        match vec![String::from("a")].shape() {
            Shape::Sequence(seq) => {
                assert!(seq.element.is_none());
                assert_eq!(seq.items.len(), 1);
                assert_eq!(seq.element_type, "alloc::string::String");
            }
            _ => panic!("expected a sequence"),
        }
    }
}
