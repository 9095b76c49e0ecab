//! Conversion between link records and URL paths: `/Field1/value1/Field2/value2`.

//! The same encoding gives the route pattern registered for a link
//! shape, with `{Field}` placeholders in the value positions.

use anyhow::{Result, bail};
use kstring::KString;
use lazy_static::lazy_static;
use pct_str::{PctString, URIReserved, InvalidPctString, PctStr};

use crate::{error::GtmlError, schema::Schema};


// ------------------------------------------------------------------
// Percent encoding

pub fn url_encode(s: &str) -> String {
    let p = PctString::encode(s.chars(), URIReserved);
    p.to_string()
}

// Own the string, so that the error can travel in an anyhow::Error
// without borrowing from the request.
#[derive(Debug, thiserror::Error)]
#[error("url decoding error: {0}")]
pub struct UrlDecodingError(Box<String>);

impl From<InvalidPctString<&str>> for UrlDecodingError {
    fn from(e: InvalidPctString<&str>) -> Self {
        Self(Box::new(format!("{}", e)))
    }
}

pub fn url_decode(s: &str) -> Result<String, UrlDecodingError> {
    let p = PctStr::new(s)?;
    Ok(p.decode())
}


// ------------------------------------------------------------------
// Field values

/// A value that can stand in a path segment (and in a query string
/// value). Decoding is type-directed: each type parses the string
/// itself, and reports what's wrong with it if it can't.
pub trait FieldValue: Sized {
    fn to_segment(&self) -> String;
    fn from_segment(s: &str) -> Result<Self, String>;
}

impl FieldValue for String {
    fn to_segment(&self) -> String {
        self.clone()
    }
    fn from_segment(s: &str) -> Result<Self, String> {
        Ok(s.to_string())
    }
}

impl FieldValue for KString {
    fn to_segment(&self) -> String {
        self.to_string()
    }
    fn from_segment(s: &str) -> Result<Self, String> {
        Ok(KString::from_ref(s))
    }
}

macro_rules! parsed_field_value {
    { $($t:ty)* } => {
        $(
            impl FieldValue for $t {
                fn to_segment(&self) -> String {
                    self.to_string()
                }
                fn from_segment(s: &str) -> Result<Self, String> {
                    s.parse::<$t>().map_err(
                        |e| format!("{s:?} is not a valid {}: {e}", stringify!($t)))
                }
            }
        )*
    }
}

parsed_field_value! { i8 i16 i32 i64 isize u8 u16 u32 u64 usize f32 f64 bool char }


// ------------------------------------------------------------------
// Links

/// An identity record for a resource, as produced by `Linkable`.
pub trait Link {
    fn schema(&self) -> &'static Schema;
    /// The field values as path segments (not yet percent-encoded),
    /// in declaration order.
    fn segments(&self) -> Vec<String>;
}

/// A link record type that routes are derived from and that request
/// paths are decoded into.
pub trait LinkShape: Sized {
    fn shape_schema() -> &'static Schema;
    fn from_params(params: &PathParams) -> Result<Self>;
}

lazy_static! {
    static ref UNIT_SCHEMA: Schema = Schema::new("()", &[]);
}

/// The field-less link: the root route.
impl LinkShape for () {
    fn shape_schema() -> &'static Schema {
        &UNIT_SCHEMA
    }
    fn from_params(_params: &PathParams) -> Result<Self> {
        Ok(())
    }
}

impl Link for () {
    fn schema(&self) -> &'static Schema {
        &UNIT_SCHEMA
    }
    fn segments(&self) -> Vec<String> {
        Vec::new()
    }
}

/// `/Field/value/...` for all fields in declaration order; `/` if
/// there are none.
pub fn encode_link(link: &dyn Link) -> String {
    let schema = link.schema();
    let mut path = String::new();
    for (field, value) in schema.fields.iter().zip(link.segments()) {
        path.push('/');
        path.push_str(&url_encode(&field.label));
        path.push('/');
        path.push_str(&url_encode(&value));
    }
    if path.is_empty() {
        path.push('/');
    }
    path
}

/// `/Field/{Field}/...`, the pattern to register with the router.
pub fn route_pattern(schema: &Schema) -> String {
    let mut path = String::new();
    for field in &schema.fields {
        path.push('/');
        path.push_str(&url_encode(&field.label));
        path.push_str("/{");
        path.push_str(&field.label);
        path.push('}');
    }
    if path.is_empty() {
        path.push('/');
    }
    path
}


// ------------------------------------------------------------------
// Path parameters

/// The values bound to the `{Field}` placeholders of a route pattern
/// (already percent-decoded).
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PathParams(Vec<(KString, KString)>);

impl PathParams {
    pub fn new() -> Self {
        PathParams(Vec::new())
    }

    pub fn push(&mut self, name: KString, value: KString) {
        self.0.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k.as_str() == name).map(|(_, v)| v.as_str())
    }

    /// Read the parameter named like the label of field `ident`, and
    /// parse it into the field's type.
    pub fn decode_field<V: FieldValue>(&self, schema: &Schema, ident: &str) -> Result<V> {
        let field = match schema.field_index(ident) {
            Some(i) => &schema.fields[i],
            None => bail!(GtmlError::DecodeFailure(format!(
                "{} has no field {ident:?}", schema.name)))
        };
        let raw = match self.get(&field.label) {
            Some(raw) => raw,
            None => bail!(GtmlError::DecodeFailure(format!(
                "missing path parameter {:?} for {}", field.label.as_str(), schema.name)))
        };
        V::from_segment(raw).map_err(
            |e| GtmlError::DecodeFailure(format!(
                "path parameter {:?} of {}: {e}", field.label.as_str(), schema.name)).into())
    }
}

/// Split a raw (still percent-encoded) URL path into its decoded
/// segments. Empty segments are dropped.
pub fn path_segments(raw_path: &str) -> Result<Vec<KString>> {
    raw_path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| url_decode(s)
             .map(KString::from_string)
             .map_err(|e| anyhow::Error::from(GtmlError::DecodeFailure(e.to_string()))))
        .collect()
}

/// Decode a concrete path like one produced by `encode_link` into
/// the path parameters for `schema`. Field names must appear in
/// declaration order.
pub fn params_from_path(schema: &Schema, raw_path: &str) -> Result<PathParams> {
    let segments = path_segments(raw_path)?;
    if segments.len() != 2 * schema.fields.len() {
        bail!(GtmlError::DecodeFailure(format!(
            "path {raw_path:?} does not have the shape of {}", schema.name)))
    }
    let mut params = PathParams::new();
    for (field, pair) in schema.fields.iter().zip(segments.chunks(2)) {
        if pair[0] != field.label {
            bail!(GtmlError::DecodeFailure(format!(
                "expected field {:?} in path {raw_path:?}, got {:?}",
                field.label.as_str(), pair[0].as_str())))
        }
        params.push(field.label.clone(), pair[1].clone());
    }
    Ok(params)
}

/// Decode a request path into the typed link `L`.
pub fn decode_path<L: LinkShape>(raw_path: &str) -> Result<L> {
    L::from_params(&params_from_path(L::shape_schema(), raw_path)?)
}


#[cfg(test)]
mod tests {
    use super::*;

    crate::link_record! {
        #[derive(Debug, Clone, PartialEq)]
        struct ProductLink {
            product: String,
        }
    }

    crate::link_record! {
        #[derive(Debug, Clone, PartialEq)]
        struct ListItemLink {
            shopping_list: String,
            position: u32,
        }
    }

    #[test]
    fn t_url_encode() {
        assert_eq!(url_encode("Kvikk-Lunsj"), "Kvikk-Lunsj");
        assert_eq!(url_encode("My Shopping List"), "My%20Shopping%20List");
        assert_eq!(url_encode("a/b?c"), "a%2Fb%3Fc");
        assert_eq!(url_decode("a%2Fb%3Fc").unwrap(), "a/b?c");
        assert!(url_decode("100%").is_err());
    }

    #[test]
    fn t_route_pattern() {
        assert_eq!(route_pattern(<()>::shape_schema()), "/");
        assert_eq!(route_pattern(ProductLink::shape_schema()), "/Product/{Product}");
        assert_eq!(route_pattern(ListItemLink::shape_schema()),
                   "/ShoppingList/{ShoppingList}/Position/{Position}");
    }

    #[test]
    fn t_encode() {
        assert_eq!(encode_link(&()), "/");
        let l = ProductLink { product: "Jarlsberg".into() };
        assert_eq!(encode_link(&l), "/Product/Jarlsberg");
        let l = ListItemLink { shopping_list: "My Shopping List".into(), position: 3 };
        assert_eq!(encode_link(&l), "/ShoppingList/My%20Shopping%20List/Position/3");
    }

    #[test]
    fn t_roundtrip_strings() -> Result<()> {
        for name in ["Jarlsberg", "Kvikk-Lunsj", "a/b", "brun ost?", "æøå"] {
            let l = ProductLink { product: name.into() };
            assert_eq!(decode_path::<ProductLink>(&encode_link(&l))?, l);
        }
        Ok(())
    }

    #[test]
    fn t_empty_value() {
        let l = ProductLink { product: "".into() };
        assert_eq!(encode_link(&l), "/Product/");
        assert!(decode_path::<ProductLink>(&encode_link(&l)).is_err());
    }

    #[test]
    fn t_typed_decode() -> Result<()> {
        let l: ListItemLink = decode_path("/ShoppingList/Mine/Position/7")?;
        assert_eq!(l, ListItemLink { shopping_list: "Mine".into(), position: 7 });

        let e = decode_path::<ListItemLink>("/ShoppingList/Mine/Position/seven")
            .err().unwrap();
        assert!(matches!(GtmlError::find(&e), Some(GtmlError::DecodeFailure(_))));
        assert!(e.to_string().contains("\"seven\" is not a valid u32"), "{e}");
        Ok(())
    }

    #[test]
    fn t_params() {
        let mut p = PathParams::new();
        p.push("Product".into(), "Jarlsberg".into());
        assert_eq!(p.get("Product"), Some("Jarlsberg"));
        assert_eq!(p.get("product"), None);
        let e = p.decode_field::<String>(ListItemLink::shape_schema(), "shopping_list")
            .err().unwrap();
        assert!(e.to_string().contains("missing path parameter \"ShoppingList\""), "{e}");
    }

    #[test]
    fn t_path_segments() -> Result<()> {
        assert_eq!(path_segments("/")?, Vec::<KString>::new());
        assert_eq!(path_segments("//Product/Kvikk%2DLunsj/")?,
                   vec![KString::from("Product"), KString::from("Kvikk-Lunsj")]);
        Ok(())
    }
}
