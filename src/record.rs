//! Macros declaring record types together with their `Schema`.

//! ```ignore
//! gtml::record! {
//!     #[derive(Debug)]
//!     pub struct Product: Linkable {
//!         pub name: String,
//!         #[tags = "table-hide"]
//!         pub nutrients: Vec<Nutrient>,
//!     }
//! }
//! ```
//!
//! Capabilities after the colon switch on the corresponding `as_*`
//! accessor of `Data`; the trait itself (`Linkable`, `SelfRendering`,
//! `std::fmt::Display` for `Display`) must be implemented separately.

#[macro_export]
macro_rules! record {
    (@tags) => { "" };
    (@tags $tags:literal) => { $tags };

    (@cap Linkable) => {
        fn as_linkable(&self) -> Option<&dyn $crate::capability::Linkable> {
            Some(self)
        }
    };
    (@cap SelfRendering) => {
        fn as_self_rendering(&self) -> Option<&dyn $crate::capability::SelfRendering> {
            Some(self)
        }
    };
    (@cap Display) => {
        fn text(&self) -> String {
            ::std::string::ToString::to_string(self)
        }
    };

    // `$all` switches off the visibility filter: link and criteria
    // records are encoded in full.
    {
        @define $all:literal;
        $(#[$meta:meta])*
        $vis:vis struct $name:ident $(: $($cap:ident),+)? {
            $(
                $(#[tags = $tags:literal])?
                $fvis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    } => {
        $(#[$meta])*
        $vis struct $name {
            $( $fvis $field : $ty ),*
        }

        impl $name {
            pub fn gtml_schema() -> &'static $crate::schema::Schema {
                $crate::lazy_static::lazy_static! {
                    static ref SCHEMA: $crate::schema::Schema = {
                        let decls: &[(&'static str, &'static str, bool)] = &[
                            $( (stringify!($field),
                                $crate::record!(@tags $($tags)?),
                                $all || stringify!($fvis) == "pub") ),*
                        ];
                        let fields: Vec<(&'static str, &'static str)> = decls.iter()
                            .filter(|(_, _, visible)| *visible)
                            .map(|&(ident, tags, _)| (ident, tags))
                            .collect();
                        $crate::schema::Schema::new(stringify!($name), &fields)
                    };
                }
                &SCHEMA
            }
        }

        impl $crate::capability::Record for $name {
            fn schema(&self) -> &'static $crate::schema::Schema {
                Self::gtml_schema()
            }

            #[allow(unused_variables)]
            fn field(&self, index: usize) -> Option<&dyn $crate::capability::Data> {
                let ident = Self::gtml_schema().fields.get(index)?.ident;
                $(
                    if ident == stringify!($field) {
                        return Some(&self.$field)
                    }
                )*
                None
            }
        }

        impl $crate::capability::Data for $name {
            fn shape(&self) -> $crate::capability::Shape<'_> {
                $crate::capability::Shape::Record(self)
            }

            fn record_schema() -> Option<&'static $crate::schema::Schema> {
                Some(Self::gtml_schema())
            }

            $( $( $crate::record!(@cap $cap); )+ )?
        }
    };

    // Only `pub` fields are part of the schema.
    {
        $(#[$meta:meta])*
        $vis:vis struct $name:ident $(: $($cap:ident),+)? {
            $(
                $(#[tags = $tags:literal])?
                $fvis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    } => {
        $crate::record! {
            @define false;
            $(#[$meta])*
            $vis struct $name $(: $($cap),+)? {
                $(
                    $(#[tags = $tags])?
                    $fvis $field : $ty
                ),*
            }
        }
    };
}

/// A record used as the identity of a resource: routes are derived
/// from it, request paths are decoded into it. All fields must
/// implement `FieldValue`.
#[macro_export]
macro_rules! link_record {
    {
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $fvis:vis $field:ident : $ty:ty ),* $(,)?
        }
    } => {
        $crate::record! {
            @define true;
            $(#[$meta])*
            $vis struct $name {
                $( $fvis $field : $ty ),*
            }
        }

        impl $crate::path_codec::LinkShape for $name {
            fn shape_schema() -> &'static $crate::schema::Schema {
                Self::gtml_schema()
            }

            #[allow(unused_variables)]
            fn from_params(
                params: &$crate::path_codec::PathParams
            ) -> ::std::result::Result<Self, $crate::anyhow::Error> {
                let schema = Self::gtml_schema();
                Ok($name {
                    $( $field: params.decode_field(schema, stringify!($field))? ),*
                })
            }
        }

        impl $crate::path_codec::Link for $name {
            fn schema(&self) -> &'static $crate::schema::Schema {
                Self::gtml_schema()
            }

            fn segments(&self) -> Vec<String> {
                vec![ $( $crate::path_codec::FieldValue::to_segment(&self.$field) ),* ]
            }
        }
    };
}

/// A search criteria record; `search`-tagged fields are filter inputs.
/// All fields must implement `FieldValue` and `Clone`.
#[macro_export]
macro_rules! criteria_record {
    {
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[tags = $tags:literal])?
                $fvis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    } => {
        $crate::record! {
            @define true;
            $(#[$meta])*
            $vis struct $name {
                $(
                    $(#[tags = $tags])?
                    $fvis $field : $ty
                ),*
            }
        }

        impl $crate::criteria::Criteria for $name {
            fn criteria_schema() -> &'static $crate::schema::Schema {
                Self::gtml_schema()
            }

            #[allow(unused_variables)]
            fn field_segment(&self, index: usize) -> Option<String> {
                let ident = Self::gtml_schema().fields.get(index)?.ident;
                $(
                    if ident == stringify!($field) {
                        return Some($crate::path_codec::FieldValue::to_segment(&self.$field))
                    }
                )*
                None
            }

            #[allow(unused_variables)]
            fn apply_overrides(
                &self,
                query: &$crate::query::QueryString
            ) -> ::std::result::Result<Self, $crate::anyhow::Error> {
                let schema = Self::gtml_schema();
                Ok($name {
                    $(
                        $field: $crate::criteria::override_field(
                            schema, stringify!($field), &self.$field, query)?
                    ),*
                })
            }
        }
    };
}
