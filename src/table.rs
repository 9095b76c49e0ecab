//! Turning a sequence of records into headers and rows of flat text
//! cells, with the identity links found on rows and cells.

use anyhow::{Result, bail};
use kstring::KString;

use crate::{capability::{ABSENT_TEXT, Data, Sequence, Shape},
            error::GtmlError,
            path_codec::encode_link};

#[derive(Debug, Clone, PartialEq)]
pub struct TableValue {
    pub value: String,
    pub href: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub values: Vec<TableValue>,
    /// The link of the row's element.
    pub href: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableData {
    pub headers: Vec<KString>,
    pub rows: Vec<TableRow>,
}

fn link_href(value: &dyn Data) -> Option<String> {
    value.as_linkable().map(|l| encode_link(&*l.link()))
}

pub fn build_table(seq: &Sequence) -> Result<TableData> {
    let schema = match seq.element {
        Some(schema) => schema,
        None => bail!(GtmlError::InvalidRowShape(seq.element_type.to_string())),
    };
    let headers = schema.table_fields().map(|(_, f)| f.label.clone()).collect();

    let mut rows = Vec::with_capacity(seq.items.len());
    for &item in &seq.items {
        let record = match item.shape() {
            Shape::Record(record) => record,
            Shape::Absent => bail!(GtmlError::InvalidRowShape(format!(
                "missing value in sequence of {}", seq.element_type))),
            _ => bail!(GtmlError::InvalidRowShape(seq.element_type.to_string())),
        };
        let values = schema.table_fields().map(|(i, _)| {
            match record.field(i) {
                Some(value) => TableValue {
                    value: value.text(),
                    href: link_href(value),
                },
                None => TableValue {
                    value: ABSENT_TEXT.into(),
                    href: None,
                },
            }
        }).collect();
        rows.push(TableRow {
            values,
            href: link_href(item),
        });
    }
    Ok(TableData { headers, rows })
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{capability::Linkable, path_codec::Link};

    crate::link_record! {
        pub struct ColorLink {
            pub color: String,
        }
    }

    crate::record! {
        pub struct Color: Linkable {
            pub name: String,
        }
    }

    impl Linkable for Color {
        fn link(&self) -> Box<dyn Link> {
            Box::new(ColorLink { color: self.name.clone() })
        }
    }

    crate::record! {
        pub struct Pen {
            pub label: String,
            pub color: Color,
            #[tags = "table-hide"]
            pub serial: u64,
        }
    }

    fn pens() -> Vec<Pen> {
        vec![
            Pen { label: "Fine".into(), color: Color { name: "Red".into() }, serial: 1 },
            Pen { label: "Bold".into(), color: Color { name: "Blue".into() }, serial: 2 },
        ]
    }

    fn seq_of<T: Data>(v: &T) -> Sequence<'_> {
        match v.shape() {
            Shape::Sequence(seq) => seq,
            _ => panic!("not a sequence"),
        }
    }

    #[test]
    fn t_headers_independent_of_length() -> Result<()> {
        let empty: Vec<Pen> = Vec::new();
        let t = build_table(&seq_of(&empty))?;
        assert_eq!(t.headers, vec![KString::from("Label"), KString::from("Color")]);
        assert!(t.rows.is_empty());
        let pens = pens();
        assert_eq!(build_table(&seq_of(&pens))?.headers.len(), 2);
        Ok(())
    }

    #[test]
    fn t_rows_and_links() -> Result<()> {
        let pens = pens();
        let t = build_table(&seq_of(&pens))?;
        assert_eq!(t.rows.len(), 2);
        let row = &t.rows[0];
        assert_eq!(row.href, None);
        assert_eq!(row.values, vec![
            TableValue { value: "Fine".into(), href: None },
            TableValue { value: "{Red}".into(), href: Some("/Color/Red".into()) },
        ]);

        let colors = vec![Arc::new(Color { name: "Green".into() })];
        let t = build_table(&seq_of(&colors))?;
        assert_eq!(t.rows[0].href.as_deref(), Some("/Color/Green"));
        assert_eq!(t.rows[0].values[0].value, "Green");
        Ok(())
    }

    #[test]
    fn t_invalid_rows() {
        let v = vec![String::from("x")];
        let e = build_table(&seq_of(&v)).err().unwrap();
        assert!(matches!(GtmlError::find(&e), Some(GtmlError::InvalidRowShape(_))));

        let v: Vec<Option<Color>> = vec![None];
        let e = build_table(&seq_of(&v)).err().unwrap();
        assert!(matches!(GtmlError::find(&e), Some(GtmlError::InvalidRowShape(_))));
    }
}
