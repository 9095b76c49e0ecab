//! Rendering arbitrary data into HTML, driven by the shape and the
//! capabilities of each value.

use anyhow::{Context, Result, anyhow, bail};

use crate::{acontext::{AContext, SEARCH_TARGET_PREFIX},
            capability::{ABSENT_TEXT, Data, Record, Shape},
            criteria::{DynCriteria, query_key},
            error::GtmlError,
            html::{HtmlAllocator, Node, att, opt_att},
            search_registry::SearchRegistry,
            table::build_table,
            templates::{BODY, STRING_INPUT, Slots, TABLE, TemplateStore}};

/// The id of the container holding the results for the search
/// widget in field `field_name`.
pub fn search_container_id(field_name: &str) -> String {
    format!("{SEARCH_TARGET_PREFIX}{field_name}")
}

/// Outside of the `search-` namespace, so that it is never taken for
/// a partial update target.
fn search_form_id(field_name: &str) -> String {
    format!("form-{SEARCH_TARGET_PREFIX}{field_name}")
}

pub struct Renderer<'a> {
    registry: &'a SearchRegistry,
    templates: &'a TemplateStore,
}

impl<'a> Renderer<'a> {
    pub fn new(registry: &'a SearchRegistry, templates: &'a TemplateStore) -> Self {
        Renderer { registry, templates }
    }

    /// Render `value`, which was found in the field `field_name` of
    /// its parent record (`None` at the top).
    pub fn render(
        &self,
        value: &dyn Data,
        field_name: Option<&str>,
        ctx: &AContext,
        html: &HtmlAllocator
    ) -> Result<Node> {
        let shape = value.shape();
        if let Shape::Absent = shape {
            return html.staticstr(ABSENT_TEXT)
        }
        if let Some(holder) = value.as_criteria_holder() {
            return self.render_search_widget(field_name, holder.criteria(), ctx, html)
        }
        if let Some(self_rendering) = value.as_self_rendering() {
            return self_rendering.html(html)
        }
        match shape {
            Shape::Absent => html.staticstr(ABSENT_TEXT),
            Shape::Record(record) => self.render_record(record, ctx, html),
            Shape::Sequence(seq) => {
                let table = build_table(&seq)?;
                self.templates.execute(TABLE, Slots::Table(&table), html)
            }
            Shape::Text(s) => html.p([], [html.str(&s)?]),
            Shape::Scalar(s) => html.string(s),
        }
    }

    fn render_record(
        &self,
        record: &dyn Record,
        ctx: &AContext,
        html: &HtmlAllocator
    ) -> Result<Node> {
        let schema = record.schema();
        let mut body = Vec::with_capacity(1 + 2 * schema.fields.len());
        body.push(html.h1([], [html.staticstr(schema.name)?])?);
        for (i, field) in schema.fields.iter().enumerate() {
            body.push(html.h2([], [html.str(&field.label)?])?);
            let value = record.field(i).ok_or_else(
                || anyhow!("bug: {} has no value for field {i}", schema.name))?;
            body.push(self.render(value, Some(field.label.as_str()), ctx, html)
                      .with_context(|| format!("rendering field {:?} of {}",
                                               field.label.as_str(), schema.name))?);
        }
        html.list(body)
    }

    /// The form with one input per `search` field of `criteria`
    /// (after applying the query string), followed by the container
    /// holding the search results.
    pub fn render_search_widget(
        &self,
        field_name: Option<&str>,
        criteria: &dyn DynCriteria,
        ctx: &AContext,
        html: &HtmlAllocator
    ) -> Result<Node> {
        let (form, container) = self.search_parts(field_name, criteria, ctx, html, false)?;
        html.list([form, container])
    }

    fn search_parts(
        &self,
        field_name: Option<&str>,
        criteria: &dyn DynCriteria,
        ctx: &AContext,
        html: &HtmlAllocator,
        out_of_band: bool,
    ) -> Result<(Node, Node)> {
        let field_name = match field_name {
            Some(name) if !name.is_empty() => name,
            _ => bail!(GtmlError::RenderFailure(format!(
                "search criteria {} need to be in a named field",
                criteria.criteria_type_name())))
        };
        let (updated, results) = self.registry.resolve_and_run(criteria, ctx.query())?;
        let container_id = search_container_id(field_name);
        let target = format!("#{container_id}");
        let form = self.search_form(field_name, &*updated, &target, out_of_band, html)?;
        let results = self.render(&*results, None, ctx, html)
            .with_context(|| format!("rendering search results for {field_name:?}"))?;
        let container = html.div([att("id", container_id)], [results])?;
        Ok((form, container))
    }

    fn search_form(
        &self,
        field_name: &str,
        criteria: &dyn DynCriteria,
        target: &str,
        out_of_band: bool,
        html: &HtmlAllocator
    ) -> Result<Node> {
        let schema = criteria.schema();
        let mut inputs = Vec::new();
        for (i, field) in schema.search_fields() {
            inputs.push(self.templates.execute(STRING_INPUT, Slots::StringInput {
                name: query_key(schema, &field.label),
                value: criteria.field_segment(i).unwrap_or_default(),
                placeholder: field.label.to_string(),
                target: target.to_string(),
            }, html)?);
        }
        html.form(
            [att("id", search_form_id(field_name)),
             att("hx-get", "/"),
             att("hx-target", target.to_string()),
             att("hx-swap", "outerHTML"),
             opt_att("hx-swap-oob", out_of_band.then(|| "true"))],
            inputs)
    }

    /// Only the search widget in the field labelled `label` of
    /// `value`, for a partial update. The form is marked to be
    /// swapped in place of the existing one.
    pub fn render_partial(
        &self,
        value: &dyn Data,
        label: &str,
        ctx: &AContext,
        html: &HtmlAllocator
    ) -> Result<Node> {
        let record = match value.shape() {
            Shape::Record(record) => record,
            _ => bail!(GtmlError::ResourceNotFound(format!(
                "search field {label:?} (page is not a record)")))
        };
        let schema = record.schema();
        let (i, field) = schema.field_by_label(label).ok_or_else(
            || GtmlError::ResourceNotFound(format!(
                "search field {label:?} in {}", schema.name)))?;
        let value = record.field(i).ok_or_else(
            || anyhow!("bug: {} has no value for field {i}", schema.name))?;
        let holder = value.as_criteria_holder().ok_or_else(
            || GtmlError::RenderFailure(format!(
                "field {label:?} of {} does not hold search criteria", schema.name)))?;
        let (form, container) = self.search_parts(
            Some(field.label.as_str()), holder.criteria(), ctx, html, true)?;
        html.list([form, container])
    }

    /// `value` rendered and wrapped in the body template.
    pub fn render_page(
        &self,
        value: &dyn Data,
        ctx: &AContext,
        html: &HtmlAllocator
    ) -> Result<Node> {
        let main = self.render(value, None, ctx, html)?;
        self.templates.execute(BODY, Slots::Body { main }, html)
    }
}


#[cfg(test)]
mod tests {
    use rouille::Request;

    use super::*;
    use crate::{capability::SelfRendering,
                criteria::SearchLink,
                html::{Print, SerHtmlFrag},
                templates::default_store};

    crate::record! {
        pub struct Nutrient {
            pub name: String,
            pub amount: f64,
        }
    }

    crate::record! {
        pub struct Product {
            pub name: String,
            pub nutrients: Vec<Nutrient>,
            pub note: Option<String>,
        }
    }

    crate::criteria_record! {
        #[derive(Clone)]
        pub struct ProductSearch {
            #[tags = "search"]
            pub name: String,
        }
    }

    crate::record! {
        pub struct Banner: SelfRendering {
            pub text: String,
        }
    }

    impl SelfRendering for Banner {
        fn html(&self, html: &HtmlAllocator) -> Result<Node> {
            html.preserialized(SerHtmlFrag::new(format!("<marquee>{}</marquee>", self.text)))
        }
    }

    crate::record! {
        pub struct Page {
            pub banner: Banner,
            pub products: SearchLink<ProductSearch>,
            pub count: u32,
        }
    }

    crate::record! {
        pub struct Supplier {
            pub name: String,
            contract: String,
        }
    }

    crate::criteria_record! {
        #[derive(Clone)]
        pub struct PriceSearch {
            #[tags = "search"]
            pub name: String,
            #[tags = "search"]
            pub max_price: u32,
        }
    }

    crate::record! {
        pub struct Shop {
            pub prices: SearchLink<PriceSearch>,
        }
    }

    fn jarlsberg() -> Product {
        Product {
            name: "Jarlsberg".into(),
            nutrients: vec![Nutrient { name: "Cheese".into(), amount: 50. },
                            Nutrient { name: "Sugar".into(), amount: 50. }],
            note: None,
        }
    }

    fn registry() -> SearchRegistry {
        let mut r = SearchRegistry::new();
        r.register(|c: &ProductSearch| {
            let p = jarlsberg();
            Ok(if p.name.to_lowercase().contains(&c.name.to_lowercase()) {
                vec![p]
            } else {
                vec![]
            })
        }).unwrap();
        r
    }

    fn page() -> Page {
        Page {
            banner: Banner { text: "Hi".into() },
            products: SearchLink::new(ProductSearch { name: "".into() }),
            count: 3,
        }
    }

    fn render_with(value: &dyn Data, url: &str, partial: Option<&str>) -> Result<String> {
        let registry = registry();
        let templates = default_store();
        let renderer = Renderer::new(&registry, &templates);
        let request = Request::fake_http("GET", url, vec![], vec![]);
        let ctx = AContext::new(&request)?;
        let html = HtmlAllocator::new(10000);
        let node = match partial {
            Some(label) => renderer.render_partial(value, label, &ctx, &html)?,
            None => renderer.render(value, None, &ctx, &html)?,
        };
        Ok(node.to_html_fragment_string())
    }

    #[test]
    fn t_record() -> Result<()> {
        let s = render_with(&jarlsberg(), "/", None)?;
        assert_eq!(s, "<h1>Product</h1>\
                       <h2>Name</h2><p>Jarlsberg</p>\
                       <h2>Nutrients</h2><table><thead><tr><th>Name</th><th>Amount</th></tr></thead>\
                       <tbody><tr><td>Cheese</td><td>50</td></tr>\
                       <tr><td>Sugar</td><td>50</td></tr></tbody></table>\
                       <h2>Note</h2>N/A");
        Ok(())
    }

    #[test]
    fn t_private_fields_not_rendered() -> Result<()> {
        let supplier = Supplier { name: "Tine".into(), contract: "secret terms".into() };
        let s = render_with(&supplier, "/", None)?;
        assert_eq!(s, "<h1>Supplier</h1><h2>Name</h2><p>Tine</p>");
        assert_eq!(supplier.contract, "secret terms");

        let s = render_with(&vec![supplier], "/", None)?;
        assert_eq!(s, "<table><thead><tr><th>Name</th></tr></thead>\
                       <tbody><tr><td>Tine</td></tr></tbody></table>");
        Ok(())
    }

    #[test]
    fn t_scalars() -> Result<()> {
        assert_eq!(render_with(&2.5f64, "/", None)?, "2.5");
        assert_eq!(render_with(&String::from("<b>"), "/", None)?, "<p>&lt;b&gt;</p>");
        assert_eq!(render_with(&None::<u8>, "/", None)?, "N/A");
        Ok(())
    }

    #[test]
    fn t_search_widget() -> Result<()> {
        let s = render_with(&page(), "/?ProductSearch.Name=jarls", None)?;
        assert!(s.starts_with("<h1>Page</h1><h2>Banner</h2><marquee>Hi</marquee>\
                               <h2>Products</h2><form id=\"form-search-Products\" \
                               hx-get=\"/\" hx-target=\"#search-Products\" hx-swap=\"outerHTML\">\
                               <input type=\"search\" name=\"ProductSearch.Name\" value=\"jarls\""),
                "{s}");
        assert!(s.contains("<div id=\"search-Products\"><table>"), "{s}");
        assert!(s.contains("<td>Jarlsberg</td>"), "{s}");
        assert!(s.ends_with("<h2>Count</h2>3"), "{s}");

        let s = render_with(&page(), "/?ProductSearch.Name=brunost", None)?;
        assert!(!s.contains("<td>Jarlsberg</td>"), "{s}");
        Ok(())
    }

    #[test]
    fn t_search_form_sends_all_fields() -> Result<()> {
        let mut registry = SearchRegistry::new();
        registry.register(|c: &PriceSearch| Ok(vec![
            Nutrient { name: c.name.clone(), amount: c.max_price.into() }]))?;
        let templates = default_store();
        let renderer = Renderer::new(&registry, &templates);
        let request = Request::fake_http("GET", "/?PriceSearch.Name=ost", vec![], vec![]);
        let ctx = AContext::new(&request)?;
        let html = HtmlAllocator::new(10000);
        let shop = Shop { prices: SearchLink::new(PriceSearch { name: "".into(), max_price: 100 }) };
        let s = renderer.render(&shop, None, &ctx, &html)?.to_html_fragment_string();
        assert!(s.contains("name=\"PriceSearch.Name\" value=\"ost\""), "{s}");
        assert!(s.contains("name=\"PriceSearch.MaxPrice\" value=\"100\""), "{s}");
        assert_eq!(s.matches("hx-include=\"closest form\"").count(), 2, "{s}");
        Ok(())
    }

    #[test]
    fn t_search_widget_needs_field_name() {
        let e = render_with(&SearchLink::new(ProductSearch { name: "".into() }), "/", None)
            .err().unwrap();
        assert!(matches!(GtmlError::find(&e), Some(GtmlError::RenderFailure(_))));
    }

    #[test]
    fn t_partial() -> Result<()> {
        let s = render_with(&page(), "/?ProductSearch.Name=berg", Some("Products"))?;
        assert!(s.starts_with("<form id=\"form-search-Products\" hx-get=\"/\" \
                               hx-target=\"#search-Products\" hx-swap=\"outerHTML\" \
                               hx-swap-oob=\"true\">"), "{s}");
        assert!(s.contains("<div id=\"search-Products\">"), "{s}");
        assert!(!s.contains("<h1>"), "{s}");

        let e = render_with(&page(), "/", Some("Nope")).err().unwrap();
        assert!(matches!(GtmlError::find(&e), Some(GtmlError::ResourceNotFound(_))));
        let e = render_with(&page(), "/", Some("Count")).err().unwrap();
        assert!(matches!(GtmlError::find(&e), Some(GtmlError::RenderFailure(_))));
        Ok(())
    }

    #[test]
    fn t_form_id_is_no_target() -> Result<()> {
        let id = search_form_id("Products");
        assert_eq!(id, "form-search-Products");
        let request = Request::fake_http("GET", "/", vec![("HX-Target".into(), id)], vec![]);
        assert_eq!(AContext::new(&request)?.search_target(), None);
        let request = Request::fake_http("GET", "/", vec![("HX-Target".into(),
                                                            search_container_id("Products"))],
                                         vec![]);
        assert_eq!(AContext::new(&request)?.search_target(), Some("Products"));
        Ok(())
    }

    #[test]
    fn t_node_limit() {
        let registry = registry();
        let templates = default_store();
        let renderer = Renderer::new(&registry, &templates);
        let request = Request::fake_http("GET", "/", vec![], vec![]);
        let ctx = AContext::new(&request).unwrap();
        let html = HtmlAllocator::new(5);
        let e = renderer.render(&jarlsberg(), None, &ctx, &html).err().unwrap();
        assert!(matches!(GtmlError::find(&e), Some(GtmlError::RenderFailure(_))));
    }
}
