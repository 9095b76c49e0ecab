//! Registering getters and search functions, and serving requests
//! with the result.

use std::{any::type_name, fmt::Debug, marker::PhantomData, sync::Arc};

use anyhow::{Context, Result};
use rouille::{Request, Response};

use crate::{acontext::{AContext, HX_PUSH_URL},
            capability::Data,
            criteria::Criteria,
            engine::Renderer,
            error::{GtmlError, error_response},
            html::{HtmlAllocator, Print},
            http_response_status_codes::HttpResponseStatusCode,
            info,
            path_codec::{LinkShape, PathParams, path_segments, route_pattern},
            router::PatternRouter,
            search_registry::SearchRegistry,
            templates::TemplateStore};

pub const DEFAULT_MAX_HTML_NODES: u32 = 100_000;

/// Produces the value to render for the path parameters of a route.
pub trait GetHandler: Debug + Send + Sync {
    fn call(&self, params: &PathParams) -> Result<Box<dyn Data>>;
}

pub struct FnGetHandler<L, R, F>
where L: LinkShape,
      R: Data + 'static,
      F: Fn(L) -> Result<R> + Send + Sync
{
    phantom: PhantomData<fn(L) -> R>,
    getter: F,
}

impl<L, R, F> FnGetHandler<L, R, F>
where L: LinkShape,
      R: Data + 'static,
      F: Fn(L) -> Result<R> + Send + Sync
{
    pub fn new(getter: F) -> Self {
        FnGetHandler {
            phantom: PhantomData,
            getter,
        }
    }
}

impl<L, R, F> GetHandler for FnGetHandler<L, R, F>
where L: LinkShape,
      R: Data + 'static,
      F: Fn(L) -> Result<R> + Send + Sync
{
    fn call(&self, params: &PathParams) -> Result<Box<dyn Data>> {
        let link = L::from_params(params)?;
        Ok(Box::new((self.getter)(link)?))
    }
}

impl<L, R, F> Debug for FnGetHandler<L, R, F>
where L: LinkShape,
      R: Data + 'static,
      F: Fn(L) -> Result<R> + Send + Sync
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(type_name::<Self>())
    }
}


/// Collects routes and search functions; `build` turns it into the
/// `App` that serves them.
#[derive(Debug)]
pub struct Registrar {
    router: PatternRouter<Box<dyn GetHandler>>,
    registry: SearchRegistry,
}

impl Registrar {
    pub fn new() -> Self {
        Registrar {
            router: PatternRouter::new(),
            registry: SearchRegistry::new(),
        }
    }

    /// Serve the result of `getter` at the route derived from its link
    /// type `L`.
    pub fn register_get<L, R, F>(&mut self, getter: F) -> Result<&mut Self>
    where L: LinkShape + 'static,
          R: Data + 'static,
          F: Fn(L) -> Result<R> + Send + Sync + 'static
    {
        let schema = L::shape_schema();
        schema.check().map_err(|reason| GtmlError::InvalidLinkShape {
            shape: type_name::<L>(),
            reason
        })?;
        let pattern = route_pattern(schema);
        info!("registering GET {pattern} for {}", type_name::<L>());
        self.router.add(&pattern, Box::new(FnGetHandler::new(getter)))
            .with_context(|| format!("registering getter for {}", type_name::<L>()))?;
        Ok(self)
    }

    /// Make `searcher` the search function for criteria of type `C`.
    pub fn register_search<C, R, F>(&mut self, searcher: F) -> Result<&mut Self>
    where C: Criteria + Send + Sync + 'static,
          R: Data + 'static,
          F: Fn(&C) -> Result<R> + Send + Sync + 'static
    {
        self.registry.register(searcher)?;
        Ok(self)
    }

    pub fn build(self, templates: Arc<TemplateStore>, max_html_nodes: u32) -> App {
        App {
            router: self.router,
            registry: self.registry,
            templates,
            max_html_nodes,
        }
    }
}


/// Immutable once built; share it between the server threads.
#[derive(Debug)]
pub struct App {
    router: PatternRouter<Box<dyn GetHandler>>,
    registry: SearchRegistry,
    templates: Arc<TemplateStore>,
    max_html_nodes: u32,
}

fn not_found_response() -> Response {
    let status = HttpResponseStatusCode::NotFound404;
    Response::text(format!("{} - {}", status.code(), status.title()))
        .with_status_code(status.code())
}

impl App {
    pub fn handle(&self, request: &Request) -> Response {
        match self.try_handle(request) {
            Ok(Some(response)) => response,
            Ok(None) => not_found_response(),
            Err(e) => error_response(&e),
        }
    }

    fn try_handle(&self, request: &Request) -> Result<Option<Response>> {
        let ctx = AContext::new(request)?;
        let segments = path_segments(ctx.path_str())?;
        let (handler, params) = match self.router.get(&segments) {
            Some(found) => found,
            None => return Ok(None),
        };
        let value = handler.call(&params)?;

        let html = HtmlAllocator::new(self.max_html_nodes);
        let renderer = Renderer::new(&self.registry, &self.templates);
        if let Some(label) = ctx.search_target() {
            info!("partial update of {label:?} for {:?}", ctx.raw_url());
            let node = renderer.render_partial(&*value, label, &ctx, &html)?;
            Ok(Some(Response::html(node.to_html_fragment_string())
                    .with_unique_header(HX_PUSH_URL, ctx.raw_url().to_string())))
        } else {
            let node = renderer.render_page(&*value, &ctx, &html)?;
            Ok(Some(Response::html(node.to_html_document_string())))
        }
    }

    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.router.patterns().iter().map(|p| p.as_str())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{criteria::SearchLink, templates::default_store};

    crate::link_record! {
        pub struct ItemLink {
            pub item: String,
        }
    }

    crate::link_record! {
        pub struct NumberLink {
            pub number: u32,
        }
    }

    crate::link_record! {
        pub struct OtherItemLink {
            pub item: String,
        }
    }

    crate::record! {
        pub struct BadLink {
            #[tags = "link"]
            pub item: String,
        }
    }

    impl LinkShape for BadLink {
        fn shape_schema() -> &'static crate::schema::Schema {
            Self::gtml_schema()
        }
        fn from_params(params: &PathParams) -> Result<Self> {
            Ok(BadLink { item: params.decode_field(Self::shape_schema(), "item")? })
        }
    }

    crate::criteria_record! {
        #[derive(Clone)]
        pub struct ItemSearch {
            #[tags = "search"]
            pub name: String,
        }
    }

    crate::record! {
        pub struct Home {
            pub items: SearchLink<ItemSearch>,
        }
    }

    fn app() -> Result<App> {
        let mut r = Registrar::new();
        r.register_get(|_: ()| Ok(Home { items: SearchLink::new(ItemSearch { name: "".into() }) }))?
            .register_get(|l: ItemLink| if l.item == "missing" {
                Err(GtmlError::ResourceNotFound(format!("item {:?}", l.item)).into())
            } else {
                Ok(l.item)
            })?
            .register_get(|l: NumberLink| Ok(l.number * 2))?
            .register_search(|c: &ItemSearch| Ok(vec![ItemLink { item: c.name.clone() }]))?;
        Ok(r.build(default_store(), DEFAULT_MAX_HTML_NODES))
    }

    fn body(response: Response) -> String {
        use std::io::Read;
        let (mut reader, _) = response.data.into_reader_and_size();
        let mut s = String::new();
        reader.read_to_string(&mut s).unwrap();
        s
    }

    fn get(app: &App, url: &str, headers: Vec<(String, String)>) -> Response {
        app.handle(&Request::fake_http("GET", url, headers, vec![]))
    }

    #[test]
    fn t_routes() -> Result<()> {
        let app = app()?;
        assert_eq!(app.routes().collect::<Vec<_>>(), vec!["/", "/Item/{Item}", "/Number/{Number}"]);

        let r = get(&app, "/Item/Brown%20cheese", vec![]);
        assert_eq!(r.status_code, 200);
        assert!(body(r).contains("<body><p>Brown cheese</p></body>"));

        let r = get(&app, "/Number/21", vec![]);
        assert!(body(r).contains("<body>42</body>"));

        let r = get(&app, "/Number/twenty", vec![]);
        assert_eq!(r.status_code, 500);
        assert!(body(r).starts_with("500 - ERROR: decoding failure: "));

        let r = get(&app, "/Item/missing", vec![]);
        assert_eq!(r.status_code, 500);
        assert_eq!(body(r), "500 - ERROR: item \"missing\" not found");

        let r = get(&app, "/Item", vec![]);
        assert_eq!(r.status_code, 404);
        assert_eq!(body(r), "404 - Not Found");
        Ok(())
    }

    #[test]
    fn t_partial() -> Result<()> {
        let app = app()?;
        let url = "/?ItemSearch.Name=x";
        let r = get(&app, url, vec![("HX-Target".into(), "search-Items".into())]);
        assert_eq!(r.status_code, 200);
        let push_url = r.headers.iter().find(|(k, _)| k == "HX-Push-Url").map(|(_, v)| v.to_string());
        assert_eq!(push_url.as_deref(), Some(url));
        let s = body(r);
        assert!(s.starts_with("<form id=\"form-search-Items\""), "{s}");
        assert!(s.contains("<div id=\"search-Items\"><table><thead><tr><th>Item</th></tr></thead>\
                           <tbody><tr><td>x</td></tr></tbody></table></div>"), "{s}");
        assert!(!s.contains("<body>"), "{s}");

        let r = get(&app, url, vec![("HX-Target".into(), "search-Other".into())]);
        assert_eq!(r.status_code, 500);
        Ok(())
    }

    #[test]
    fn t_registration_errors() {
        let mut r = Registrar::new();
        r.register_get(|l: ItemLink| Ok(l.item)).unwrap();
        let e = r.register_get(|l: OtherItemLink| Ok(l.item)).err().unwrap();
        assert!(matches!(GtmlError::find(&e), Some(GtmlError::DuplicateRegistration(_))));

        let e = r.register_get(|l: BadLink| Ok(l.item)).err().unwrap();
        assert!(matches!(GtmlError::find(&e), Some(GtmlError::InvalidLinkShape { .. })));

        r.register_search(|_: &ItemSearch| Ok(0u8)).unwrap();
        let e = r.register_search(|_: &ItemSearch| Ok(1u8)).err().unwrap();
        assert!(matches!(GtmlError::find(&e), Some(GtmlError::DuplicateRegistration(_))));
    }
}
