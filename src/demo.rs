//! Example data and routes: products, and shopping lists of them.

use std::{collections::BTreeMap, fmt, sync::Arc};

use anyhow::Result;
use lazy_static::lazy_static;

use crate::{capability::{Linkable, SelfRendering},
            criteria::SearchLink,
            error::GtmlError,
            html::{HtmlAllocator, Node},
            path_codec::Link,
            registrar::{App, Registrar},
            templates::TemplateStore};

crate::link_record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct ProductLink {
        pub product: String,
    }
}

crate::link_record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct ShoppingListLink {
        pub shopping_list: String,
    }
}

crate::criteria_record! {
    #[derive(Debug, Clone, Default)]
    pub struct ShoppingListSearch {
        #[tags = "search"]
        pub name: String,
    }
}

crate::criteria_record! {
    #[derive(Debug, Clone, Default)]
    pub struct ProductSearch {
        #[tags = "search"]
        pub name: String,
    }
}

crate::record! {
    #[derive(Debug)]
    pub struct Nutrient {
        pub name: String,
        pub amount: f64,
    }
}

crate::record! {
    #[derive(Debug)]
    pub struct Product: Linkable, Display {
        pub name: String,
        pub description: String,
        pub nutrients: Vec<Nutrient>,
    }
}

impl Linkable for Product {
    fn link(&self) -> Box<dyn Link> {
        Box::new(ProductLink { product: self.name.clone() })
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

crate::record! {
    #[derive(Debug)]
    pub struct Item {
        pub product: Arc<Product>,
        pub quantity: i32,
    }
}

crate::record! {
    #[derive(Debug)]
    pub struct CustomHtml: SelfRendering {}
}

impl SelfRendering for CustomHtml {
    fn html(&self, html: &HtmlAllocator) -> Result<Node> {
        html.span([], [html.staticstr("this is a test")?])
    }
}

crate::record! {
    #[derive(Debug)]
    pub struct ShoppingList: Linkable {
        pub name: String,
        pub description: String,
        pub items: Vec<Item>,
        #[tags = "table-hide"]
        pub custom_html: CustomHtml,
    }
}

impl Linkable for ShoppingList {
    fn link(&self) -> Box<dyn Link> {
        Box::new(ShoppingListLink { shopping_list: self.name.clone() })
    }
}

crate::record! {
    pub struct Index {
        pub shopping_lists: SearchLink<ShoppingListSearch>,
        pub products: Vec<Arc<Product>>,
        pub product_search: SearchLink<ProductSearch>,
    }
}


lazy_static! {
    static ref PRODUCTS: BTreeMap<&'static str, Arc<Product>> = {
        let mut m = BTreeMap::new();
        m.insert("Jarlsberg", Arc::new(Product {
            name: "Jarlsberg".into(),
            description: "A mild nutty Alpine-style cheese from Norway".into(),
            nutrients: vec![
                Nutrient { name: "Cheese".into(), amount: 50. },
                Nutrient { name: "Sugar".into(), amount: 50. },
            ],
        }));
        m.insert("Kvikk-Lunsj", Arc::new(Product {
            name: "Kvikk-Lunsj".into(),
            description: "The superior version of KitKat".into(),
            nutrients: vec![],
        }));
        m
    };

    static ref SHOPPING_LISTS: BTreeMap<&'static str, Arc<ShoppingList>> = {
        let items = |a, b| vec![
            Item { product: PRODUCTS["Jarlsberg"].clone(), quantity: a },
            Item { product: PRODUCTS["Kvikk-Lunsj"].clone(), quantity: b },
        ];
        let mut m = BTreeMap::new();
        m.insert("My Shopping List", Arc::new(ShoppingList {
            name: "My Shopping List".into(),
            description: "Stuff I buy before and after work".into(),
            items: items(10, 100),
            custom_html: CustomHtml {},
        }));
        m.insert("Not My Shopping List", Arc::new(ShoppingList {
            name: "Not My Shopping List".into(),
            description: "Stuff I don't buy before and after work".into(),
            items: items(-10, -100),
            custom_html: CustomHtml {},
        }));
        m
    };
}

pub fn index(_: ()) -> Result<Index> {
    Ok(Index {
        shopping_lists: SearchLink::new(ShoppingListSearch::default()),
        products: PRODUCTS.values().cloned().collect(),
        product_search: SearchLink::new(ProductSearch::default()),
    })
}

pub fn product(link: ProductLink) -> Result<Arc<Product>> {
    match PRODUCTS.get(link.product.as_str()) {
        Some(p) => Ok(p.clone()),
        None => Err(GtmlError::ResourceNotFound(
            format!("product {:?}", link.product)).into()),
    }
}

pub fn shopping_list(link: ShoppingListLink) -> Result<Arc<ShoppingList>> {
    match SHOPPING_LISTS.get(link.shopping_list.as_str()) {
        Some(l) => Ok(l.clone()),
        None => Err(GtmlError::ResourceNotFound(
            format!("shopping list {:?}", link.shopping_list)).into()),
    }
}

fn name_matches(name: &str, search_term: &str) -> bool {
    name.to_lowercase().contains(&search_term.to_lowercase())
}

pub fn search_shopping_lists(criteria: &ShoppingListSearch) -> Result<Vec<Arc<ShoppingList>>> {
    Ok(SHOPPING_LISTS.values()
       .filter(|l| name_matches(&l.name, &criteria.name))
       .cloned()
       .collect())
}

pub fn search_products(criteria: &ProductSearch) -> Result<Vec<Arc<Product>>> {
    Ok(PRODUCTS.values()
       .filter(|p| name_matches(&p.name, &criteria.name))
       .cloned()
       .collect())
}

/// All demo routes and searches, ready to serve.
pub fn app(templates: Arc<TemplateStore>, max_html_nodes: u32) -> Result<App> {
    let mut registrar = Registrar::new();
    registrar
        .register_get(index)?
        .register_get(product)?
        .register_get(shopping_list)?
        .register_search(search_shopping_lists)?
        .register_search(search_products)?;
    Ok(registrar.build(templates, max_html_nodes))
}
