//! Table of search functions, keyed by the criteria type they take.
//! Filled while the app is set up, read-only once serving.

use std::{any::{Any, TypeId, type_name}, collections::HashMap, fmt};

use anyhow::{Result, anyhow, bail};

use crate::{capability::Data,
            criteria::{Criteria, DynCriteria, check_criteria_schema},
            error::GtmlError,
            info,
            query::QueryString};

type SearchFn = Box<dyn Fn(&dyn Any) -> Result<Box<dyn Data>> + Send + Sync>;

struct Registration {
    criteria_type: &'static str,
    search: SearchFn,
}

#[derive(Default)]
pub struct SearchRegistry {
    searches: HashMap<TypeId, Registration>,
}

impl fmt::Debug for SearchRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.searches.values().map(|r| r.criteria_type))
            .finish()
    }
}

impl SearchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `search` to the criteria type `C`. Fails if the criteria
    /// shape is invalid or if `C` already has a search function (the
    /// existing one stays in place).
    pub fn register<C, R, F>(&mut self, search: F) -> Result<()>
    where C: Criteria + Send + Sync + 'static,
          R: Data + 'static,
          F: Fn(&C) -> Result<R> + Send + Sync + 'static
    {
        check_criteria_schema::<C>()?;
        let key = TypeId::of::<C>();
        if self.searches.contains_key(&key) {
            bail!(GtmlError::DuplicateRegistration(format!(
                "search function for {}", type_name::<C>())))
        }
        info!("registering search for {}", type_name::<C>());
        self.searches.insert(key, Registration {
            criteria_type: type_name::<C>(),
            search: Box::new(move |criteria: &dyn Any| {
                let criteria = criteria.downcast_ref::<C>().ok_or_else(
                    || anyhow!("bug: search for {} called with other criteria",
                               type_name::<C>()))?;
                Ok(Box::new(search(criteria)?) as Box<dyn Data>)
            }),
        });
        Ok(())
    }

    pub fn is_registered(&self, criteria: &dyn DynCriteria) -> bool {
        self.searches.contains_key(&criteria.criteria_type_id())
    }

    /// Run the search function registered for the type of `criteria`.
    pub fn run(&self, criteria: &dyn DynCriteria) -> Result<Box<dyn Data>> {
        match self.searches.get(&criteria.criteria_type_id()) {
            Some(registration) => (registration.search)(criteria.as_any()),
            None => bail!(GtmlError::UnregisteredCriteria(criteria.criteria_type_name())),
        }
    }

    /// Apply the query string overrides to `criteria`, then run the
    /// search on the result. Returns the updated criteria, too.
    pub fn resolve_and_run(
        &self,
        criteria: &dyn DynCriteria,
        query: &QueryString
    ) -> Result<(Box<dyn DynCriteria>, Box<dyn Data>)> {
        let updated = criteria.with_overrides(query)?;
        let results = self.run(&*updated)?;
        Ok((updated, results))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    crate::criteria_record! {
        #[derive(Debug, Clone)]
        struct FruitSearch {
            #[tags = "search"]
            name: String,
        }
    }

    crate::criteria_record! {
        #[derive(Debug, Clone)]
        struct VegetableSearch {
            #[tags = "search"]
            name: String,
        }
    }

    crate::criteria_record! {
        #[derive(Debug, Clone)]
        struct BadSearch {
            #[tags = "serach"]
            name: String,
        }
    }

    const FRUITS: &[&str] = &["Apple", "Banana", "Pineapple"];

    fn fruit_search(c: &FruitSearch) -> Result<Vec<String>> {
        let needle = c.name.to_lowercase();
        Ok(FRUITS.iter()
           .filter(|f| f.to_lowercase().contains(&needle))
           .map(|f| f.to_string())
           .collect())
    }

    #[test]
    fn t_register_and_run() -> Result<()> {
        let mut r = SearchRegistry::new();
        r.register(fruit_search)?;
        let c = FruitSearch { name: "apple".into() };
        assert!(r.is_registered(&c));
        assert_eq!(r.run(&c)?.text(), "[Apple Pineapple]");

        let (updated, results) = r.resolve_and_run(
            &c, &QueryString::new(&[("FruitSearch.Name", "BAN")]))?;
        assert_eq!(updated.field_segment(0).as_deref(), Some("BAN"));
        assert_eq!(results.text(), "[Banana]");
        Ok(())
    }

    #[test]
    fn t_duplicate() -> Result<()> {
        let mut r = SearchRegistry::new();
        r.register(fruit_search)?;
        let e = r.register(|_: &FruitSearch| Ok(vec![String::from("Cherry")]))
            .err().unwrap();
        assert!(matches!(GtmlError::find(&e), Some(GtmlError::DuplicateRegistration(_))));
        // the first registration remains active
        assert_eq!(r.run(&FruitSearch { name: "".into() })?.text(),
                   "[Apple Banana Pineapple]");
        Ok(())
    }

    #[test]
    fn t_unregistered() {
        let mut r = SearchRegistry::new();
        r.register(fruit_search).unwrap();
        let e = r.run(&VegetableSearch { name: "".into() }).err().unwrap();
        assert!(matches!(GtmlError::find(&e), Some(GtmlError::UnregisteredCriteria(_))));
    }

    #[test]
    fn t_invalid_shape() {
        let mut r = SearchRegistry::new();
        let e = r.register(|_: &BadSearch| Ok(0u32)).err().unwrap();
        assert!(matches!(GtmlError::find(&e), Some(GtmlError::InvalidCriteriaShape { .. })));
    }
}
