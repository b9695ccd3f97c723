//! Tag/class queries over a fetched results page.
//!
//! Extraction only ever needs two primitives: every element matching a tag and
//! class in document order, and the first such element under a given element.

use scraper::{ElementRef, Html, Selector};

use crate::{CoreError, CoreResult};

/// A compiled `tag.class` lookup
#[derive(Debug, Clone)]
pub struct Query {
    selector: Selector,
}

impl Query {
    pub fn new(tag: &str, class: Option<&str>) -> CoreResult<Self> {
        let css = match class {
            Some(class) => format!("{}.{}", tag, class),
            None => tag.to_string(),
        };
        let selector =
            Selector::parse(&css).map_err(|_| CoreError::parse("selector", css.clone()))?;
        Ok(Self { selector })
    }

    /// Matches below `element`, in document order.
    pub fn find_all_in<'a>(&self, element: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        element.select(&self.selector).collect()
    }

    pub fn find_first_in<'a>(&self, element: ElementRef<'a>) -> Option<ElementRef<'a>> {
        element.select(&self.selector).next()
    }
}

/// Parsed markup returned by a [`crate::FareSource`].
#[derive(Debug, Clone)]
pub struct ResultsDocument {
    html: Html,
}

impl ResultsDocument {
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    pub fn find_all(&self, query: &Query) -> Vec<ElementRef<'_>> {
        self.html.select(&query.selector).collect()
    }
}

/// Concatenated text content of an element and its descendants.
pub fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect()
}
