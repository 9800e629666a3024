#![forbid(unsafe_code)]

//! Sectioned list data for table- and collection-style views.
//!
//! [`SectionModel`] is the value a props field carries; [`SectionedDataSource`]
//! is the sink a list view reads from. Binding the two reloads the data source
//! on every change of the sections field:
//!
//! ```ignore
//! let source = SectionedDataSource::new();
//! connection
//!     .binder(|p: &Props| p.sections.clone())
//!     .map(|sections: Vec<SectionModel<String, u32>>| {
//!         sections.into_iter().map(SectionModel::sorted).collect()
//!     })
//!     .to(source.clone());
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use super::sink::Sink;

/// One section of a list: a header plus its rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SectionModel<H, I> {
    pub header: H,
    pub items: Vec<I>,
}

impl<H, I> SectionModel<H, I> {
    #[must_use]
    pub fn new(header: H, items: Vec<I>) -> Self {
        Self { header, items }
    }

    /// Transform every row, keeping the header.
    pub fn map_items<J>(self, f: impl FnMut(I) -> J) -> SectionModel<H, J> {
        SectionModel {
            header: self.header,
            items: self.items.into_iter().map(f).collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<H, I: Ord> SectionModel<H, I> {
    /// Same section with rows in ascending order.
    #[must_use]
    pub fn sorted(mut self) -> Self {
        self.items.sort();
        self
    }
}

/// Reload-on-push data source backing a sectioned list view.
///
/// Cloning shares the data.
pub struct SectionedDataSource<H, I> {
    sections: Rc<RefCell<Vec<SectionModel<H, I>>>>,
    reloads: Rc<Cell<u64>>,
}

impl<H, I> SectionedDataSource<H, I> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sections: Rc::new(RefCell::new(Vec::new())),
            reloads: Rc::new(Cell::new(0)),
        }
    }

    #[must_use]
    pub fn number_of_sections(&self) -> usize {
        self.sections.borrow().len()
    }

    /// Rows in `section`, zero when out of range.
    #[must_use]
    pub fn number_of_items(&self, section: usize) -> usize {
        self.sections.borrow().get(section).map_or(0, SectionModel::len)
    }

    /// How many times the data was replaced.
    #[must_use]
    pub fn reload_count(&self) -> u64 {
        self.reloads.get()
    }
}

impl<H: Clone, I: Clone> SectionedDataSource<H, I> {
    #[must_use]
    pub fn item(&self, section: usize, row: usize) -> Option<I> {
        self.sections
            .borrow()
            .get(section)
            .and_then(|s| s.items.get(row))
            .cloned()
    }

    #[must_use]
    pub fn header(&self, section: usize) -> Option<H> {
        self.sections.borrow().get(section).map(|s| s.header.clone())
    }

    /// Copy of all sections.
    #[must_use]
    pub fn sections(&self) -> Vec<SectionModel<H, I>> {
        self.sections.borrow().clone()
    }
}

impl<H, I> Clone for SectionedDataSource<H, I> {
    fn clone(&self) -> Self {
        Self {
            sections: Rc::clone(&self.sections),
            reloads: Rc::clone(&self.reloads),
        }
    }
}

impl<H, I> Default for SectionedDataSource<H, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H, I> fmt::Debug for SectionedDataSource<H, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectionedDataSource")
            .field("sections", &self.number_of_sections())
            .field("reloads", &self.reloads.get())
            .finish()
    }
}

impl<H, I> Sink<Vec<SectionModel<H, I>>> for SectionedDataSource<H, I> {
    fn accept(&self, sections: Vec<SectionModel<H, I>>) {
        *self.sections.borrow_mut() = sections;
        self.reloads.set(self.reloads.get() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_sorted_and_mapped() {
        let section = SectionModel::new("s", vec![34, 12]).sorted();
        assert_eq!(section.items, vec![12, 34]);
        let labels = section.map_items(|n| n.to_string());
        assert_eq!(labels.items, vec!["12".to_string(), "34".to_string()]);
        assert_eq!(labels.header, "s");
    }

    #[test]
    fn data_source_reloads_on_push() {
        let source = SectionedDataSource::new();
        assert_eq!(source.number_of_sections(), 0);
        source.accept(vec![SectionModel::new("section", vec![12, 34])]);
        assert_eq!(source.number_of_sections(), 1);
        assert_eq!(source.number_of_items(0), 2);
        assert_eq!(source.item(0, 1), Some(34));
        assert_eq!(source.header(0), Some("section"));
        assert_eq!(source.reload_count(), 1);
    }

    #[test]
    fn out_of_range_lookups() {
        let source: SectionedDataSource<&str, i32> = SectionedDataSource::new();
        assert_eq!(source.number_of_items(3), 0);
        assert_eq!(source.item(0, 0), None);
        assert_eq!(source.header(1), None);
    }
}
