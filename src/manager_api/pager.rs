//! Relationship Query Paging

use crate::context::HostSession;
use crate::entity_reference::EntityReference;
use crate::errors::Result;

/// Cursor over the pages of a relationship query result
pub trait EntityReferencePager: Send {
    /// Check if a page follows the current one
    fn has_next(&mut self, host_session: &HostSession) -> Result<bool>;

    /// References on the current page. Empty once the results are exhausted.
    fn get(&mut self, host_session: &HostSession) -> Result<Vec<EntityReference>>;

    /// Advance to the next page
    fn next(&mut self, host_session: &HostSession) -> Result<()>;
}

/// Owned pager handle delivered to success callbacks
pub type BoxedPager = Box<dyn EntityReferencePager>;

/// Pager with no results
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyPager;

impl EntityReferencePager for EmptyPager {
    fn has_next(&mut self, _host_session: &HostSession) -> Result<bool> {
        Ok(false)
    }

    fn get(&mut self, _host_session: &HostSession) -> Result<Vec<EntityReference>> {
        Ok(Vec::new())
    }

    fn next(&mut self, _host_session: &HostSession) -> Result<()> {
        Ok(())
    }
}

/// Pager over a precomputed list of references
#[derive(Debug, Clone)]
pub struct VecPager {
    references: Vec<EntityReference>,
    page_size: usize,
    offset: usize,
}

impl VecPager {
    /// A `page_size` of zero is treated as one
    pub fn new(references: Vec<EntityReference>, page_size: usize) -> Self {
        Self { references, page_size: page_size.max(1), offset: 0 }
    }
}

impl EntityReferencePager for VecPager {
    fn has_next(&mut self, _host_session: &HostSession) -> Result<bool> {
        Ok(self.offset.saturating_add(self.page_size) < self.references.len())
    }

    fn get(&mut self, _host_session: &HostSession) -> Result<Vec<EntityReference>> {
        let start = self.offset.min(self.references.len());
        let end = self.offset.saturating_add(self.page_size).min(self.references.len());
        Ok(self.references[start..end].to_vec())
    }

    fn next(&mut self, _host_session: &HostSession) -> Result<()> {
        if self.offset < self.references.len() {
            self.offset = self.offset.saturating_add(self.page_size);
        }
        Ok(())
    }
}
