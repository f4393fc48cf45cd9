//! Manager API
//!
//! The data model and calling convention every manager implementation,
//! leaf or composite, must honour.

pub mod capability;
pub mod defaults;
pub mod interface;
pub mod pager;


pub use capability::{Capability, CapabilitySet};
pub use interface::{
    BoxedManagerInterface, ErrorCallback, ManagerInterface, StrMap, SuccessCallback,
    INFO_KEY_ENTITY_REFERENCES_MATCH_PREFIX,
};
pub use pager::{BoxedPager, EmptyPager, EntityReferencePager, VecPager};
