//! Table state: the filter/sort/paginate projection and the
//! pagination-window generator.

pub mod pagination;
pub mod projection;
