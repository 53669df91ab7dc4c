//! Plain data types shared by the catalog, the order processor and the shop facade.

mod order;
mod product;

pub use order::*;
pub use product::*;
