//! Collection domain types

mod item;

pub use item::{Collection, Folder};
