pub mod product;
pub mod pricing;
pub mod cart;

pub use product::{Cabin, Service};
pub use pricing::StayQuote;
pub use cart::{CartError, CartItem, ExtraLine, ServiceCart};
