mod bracket_label;
mod price_bracket;
mod price_table;
mod product;
mod resolution;

pub use bracket_label::BracketLabel;
pub use price_bracket::{PriceBracket, RawPremium, RawPriceBracket, coerce_premium};
pub use price_table::{NewPriceTable, PriceTable};
pub use product::{NewProduct, Product, ProductTableLink};
pub use resolution::{NotFoundReason, Resolution};
