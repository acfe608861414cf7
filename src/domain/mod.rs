//! Pure domain types: store field values, the product/review/lead
//! projections built from them, filter formulas and catalog facets.

pub mod catalog;
pub mod fields;
pub mod formula;
pub mod leads;
pub mod products;
pub mod reviews;
pub mod validation;
