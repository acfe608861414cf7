//! Builders for the record store's `filterByFormula` expressions.
//!
//! String literals are always single-quoted with `\` and `'` escaped, so
//! caller input never changes the shape of the expression.

use crate::domain::products::{SLUG_SUBSTITUTIONS, columns as product_columns};
use crate::domain::reviews::{LinkShape, ProductLink, columns as review_columns};

/// Quote `value` as a formula string literal.
pub fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for ch in value.chars() {
        if ch == '\\' || ch == '\'' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('\'');
    quoted
}

/// Reference a column by name.
pub fn field(name: &str) -> String {
    format!("{{{name}}}")
}

/// Match products whose explicit slug or name-derived slug equals `slug`,
/// ignoring case. The derived side mirrors [`crate::domain::products::derive_slug`].
pub fn slug_match(slug: &str) -> String {
    let wanted = quote(&slug.to_lowercase());

    let derived = SLUG_SUBSTITUTIONS.iter().fold(
        field(product_columns::NAME),
        |expr, (from, to)| format!("SUBSTITUTE({expr},{},{})", quote(from), quote(to)),
    );

    format!(
        "OR(LOWER({})={wanted},LOWER({derived})={wanted})",
        field(product_columns::SLUG)
    )
}

/// Match records whose linked-record column contains exactly `id`.
pub fn linked_equals(column: &str, id: &str) -> String {
    format!("ARRAYJOIN({})={}", field(column), quote(id))
}

/// Match reviews pointing at `id` through `link`, whichever shape it has.
pub fn links_to(link: ProductLink, id: &str) -> String {
    match link.shape {
        LinkShape::Linked => linked_equals(link.column, id),
        LinkShape::Text => format!("{}={}", field(link.column), quote(id)),
    }
}

/// Match reviews that passed moderation through either the checkbox or the status.
pub fn approved(approved_column: &str) -> String {
    format!(
        "OR({}=TRUE(),{}={})",
        field(approved_column),
        field(review_columns::STATUS),
        quote(review_columns::STATUS_APPROVED)
    )
}

/// Conjunction of `parts`; a single part is returned as-is.
pub fn and(parts: &[String]) -> Option<String> {
    match parts {
        [] => None,
        [single] => Some(single.clone()),
        many => Some(format!("AND({})", many.join(","))),
    }
}
