//! Reviews: read-side normalization, moderation visibility, and the
//! submission payload accepted from the public forms.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description};

use crate::domain::fields::{self, FieldMap, FieldValue, StoreRecord};
use crate::domain::validation::{ValidationErrors, is_valid_email};

/// Column names in the Reviews table.
pub mod columns {
    pub const PRODUCT: &str = "Product";
    pub const PRODUCTS: &str = "Products";
    pub const PRODUCT_ID: &str = "Product Id";
    pub const DISPLAY_NAME: &str = "Display Name";
    pub const ANONYMOUS: &str = "Anonymous?";
    pub const REVIEWER_NAME: &str = "Reviewer Name";
    pub const EMAIL: &str = "Email";
    pub const ROLE: &str = "Role";
    pub const FLEET_SIZE: &str = "Fleet Size";
    pub const RATING: &str = "Star Rating";
    pub const PROS: &str = "Pros";
    pub const CONS: &str = "Cons";
    pub const WOULD_RECOMMEND: &str = "Would Recommend";
    pub const DATE: &str = "Date";
    pub const STATUS: &str = "Status";

    /// Checkbox names seen across deployments of the Reviews table.
    pub const APPROVED_ALIASES: [&str; 2] = ["Approved", "Approved?"];

    pub const STATUS_APPROVED: &str = "Approved";
    pub const STATUS_PENDING: &str = "Pending";
}

pub const DEFAULT_ROLE: &str = "Other";
pub const DEFAULT_FLEET_SIZE: &str = "Small";
pub const ANONYMOUS_NAME: &str = "Anonymous";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Moderation {
    pub approved: bool,
    pub status: Option<String>,
}

impl Moderation {
    pub fn is_visible(&self) -> bool {
        self.approved || self.status.as_deref() == Some(columns::STATUS_APPROVED)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub product_id: String,
    pub display_name: String,
    pub role: String,
    pub fleet_size: String,
    pub rating: u8,
    pub pros: String,
    pub cons: String,
    pub would_recommend: bool,
    pub date: String,
    #[serde(skip)]
    pub moderation: Moderation,
}

impl Review {
    pub fn is_visible(&self) -> bool {
        self.moderation.is_visible()
    }

    pub fn parsed_date(&self) -> Option<OffsetDateTime> {
        parse_review_date(&self.date)
    }
}

/// `approved_column` is the configured moderation checkbox; the known
/// aliases are also honoured so older tables keep working.
pub fn normalize_review(record: &StoreRecord, approved_column: &str, now: OffsetDateTime) -> Review {
    let f = &record.fields;

    let product_id = [columns::PRODUCT, columns::PRODUCTS]
        .iter()
        .find_map(|column| fields::list(f, column).first().and_then(FieldValue::as_text))
        .or_else(|| fields::text(f, columns::PRODUCT_ID))
        .unwrap_or_default()
        .to_string();

    let approved = fields::truthy(f, approved_column)
        || columns::APPROVED_ALIASES
            .iter()
            .any(|column| fields::truthy(f, column));

    let date = match fields::text(f, columns::DATE) {
        Some(date) => date.to_string(),
        None => format_timestamp(now),
    };

    Review {
        id: record.id.clone(),
        product_id,
        display_name: display_name(f),
        role: fields::text_or(f, columns::ROLE, DEFAULT_ROLE),
        fleet_size: fields::text_or(f, columns::FLEET_SIZE, DEFAULT_FLEET_SIZE),
        rating: fields::coerce_number(f.get(columns::RATING)).round().clamp(0.0, 5.0) as u8,
        pros: fields::text_or(f, columns::PROS, ""),
        cons: fields::text_or(f, columns::CONS, ""),
        would_recommend: fields::truthy(f, columns::WOULD_RECOMMEND),
        date,
        moderation: Moderation {
            approved,
            status: fields::text(f, columns::STATUS).map(str::to_string),
        },
    }
}

fn display_name(f: &FieldMap) -> String {
    if let Some(name) = fields::text(f, columns::DISPLAY_NAME) {
        return name.to_string();
    }
    if fields::truthy(f, columns::ANONYMOUS) {
        return ANONYMOUS_NAME.to_string();
    }
    fields::text_or(f, columns::REVIEWER_NAME, ANONYMOUS_NAME)
}

pub fn format_timestamp(at: OffsetDateTime) -> String {
    at.format(&Rfc3339)
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_review_date(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(at) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(at);
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|date| date.midnight().assume_utc())
}

/// Most recent first. Reviews whose date cannot be parsed sink to the end,
/// keeping their relative order.
pub fn sort_newest_first(reviews: &mut [Review]) {
    reviews.sort_by_cached_key(|review| std::cmp::Reverse(review.parsed_date()));
}

/// Body of a review submission, from JSON or a urlencoded form.
///
/// Any `approved`/`status` keys a caller sends are not part of this type and
/// are dropped during deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReviewSubmission {
    pub product_id: Option<String>,
    pub reviewer_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub fleet_size: Option<String>,
    pub rating: Option<FieldValue>,
    pub pros: Option<String>,
    pub cons: Option<String>,
    pub anonymous: Option<FieldValue>,
    pub would_recommend: Option<FieldValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedReview {
    pub product_id: String,
    pub reviewer_name: String,
    pub email: String,
    pub role: String,
    pub fleet_size: String,
    pub rating: u8,
    pub pros: String,
    pub cons: String,
    pub anonymous: bool,
    pub would_recommend: bool,
}

impl ReviewSubmission {
    pub fn validate(self) -> Result<ValidatedReview, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let product_id = trimmed(self.product_id);
        if product_id.is_empty() {
            errors.push("productId", "is required");
        }

        let rating = parse_rating(self.rating.as_ref());
        if rating.is_none() {
            errors.push("rating", "must be a whole number from 1 to 5");
        }

        let email = trimmed(self.email);
        if !email.is_empty() && !is_valid_email(&email) {
            errors.push("email", "must be a valid email address");
        }

        let role = non_empty_or(self.role, DEFAULT_ROLE);
        let fleet_size = non_empty_or(self.fleet_size, DEFAULT_FLEET_SIZE);

        errors.finish(ValidatedReview {
            product_id,
            reviewer_name: trimmed(self.reviewer_name),
            email,
            role,
            fleet_size,
            rating: rating.unwrap_or_default(),
            pros: trimmed(self.pros),
            cons: trimmed(self.cons),
            anonymous: checkbox(self.anonymous.as_ref()),
            would_recommend: checkbox(self.would_recommend.as_ref()),
        })
    }
}

fn parse_rating(value: Option<&FieldValue>) -> Option<u8> {
    let number = match value? {
        FieldValue::Number(number) => *number,
        FieldValue::Text(raw) => raw.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if number.fract() != 0.0 || !(1.0..=5.0).contains(&number) {
        return None;
    }
    Some(number as u8)
}

/// HTML checkboxes post `on`; JSON callers send booleans. `false`/`off`/`0`
/// in text form are treated as unchecked.
fn checkbox(value: Option<&FieldValue>) -> bool {
    match value {
        Some(FieldValue::Text(raw)) => {
            let raw = raw.trim();
            !(raw.is_empty()
                || raw.eq_ignore_ascii_case("false")
                || raw.eq_ignore_ascii_case("off")
                || raw == "0")
        }
        Some(other) => other.is_truthy(),
        None => false,
    }
}

fn trimmed(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    let value = trimmed(value);
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

/// How the review's product reference is written to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkShape {
    /// Linked-record column: a list holding one record id.
    Linked,
    /// Plain text column holding the id.
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductLink {
    pub column: &'static str,
    pub shape: LinkShape,
}

/// Bindings tried, in order, when writing a review's product reference.
pub const PRODUCT_LINK_CANDIDATES: [ProductLink; 3] = [
    ProductLink {
        column: columns::PRODUCT,
        shape: LinkShape::Linked,
    },
    ProductLink {
        column: columns::PRODUCTS,
        shape: LinkShape::Linked,
    },
    ProductLink {
        column: columns::PRODUCT_ID,
        shape: LinkShape::Text,
    },
];

impl ValidatedReview {
    /// Field bag for a new, unmoderated review.
    pub fn to_fields(
        &self,
        link: ProductLink,
        approved_column: &str,
        submitted_at: OffsetDateTime,
    ) -> FieldMap {
        let mut f = FieldMap::new();

        let link_value = match link.shape {
            LinkShape::Linked => FieldValue::List(vec![FieldValue::from(self.product_id.as_str())]),
            LinkShape::Text => FieldValue::from(self.product_id.as_str()),
        };
        f.insert(link.column.to_string(), link_value);

        f.insert(columns::REVIEWER_NAME.into(), self.reviewer_name.as_str().into());
        f.insert(columns::EMAIL.into(), self.email.as_str().into());
        f.insert(columns::ROLE.into(), self.role.as_str().into());
        f.insert(columns::FLEET_SIZE.into(), self.fleet_size.as_str().into());
        f.insert(columns::RATING.into(), self.rating.into());
        f.insert(columns::PROS.into(), self.pros.as_str().into());
        f.insert(columns::CONS.into(), self.cons.as_str().into());
        f.insert(columns::ANONYMOUS.into(), self.anonymous.into());
        f.insert(columns::WOULD_RECOMMEND.into(), self.would_recommend.into());
        f.insert(columns::DATE.into(), format_timestamp(submitted_at).into());

        f.insert(approved_column.to_string(), false.into());
        f.insert(columns::STATUS.into(), columns::STATUS_PENDING.into());
        f
    }
}
