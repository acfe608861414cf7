use serde::Deserialize;

use crate::domain::fields::{FieldMap, FieldValue};
use crate::domain::validation::{ValidationErrors, is_valid_email};

pub mod columns {
    pub const PRODUCT: &str = "Product";
    pub const NAME: &str = "Lead Name";
    pub const EMAIL: &str = "Email";
    pub const COMPANY: &str = "Company";
    pub const ROLE: &str = "Role";
    pub const MESSAGE: &str = "Message";
    pub const SOURCE: &str = "Source";
    pub const STATUS: &str = "Status";
}

pub const LEAD_SOURCE: &str = "Website form";
pub const LEAD_STATUS_NEW: &str = "New";

/// Demo/contact request posted from a product page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LeadSubmission {
    pub product_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub role: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLead {
    pub product_id: String,
    pub name: String,
    pub email: String,
    pub company: String,
    pub role: String,
    pub message: String,
}

impl LeadSubmission {
    pub fn validate(self) -> Result<ValidatedLead, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = trimmed(self.name);
        if name.is_empty() {
            errors.push("name", "is required");
        }

        let email = trimmed(self.email);
        if !is_valid_email(&email) {
            errors.push("email", "must be a valid email address");
        }

        errors.finish(ValidatedLead {
            product_id: trimmed(self.product_id),
            name,
            email,
            company: trimmed(self.company),
            role: trimmed(self.role),
            message: trimmed(self.message),
        })
    }
}

impl ValidatedLead {
    pub fn to_fields(&self) -> FieldMap {
        let mut f = FieldMap::new();
        if !self.product_id.is_empty() {
            f.insert(
                columns::PRODUCT.into(),
                FieldValue::List(vec![self.product_id.as_str().into()]),
            );
        }
        f.insert(columns::NAME.into(), self.name.as_str().into());
        f.insert(columns::EMAIL.into(), self.email.as_str().into());
        f.insert(columns::COMPANY.into(), self.company.as_str().into());
        f.insert(columns::ROLE.into(), self.role.as_str().into());
        f.insert(columns::MESSAGE.into(), self.message.as_str().into());
        f.insert(columns::SOURCE.into(), LEAD_SOURCE.into());
        f.insert(columns::STATUS.into(), LEAD_STATUS_NEW.into());
        f
    }
}

fn trimmed(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}
