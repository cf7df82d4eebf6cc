use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use laundry_core::{Document, DocumentId, DomainError, DomainResult};

laundry_core::document_id!(
    /// Supplier identifier.
    SupplierId
);

/// Supplier account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupplierStatus {
    Active,
    Inactive,
}

/// Input for registering a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSupplier {
    pub company_name: String,
    pub contact_person: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// A supplier that reorder requests are addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    id: SupplierId,
    company_name: String,
    contact_person: String,
    email: String,
    phone: Option<String>,
    status: SupplierStatus,
    created_at: DateTime<Utc>,
}

impl Supplier {
    /// Validate input and build an active supplier.
    pub fn register(input: NewSupplier, now: DateTime<Utc>) -> DomainResult<Self> {
        let company_name = required("companyName", &input.company_name)?;
        let contact_person = required("contactPerson", &input.contact_person)?;
        let email = required("email", &input.email)?.to_ascii_lowercase();
        if !looks_like_email(&email) {
            return Err(DomainError::validation(format!("email is not valid: {email}")));
        }
        let phone = input
            .phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        Ok(Self {
            id: SupplierId::new(),
            company_name,
            contact_person,
            email,
            phone,
            status: SupplierStatus::Active,
            created_at: now,
        })
    }

    pub fn id_typed(&self) -> SupplierId {
        self.id
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn contact_person(&self) -> &str {
        &self.contact_person
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn status(&self) -> SupplierStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Document for Supplier {
    const COLLECTION: &'static str = "suppliers";

    fn document_id(&self) -> DocumentId {
        self.id.document_id()
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.email.clone())
    }
}

fn required(field: &str, value: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.ends_with('.'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> NewSupplier {
        NewSupplier {
            company_name: "  CleanCo  ".to_string(),
            contact_person: "Dana".to_string(),
            email: "Orders@CleanCo.example".to_string(),
            phone: Some("   ".to_string()),
        }
    }

    #[test]
    fn register_trims_and_normalizes() {
        let supplier = Supplier::register(input(), Utc::now()).unwrap();
        assert_eq!(supplier.company_name(), "CleanCo");
        assert_eq!(supplier.email(), "orders@cleanco.example");
        assert_eq!(supplier.phone(), None);
        assert_eq!(supplier.status(), SupplierStatus::Active);
        assert_eq!(supplier.unique_key().as_deref(), Some("orders@cleanco.example"));
    }

    #[test]
    fn register_rejects_blank_company_name() {
        let mut bad = input();
        bad.company_name = " ".to_string();
        let err = Supplier::register(bad, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("companyName")));
    }

    #[test]
    fn register_rejects_malformed_email() {
        for email in ["nobody", "@x.io", "a@localhost", "a@x."] {
            let mut bad = input();
            bad.email = email.to_string();
            assert!(
                matches!(Supplier::register(bad, Utc::now()), Err(DomainError::Validation(_))),
                "{email} should be rejected"
            );
        }
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let supplier = Supplier::register(input(), Utc::now()).unwrap();
        let json = serde_json::to_value(&supplier).unwrap();
        assert_eq!(json["companyName"], "CleanCo");
        assert_eq!(json["status"], "active");
    }
}
