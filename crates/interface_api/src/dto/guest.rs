//! Guest DTOs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::GuestId;
use domain_guest::{
    Address, ContactNumber, Document, DocumentCategory, Guest, GuestRole, RegisterCompanion,
    RegisterPrimary, RemovedGuest, UpdateProfile,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct AddressDto {
    #[validate(length(min = 1, max = 200, message = "street is required"))]
    pub street: String,
    #[serde(default)]
    #[validate(length(max = 120))]
    pub district: String,
    #[validate(length(min = 1, max = 120, message = "city is required"))]
    pub city: String,
    #[serde(default)]
    #[validate(length(max = 60))]
    pub region: String,
    #[serde(default)]
    #[validate(length(max = 60))]
    pub country: String,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub postal_code: String,
}

impl From<AddressDto> for Address {
    fn from(dto: AddressDto) -> Self {
        Address::new(
            dto.street,
            dto.district,
            dto.city,
            dto.region,
            dto.country,
            dto.postal_code,
        )
    }
}

impl From<&Address> for AddressDto {
    fn from(address: &Address) -> Self {
        Self {
            street: address.street.clone(),
            district: address.district.clone(),
            city: address.city.clone(),
            region: address.region.clone(),
            country: address.country.clone(),
            postal_code: address.postal_code.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(length(min = 2, max = 3, message = "area code must have 2 or 3 digits"))]
    pub area_code: String,
    #[validate(length(min = 1, max = 20, message = "number is required"))]
    pub number: String,
}

impl From<ContactRequest> for ContactNumber {
    fn from(dto: ContactRequest) -> Self {
        ContactNumber::new(dto.area_code, dto.number)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DocumentRequest {
    pub category: DocumentCategory,
    #[validate(length(min = 1, max = 32, message = "number is required"))]
    pub number: String,
    pub issued_date: NaiveDate,
}

impl From<DocumentRequest> for Document {
    fn from(dto: DocumentRequest) -> Self {
        Document::new(dto.category, &dto.number, dto.issued_date)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterPrimaryRequest {
    #[validate(length(min = 1, max = 200, message = "full name is required"))]
    pub full_name: String,
    #[validate(length(min = 1, max = 80, message = "display name is required"))]
    pub display_name: String,
    pub birth_date: NaiveDate,
    #[validate(nested)]
    pub address: AddressDto,
    #[validate(nested)]
    pub contact: ContactRequest,
    #[validate(nested)]
    pub document: DocumentRequest,
}

impl From<RegisterPrimaryRequest> for RegisterPrimary {
    fn from(dto: RegisterPrimaryRequest) -> Self {
        Self {
            full_name: dto.full_name,
            display_name: dto.display_name,
            birth_date: dto.birth_date,
            address: dto.address.into(),
            contact: dto.contact.into(),
            document: dto.document.into(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterCompanionRequest {
    #[validate(length(min = 1, max = 200, message = "full name is required"))]
    pub full_name: String,
    #[validate(length(min = 1, max = 80, message = "display name is required"))]
    pub display_name: String,
    pub birth_date: NaiveDate,
    #[validate(nested)]
    pub document: DocumentRequest,
}

impl From<RegisterCompanionRequest> for RegisterCompanion {
    fn from(dto: RegisterCompanionRequest) -> Self {
        Self {
            full_name: dto.full_name,
            display_name: dto.display_name,
            birth_date: dto.birth_date,
            document: dto.document.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 200))]
    pub full_name: Option<String>,
    #[validate(length(min = 1, max = 80))]
    pub display_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

impl From<UpdateProfileRequest> for UpdateProfile {
    fn from(dto: UpdateProfileRequest) -> Self {
        Self {
            full_name: dto.full_name,
            display_name: dto.display_name,
            birth_date: dto.birth_date,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReassignPrimaryRequest {
    pub primary_id: GuestId,
}

#[derive(Debug, Default, Deserialize)]
pub struct GuestListQuery {
    pub role: Option<GuestRole>,
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub category: DocumentCategory,
    pub number: String,
    pub formatted: String,
    pub issued_date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub area_code: String,
    pub number: String,
    pub formatted: String,
}

#[derive(Debug, Serialize)]
pub struct GuestResponse {
    pub id: GuestId,
    pub role: GuestRole,
    pub full_name: String,
    pub display_name: String,
    pub birth_date: NaiveDate,
    pub registered_at: DateTime<Utc>,
    pub address: Option<AddressDto>,
    pub primary_guest_id: Option<GuestId>,
    pub companion_ids: Vec<GuestId>,
    pub documents: Vec<DocumentResponse>,
    pub contact_numbers: Vec<ContactResponse>,
}

impl From<&Guest> for GuestResponse {
    fn from(guest: &Guest) -> Self {
        Self {
            id: guest.id,
            role: guest.role(),
            full_name: guest.full_name.clone(),
            display_name: guest.display_name.clone(),
            birth_date: guest.birth_date,
            registered_at: guest.registered_at,
            address: guest.address.as_ref().map(AddressDto::from),
            primary_guest_id: guest.primary_guest,
            companion_ids: guest.companions.clone(),
            documents: guest
                .documents
                .iter()
                .map(|d| DocumentResponse {
                    category: d.category,
                    number: d.number.clone(),
                    formatted: d.formatted(),
                    issued_date: d.issued_date,
                })
                .collect(),
            contact_numbers: guest
                .contact_numbers
                .iter()
                .map(|c| ContactResponse {
                    area_code: c.area_code.clone(),
                    number: c.number.clone(),
                    formatted: c.format(),
                })
                .collect(),
        }
    }
}

impl From<Guest> for GuestResponse {
    fn from(guest: Guest) -> Self {
        GuestResponse::from(&guest)
    }
}

/// Outcome of a removal
#[derive(Debug, Serialize)]
pub struct RemovedGuestResponse {
    pub removed: GuestId,
    pub cascaded: Vec<GuestId>,
    pub promoted: Vec<GuestId>,
}

impl From<RemovedGuest> for RemovedGuestResponse {
    fn from(outcome: RemovedGuest) -> Self {
        Self {
            removed: outcome.guest.id,
            cascaded: outcome.cascaded.iter().map(|g| g.id).collect(),
            promoted: outcome.promoted,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentRuleResponse {
    pub category: DocumentCategory,
    pub rule: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_body() -> serde_json::Value {
        serde_json::json!({
            "full_name": "Ana Costa",
            "display_name": "Ana",
            "birth_date": "1990-04-12",
            "address": {
                "street": "Rua A, 100",
                "city": "Sao Paulo",
                "region": "SP",
                "country": "Brazil"
            },
            "contact": { "area_code": "11", "number": "99999-1111" },
            "document": {
                "category": "national_id",
                "number": "529.982.247-25",
                "issued_date": "2012-05-05"
            }
        })
    }

    #[test]
    fn test_register_request_maps_to_workflow_input() {
        let dto: RegisterPrimaryRequest = serde_json::from_value(register_body()).unwrap();
        assert!(dto.validate().is_ok());

        let request = RegisterPrimary::from(dto);
        assert_eq!(request.document.number, "52998224725");
        assert_eq!(request.address.district, "");
        assert_eq!(request.contact.area_code, "11");
    }

    #[test]
    fn test_nested_validation_reports_the_field() {
        let mut body = register_body();
        body["address"]["city"] = serde_json::json!("");
        let dto: RegisterPrimaryRequest = serde_json::from_value(body).unwrap();

        let errors = dto.validate().unwrap_err();
        assert!(errors.errors().contains_key("address"));
    }

    #[test]
    fn test_empty_profile_update_is_valid() {
        let dto = UpdateProfileRequest::default();
        assert!(dto.validate().is_ok());
        assert!(UpdateProfile::from(dto).is_empty());
    }
}
