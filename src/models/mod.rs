use crate::utils::{ApiError, ApiResult};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The two kinds of account the backend serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Pacilian,
    Caregiver,
}

impl Role {
    /// Wire value embedded in tokens and responses
    pub fn value(&self) -> &'static str {
        match self {
            Role::Pacilian => "PACILIAN",
            Role::Caregiver => "CAREGIVER",
        }
    }

    /// Authority string consumed by downstream authorization checks
    pub fn authority(&self) -> String {
        format!("ROLE_{}", self.value())
    }

    pub fn contains(value: &str) -> bool {
        Self::from_value(value).is_some()
    }

    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "PACILIAN" => Some(Role::Pacilian),
            "CAREGIVER" => Some(Role::Caregiver),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

/// Caregiver practice areas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Speciality {
    DokterUmum,
    SpesialisAnak,
    SpesialisKulit,
    SpesialisPenyakitDalam,
}

/// Contact and role-specific details kept alongside an identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub address: String,
    pub phone_number: String,
    /// Pacilian only
    pub medical_history: Option<String>,
    /// Caregiver only
    pub speciality: Option<Speciality>,
    /// Caregiver only
    pub work_address: Option<String>,
}

/// Stored identity record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub nik: String,
    pub role: Role,
    #[serde(default)]
    pub profile: Profile,
    pub created_at: DateTime<Utc>,
}

/// The authenticated principal held in the per-request auth context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub authority: String,
}

impl From<&Identity> for Principal {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            email: identity.email.clone(),
            name: identity.name.clone(),
            role: identity.role,
            authority: identity.role.authority(),
        }
    }
}

/// Login request body
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    /// Token lifetime in milliseconds
    pub expires_in: u64,
}

/// Registration request body, shared by both account kinds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub nik: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub medical_history: Option<String>,
    #[serde(default)]
    pub speciality: Option<Speciality>,
    #[serde(default)]
    pub work_address: Option<String>,
}

impl RegisterRequest {
    /// Field rules for registering an account of `role`
    pub fn validate(&self, role: Role) -> ApiResult<()> {
        let required = [
            (&self.email, "Email is required"),
            (&self.password, "Password is required"),
            (&self.name, "Name is required"),
            (&self.nik, "NIK is required"),
            (&self.address, "Address is required"),
            (&self.phone_number, "Phone number is required"),
        ];
        if let Some((_, message)) = required.iter().find(|(field, _)| field.trim().is_empty()) {
            return Err(ApiError::validation_error(*message));
        }
        if !is_digits(&self.nik, 16..=16) {
            return Err(ApiError::validation_error("NIK must be 16 digits"));
        }
        validate_phone_number(&self.phone_number)?;

        if role == Role::Caregiver {
            if self.speciality.is_none() {
                return Err(ApiError::validation_error("Specialization is required"));
            }
            if self.work_address.as_deref().map_or(true, |a| a.trim().is_empty()) {
                return Err(ApiError::validation_error("Work address is required"));
            }
        }
        Ok(())
    }

    /// Profile details for the given account kind; fields of the other kind are dropped
    pub fn profile_for(&self, role: Role) -> Profile {
        let mut profile = Profile {
            address: self.address.clone(),
            phone_number: self.phone_number.clone(),
            ..Profile::default()
        };
        match role {
            Role::Pacilian => profile.medical_history = self.medical_history.clone(),
            Role::Caregiver => {
                profile.speciality = self.speciality;
                profile.work_address = self.work_address.clone();
            }
        }
        profile
    }
}

/// Partial profile update; absent or empty fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub medical_history: Option<String>,
    pub speciality: Option<Speciality>,
    pub work_address: Option<String>,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> ApiResult<()> {
        match self.phone_number.as_deref() {
            Some(phone) if !phone.is_empty() => validate_phone_number(phone),
            _ => Ok(()),
        }
    }

    /// Apply the update to `identity`, honouring which fields its role owns
    pub fn apply(self, identity: &mut Identity) {
        if let Some(name) = non_empty(self.name) {
            identity.name = name;
        }
        if let Some(address) = non_empty(self.address) {
            identity.profile.address = address;
        }
        if let Some(phone_number) = non_empty(self.phone_number) {
            identity.profile.phone_number = phone_number;
        }
        match identity.role {
            Role::Pacilian => {
                if self.medical_history.is_some() {
                    identity.profile.medical_history = self.medical_history;
                }
            }
            Role::Caregiver => {
                if self.speciality.is_some() {
                    identity.profile.speciality = self.speciality;
                }
                if let Some(work_address) = non_empty(self.work_address) {
                    identity.profile.work_address = Some(work_address);
                }
            }
        }
    }
}

/// Password change request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordChangeRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordChangeRequest {
    pub fn validate(&self) -> ApiResult<()> {
        if self.current_password.is_empty() {
            return Err(ApiError::validation_error("Current password is required"));
        }
        if self.new_password.is_empty() {
            return Err(ApiError::validation_error("New password is required"));
        }
        if self.confirm_password.is_empty() {
            return Err(ApiError::validation_error("Confirm password is required"));
        }
        Ok(())
    }
}

fn is_digits(value: &str, len: std::ops::RangeInclusive<usize>) -> bool {
    len.contains(&value.len()) && value.bytes().all(|b| b.is_ascii_digit())
}

fn validate_phone_number(phone: &str) -> ApiResult<()> {
    if is_digits(phone, 10..=13) {
        Ok(())
    } else {
        Err(ApiError::validation_error("Phone number must be 10-13 digits"))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Registration response
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub role: Role,
    pub message: String,
}

/// Result of an explicit token verification request
#[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenVerificationResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Remaining token lifetime in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

impl TokenVerificationResponse {
    pub fn invalid() -> Self {
        Self::default()
    }
}

/// Full profile of the current user
#[derive(Debug, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub nik: String,
    pub address: String,
    pub phone_number: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speciality: Option<Speciality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_address: Option<String>,
}

impl From<Identity> for UserProfile {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            email: identity.email,
            name: identity.name,
            nik: identity.nik,
            address: identity.profile.address,
            phone_number: identity.profile.phone_number,
            role: identity.role,
            medical_history: identity.profile.medical_history,
            speciality: identity.profile.speciality,
            work_address: identity.profile.work_address,
        }
    }
}

/// Success envelope for profile endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(status: StatusCode, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            status: status.as_u16(),
            message: message.into(),
            timestamp: Utc::now(),
            data,
        }
    }
}

/// Plain message body for acknowledgement responses
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_values() {
        assert_eq!(Role::Pacilian.value(), "PACILIAN");
        assert_eq!(Role::Caregiver.value(), "CAREGIVER");
        assert_eq!(Role::Caregiver.authority(), "ROLE_CAREGIVER");
    }

    #[test]
    fn test_role_contains() {
        assert!(Role::contains("PACILIAN"));
        assert!(Role::contains("CAREGIVER"));
        assert!(!Role::contains("ADMIN"));
        assert!(!Role::contains("pacilian"));
        assert!(!Role::contains(""));
    }

    #[test]
    fn test_role_serializes_as_wire_value() {
        let json = serde_json::to_string(&Role::Pacilian).unwrap();
        assert_eq!(json, "\"PACILIAN\"");
        let role: Role = serde_json::from_str("\"CAREGIVER\"").unwrap();
        assert_eq!(role, Role::Caregiver);
    }

    #[test]
    fn test_identity_never_serializes_password_hash() {
        let identity = Identity {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            name: "A".to_string(),
            nik: "123".to_string(),
            role: Role::Pacilian,
            profile: Profile::default(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&identity).unwrap();
        assert!(json.get("password_hash").is_none());

        let principal = Principal::from(&identity);
        assert_eq!(principal.authority, "ROLE_PACILIAN");
    }

    #[test]
    fn test_invalid_verification_carries_no_claims() {
        let json = serde_json::to_value(TokenVerificationResponse::invalid()).unwrap();
        assert_eq!(json, serde_json::json!({ "valid": false }));
    }

    fn pacilian_request() -> RegisterRequest {
        RegisterRequest {
            email: "a@x.com".to_string(),
            password: "right".to_string(),
            name: "Pasien".to_string(),
            nik: "3171000000000001".to_string(),
            address: "Depok".to_string(),
            phone_number: "081234567890".to_string(),
            medical_history: Some("asthma".to_string()),
            speciality: Some(Speciality::SpesialisAnak),
            work_address: Some("RS Depok".to_string()),
        }
    }

    #[test]
    fn test_register_validation_rules() {
        assert!(pacilian_request().validate(Role::Pacilian).is_ok());

        let mut short_nik = pacilian_request();
        short_nik.nik = "317".to_string();
        assert_eq!(
            short_nik.validate(Role::Pacilian).unwrap_err().message,
            "NIK must be 16 digits"
        );

        let mut bad_phone = pacilian_request();
        bad_phone.phone_number = "08-123".to_string();
        assert_eq!(
            bad_phone.validate(Role::Pacilian).unwrap_err().message,
            "Phone number must be 10-13 digits"
        );

        let mut no_address = pacilian_request();
        no_address.address = " ".to_string();
        assert_eq!(
            no_address.validate(Role::Pacilian).unwrap_err().message,
            "Address is required"
        );
    }

    #[test]
    fn test_caregiver_needs_speciality_and_work_address() {
        let mut request = pacilian_request();
        assert!(request.validate(Role::Caregiver).is_ok());

        request.work_address = None;
        assert_eq!(
            request.validate(Role::Caregiver).unwrap_err().message,
            "Work address is required"
        );
        assert!(request.validate(Role::Pacilian).is_ok());

        request.speciality = None;
        assert_eq!(
            request.validate(Role::Caregiver).unwrap_err().message,
            "Specialization is required"
        );
    }

    #[test]
    fn test_profile_keeps_only_role_fields() {
        let pacilian = pacilian_request().profile_for(Role::Pacilian);
        assert_eq!(pacilian.medical_history.as_deref(), Some("asthma"));
        assert!(pacilian.speciality.is_none());
        assert!(pacilian.work_address.is_none());

        let caregiver = pacilian_request().profile_for(Role::Caregiver);
        assert!(caregiver.medical_history.is_none());
        assert_eq!(caregiver.speciality, Some(Speciality::SpesialisAnak));
    }

    #[test]
    fn test_unknown_speciality_is_rejected() {
        assert_eq!(
            serde_json::from_str::<Speciality>("\"DOKTER_UMUM\"").unwrap(),
            Speciality::DokterUmum
        );
        assert!(serde_json::from_str::<Speciality>("\"DUKUN\"").is_err());
    }

    #[test]
    fn test_update_skips_empty_fields_and_foreign_role_fields() {
        let mut identity = Identity {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            password_hash: String::new(),
            name: "Old".to_string(),
            nik: "3171000000000001".to_string(),
            role: Role::Pacilian,
            profile: pacilian_request().profile_for(Role::Pacilian),
            created_at: Utc::now(),
        };

        UpdateProfileRequest {
            name: Some(String::new()),
            address: Some("Jakarta".to_string()),
            speciality: Some(Speciality::DokterUmum),
            ..UpdateProfileRequest::default()
        }
        .apply(&mut identity);

        assert_eq!(identity.name, "Old");
        assert_eq!(identity.profile.address, "Jakarta");
        assert_eq!(identity.profile.phone_number, "081234567890");
        assert!(identity.profile.speciality.is_none());
    }

    #[test]
    fn test_password_change_requires_all_fields() {
        let request = PasswordChangeRequest {
            current_password: "old".to_string(),
            new_password: String::new(),
            confirm_password: "new".to_string(),
        };
        assert_eq!(
            request.validate().unwrap_err().message,
            "New password is required"
        );
    }

    #[test]
    fn test_success_envelope_shape() {
        let json = serde_json::to_value(ApiResponse::success(
            StatusCode::OK,
            "Password changed successfully",
            None::<()>,
        ))
        .unwrap();
        assert_eq!(json["status"], 200);
        assert_eq!(json["message"], "Password changed successfully");
        assert!(json["data"].is_null());
        assert!(json["timestamp"].is_string());
    }
}
