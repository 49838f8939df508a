//! Bearer-token gate.
//!
//! Tokens are HS256 JWTs carrying the actor id and role. Verification
//! yields an `Identity` whose `Subject` is a tagged enum, so handlers
//! resolve the effective actor by matching on the role rather than by
//! probing optional fields.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::models::enums::Role;
use crate::models::Recipient;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Authentication required: {0}")]
    Unauthenticated(&'static str),
    #[error("Role {role} may not perform this action")]
    Forbidden { role: Role },
    #[error("Token signing failed: {0}")]
    Signing(String),
}

/// JWT payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub role: Role,
    /// Owning hospital, present only for lab staff.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital_id: Option<i64>,
    pub iat: i64,
    pub exp: i64,
}

/// Who the caller is, per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Subject {
    Patient { patient_id: i64 },
    Doctor { doctor_id: i64 },
    Hospital { hospital_id: i64 },
    LabStaff { staff_id: i64, hospital_id: i64 },
    Medical { medical_id: i64 },
    Admin { admin_id: i64 },
}

/// Permission classes checked by handlers before touching the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Patient,
    Doctor,
    /// Hospitals, lab staff and medical shops.
    Facility,
    Admin,
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub subject: Subject,
}

impl Identity {
    pub fn new(subject: Subject) -> Self {
        Self { subject }
    }

    pub fn role(&self) -> Role {
        match self.subject {
            Subject::Patient { .. } => Role::Patient,
            Subject::Doctor { .. } => Role::Doctor,
            Subject::Hospital { .. } => Role::Hospital,
            Subject::LabStaff { .. } => Role::LabStaff,
            Subject::Medical { .. } => Role::Medical,
            Subject::Admin { .. } => Role::Admin,
        }
    }

    /// Primary key of the caller in its own actor table.
    pub fn subject_id(&self) -> i64 {
        match self.subject {
            Subject::Patient { patient_id } => patient_id,
            Subject::Doctor { doctor_id } => doctor_id,
            Subject::Hospital { hospital_id } => hospital_id,
            Subject::LabStaff { staff_id, .. } => staff_id,
            Subject::Medical { medical_id } => medical_id,
            Subject::Admin { admin_id } => admin_id,
        }
    }

    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::Any => true,
            Capability::Patient => matches!(self.subject, Subject::Patient { .. }),
            Capability::Doctor => matches!(self.subject, Subject::Doctor { .. }),
            Capability::Admin => matches!(self.subject, Subject::Admin { .. }),
            Capability::Facility => matches!(
                self.subject,
                Subject::Hospital { .. } | Subject::LabStaff { .. } | Subject::Medical { .. }
            ),
        }
    }

    pub fn require(&self, capability: Capability) -> Result<(), AuthError> {
        if self.has(capability) {
            Ok(())
        } else {
            Err(AuthError::Forbidden { role: self.role() })
        }
    }

    pub fn patient_id(&self) -> Option<i64> {
        match self.subject {
            Subject::Patient { patient_id } => Some(patient_id),
            _ => None,
        }
    }

    pub fn doctor_id(&self) -> Option<i64> {
        match self.subject {
            Subject::Doctor { doctor_id } => Some(doctor_id),
            _ => None,
        }
    }

    /// Hospital whose lab bookings this caller may act on.
    pub fn lab_id(&self) -> Option<i64> {
        match self.subject {
            Subject::Hospital { hospital_id } | Subject::LabStaff { hospital_id, .. } => {
                Some(hospital_id)
            }
            _ => None,
        }
    }

    pub fn medical_id(&self) -> Option<i64> {
        match self.subject {
            Subject::Medical { medical_id } => Some(medical_id),
            _ => None,
        }
    }

    pub fn staff_id(&self) -> Option<i64> {
        match self.subject {
            Subject::LabStaff { staff_id, .. } => Some(staff_id),
            _ => None,
        }
    }

    /// Notification inbox of the caller. Admins have none.
    pub fn inbox(&self) -> Option<Recipient> {
        match self.subject {
            Subject::Patient { patient_id } => Some(Recipient::patient(patient_id)),
            Subject::Doctor { doctor_id } => Some(Recipient::doctor(doctor_id)),
            Subject::Hospital { hospital_id } => Some(Recipient::hospital(hospital_id)),
            Subject::LabStaff { staff_id, .. } => Some(Recipient::lab_staff(staff_id)),
            Subject::Medical { medical_id } => Some(Recipient::medical(medical_id)),
            Subject::Admin { .. } => None,
        }
    }

    fn token_ttl(&self) -> Duration {
        match self.subject {
            Subject::Medical { .. } => Duration::hours(24),
            Subject::Admin { .. } => Duration::days(1),
            _ => Duration::days(7),
        }
    }
}

impl TryFrom<Claims> for Identity {
    type Error = AuthError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = claims.id;
        let subject = match claims.role {
            Role::Patient => Subject::Patient { patient_id: id },
            Role::Doctor => Subject::Doctor { doctor_id: id },
            Role::Hospital => Subject::Hospital { hospital_id: id },
            Role::LabStaff => Subject::LabStaff {
                staff_id: id,
                hospital_id: claims
                    .hospital_id
                    .ok_or(AuthError::Unauthenticated("lab staff token without hospital"))?,
            },
            Role::Medical => Subject::Medical { medical_id: id },
            Role::Admin => Subject::Admin { admin_id: id },
        };
        Ok(Identity::new(subject))
    }
}

/// Signs and verifies bearer tokens with a secret supplied by `AppConfig`.
#[derive(Clone)]
pub struct AuthGate {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate").finish_non_exhaustive()
    }
}

impl AuthGate {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Unauthenticated("token expired"),
                _ => AuthError::Unauthenticated("invalid token"),
            }
        })?;
        Identity::try_from(data.claims)
    }

    /// Parse an `Authorization` header value and verify the token.
    pub fn verify_header(&self, header: Option<&str>) -> Result<Identity, AuthError> {
        let token = header
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::Unauthenticated("missing bearer token"))?;
        self.verify(token)
    }

    /// Issue a token for `identity` with the role's lifetime.
    pub fn issue(&self, identity: &Identity) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            id: identity.subject_id(),
            role: identity.role(),
            hospital_id: match identity.subject {
                Subject::LabStaff { hospital_id, .. } => Some(hospital_id),
                _ => None,
            },
            iat: now.timestamp(),
            exp: (now + identity.token_ttl()).timestamp(),
        };
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::UserType;

    const SECRET: &[u8] = b"test-secret-that-is-long-enough-0123456789";

    fn gate() -> AuthGate {
        AuthGate::new(SECRET)
    }

    #[test]
    fn issued_token_verifies_to_same_identity() {
        let gate = gate();
        let identity = Identity::new(Subject::LabStaff { staff_id: 4, hospital_id: 9 });
        let token = gate.issue(&identity).unwrap();
        assert_eq!(gate.verify(&token).unwrap(), identity);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let other = AuthGate::new(b"a-completely-different-secret-value!!");
        let token = other
            .issue(&Identity::new(Subject::Patient { patient_id: 1 }))
            .unwrap();
        assert!(matches!(gate().verify(&token), Err(AuthError::Unauthenticated(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let gate = gate();
        let now = Utc::now().timestamp();
        let token = gate
            .sign(&Claims {
                id: 1,
                role: Role::Doctor,
                hospital_id: None,
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();
        let err = gate.verify(&token).unwrap_err();
        assert!(matches!(err, AuthError::Unauthenticated("token expired")));
    }

    #[test]
    fn lab_staff_claims_need_hospital() {
        let gate = gate();
        let now = Utc::now().timestamp();
        let token = gate
            .sign(&Claims {
                id: 3,
                role: Role::LabStaff,
                hospital_id: None,
                iat: now,
                exp: now + 60,
            })
            .unwrap();
        assert!(gate.verify(&token).is_err());
    }

    #[test]
    fn header_parsing() {
        let gate = gate();
        assert!(gate.verify_header(None).is_err());
        assert!(gate.verify_header(Some("Basic abc")).is_err());
        assert!(gate.verify_header(Some("Bearer ")).is_err());

        let token = gate
            .issue(&Identity::new(Subject::Medical { medical_id: 2 }))
            .unwrap();
        let identity = gate.verify_header(Some(&format!("Bearer {token}"))).unwrap();
        assert_eq!(identity.medical_id(), Some(2));
    }

    #[test]
    fn facility_capability_covers_three_roles() {
        let hospital = Identity::new(Subject::Hospital { hospital_id: 1 });
        let staff = Identity::new(Subject::LabStaff { staff_id: 2, hospital_id: 1 });
        let shop = Identity::new(Subject::Medical { medical_id: 3 });
        let patient = Identity::new(Subject::Patient { patient_id: 4 });

        for identity in [hospital, staff, shop] {
            assert!(identity.require(Capability::Facility).is_ok());
        }
        assert!(matches!(
            patient.require(Capability::Facility),
            Err(AuthError::Forbidden { role: Role::Patient })
        ));
    }

    #[test]
    fn owner_keys_follow_the_role_tag() {
        let staff = Identity::new(Subject::LabStaff { staff_id: 2, hospital_id: 7 });
        assert_eq!(staff.lab_id(), Some(7));
        assert_eq!(staff.medical_id(), None);
        assert_eq!(staff.inbox().map(|r| (r.kind, r.id)), Some((UserType::LabStaff, 2)));

        let shop = Identity::new(Subject::Medical { medical_id: 3 });
        assert_eq!(shop.lab_id(), None);
        assert_eq!(shop.medical_id(), Some(3));

        let admin = Identity::new(Subject::Admin { admin_id: 1 });
        assert!(admin.inbox().is_none());
    }

    #[test]
    fn medical_tokens_live_one_day() {
        let gate = gate();
        let token = gate
            .issue(&Identity::new(Subject::Medical { medical_id: 1 }))
            .unwrap();
        let data = decode::<Claims>(&token, &gate.decoding, &gate.validation).unwrap();
        assert_eq!(data.claims.exp - data.claims.iat, 24 * 3600);
    }
}
