use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ApplicationError;

pub const DEFAULT_COUNTRY: &str = "Brasil";

/// Storage-assigned identity of a customer record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub Uuid);

impl CustomerId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for CustomerId {
    type Err = ApplicationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| ApplicationError::InvalidIdentifier { input: value.to_string() })
    }
}

/// Non-negative monetary amount accumulated by a customer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct LifetimeValue(Decimal);

impl LifetimeValue {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Result<Self, ApplicationError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(ApplicationError::Validation(format!(
                "lifetime value must not be negative (got {amount})"
            )));
        }
        Ok(Self(if amount.is_zero() { Decimal::ZERO } else { amount }))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for LifetimeValue {
    type Error = ApplicationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LifetimeValue> for Decimal {
    fn from(value: LifetimeValue) -> Self {
        value.0
    }
}

impl fmt::Display for LifetimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The mutable fields of a customer, as submitted by a create or update form.
///
/// Absent fields take the defaults below on both create and update; an update
/// never merges with the previously stored values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerInput {
    pub name: String,
    pub email: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub phone: String,
    pub is_vip: bool,
    pub lifetime_value: LifetimeValue,
}

impl Default for CustomerInput {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            city: String::new(),
            state: String::new(),
            country: DEFAULT_COUNTRY.to_string(),
            phone: String::new(),
            is_vip: false,
            lifetime_value: LifetimeValue::ZERO,
        }
    }
}

/// A record ready to be inserted; the storage layer assigns its identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCustomer {
    pub fields: CustomerInput,
    pub created_at: DateTime<Utc>,
}

impl NewCustomer {
    pub fn created_now(fields: CustomerInput) -> Self {
        Self { fields, created_at: truncate_to_millis(Utc::now()) }
    }

    pub fn with_created_at(fields: CustomerInput, created_at: DateTime<Utc>) -> Self {
        Self { fields, created_at: truncate_to_millis(created_at) }
    }

    pub fn into_customer(self, id: CustomerId) -> Customer {
        let CustomerInput { name, email, city, state, country, phone, is_vip, lifetime_value } =
            self.fields;
        Customer {
            id,
            name,
            email,
            city,
            state,
            country,
            phone,
            is_vip,
            lifetime_value,
            created_at: self.created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub phone: String,
    pub is_vip: bool,
    pub lifetime_value: LifetimeValue,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// Overwrites every mutable field; `id` and `created_at` are left alone.
    pub fn overwrite(&mut self, fields: CustomerInput) {
        let CustomerInput { name, email, city, state, country, phone, is_vip, lifetime_value } =
            fields;
        self.name = name;
        self.email = email;
        self.city = city;
        self.state = state;
        self.country = country;
        self.phone = phone;
        self.is_vip = is_vip;
        self.lifetime_value = lifetime_value;
    }

    pub fn fields(&self) -> CustomerInput {
        CustomerInput {
            name: self.name.clone(),
            email: self.email.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            country: self.country.clone(),
            phone: self.phone.clone(),
            is_vip: self.is_vip,
            lifetime_value: self.lifetime_value,
        }
    }
}

/// Stored timestamps keep millisecond precision.
pub fn truncate_to_millis(value: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(value.timestamp_millis()).unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::{TimeZone, Timelike, Utc};
    use rust_decimal::Decimal;

    use super::{CustomerId, CustomerInput, LifetimeValue, NewCustomer, DEFAULT_COUNTRY};
    use crate::errors::ApplicationError;

    #[test]
    fn customer_id_round_trips_through_display() {
        let id = CustomerId::generate();
        let parsed = CustomerId::from_str(&id.to_string()).expect("parse generated id");
        assert_eq!(parsed, id);
    }

    #[test]
    fn malformed_customer_id_is_rejected() {
        let error = CustomerId::from_str("64f0c0ffee").expect_err("should reject");
        assert!(matches!(
            error,
            ApplicationError::InvalidIdentifier { ref input } if input == "64f0c0ffee"
        ));
    }

    #[test]
    fn negative_lifetime_value_is_rejected() {
        let error = LifetimeValue::new(Decimal::new(-1, 2)).expect_err("negative value");
        assert!(matches!(error, ApplicationError::Validation(_)));

        let parsed: Result<LifetimeValue, _> = serde_json::from_str("\"-10.00\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn lifetime_value_accepts_json_numbers() {
        let value: LifetimeValue = serde_json::from_str("1520.5").expect("numeric json");
        assert_eq!(value.amount(), Decimal::new(15205, 1));
    }

    #[test]
    fn input_defaults_match_form_defaults() {
        let input: CustomerInput = serde_json::from_str(r#"{"name":"Ana"}"#).expect("decode");
        assert_eq!(input.name, "Ana");
        assert_eq!(input.country, DEFAULT_COUNTRY);
        assert!(!input.is_vip);
        assert_eq!(input.lifetime_value, LifetimeValue::ZERO);
    }

    #[test]
    fn new_customer_truncates_timestamp_to_millis() {
        let instant = Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .single()
            .expect("valid instant")
            .with_nanosecond(123_456_789)
            .expect("valid nanos");
        let record = NewCustomer::with_created_at(CustomerInput::default(), instant);
        assert_eq!(record.created_at.nanosecond(), 123_000_000);
    }

    #[test]
    fn overwrite_keeps_identity_and_creation_time() {
        let record = NewCustomer::created_now(CustomerInput {
            name: "Bruna".to_string(),
            is_vip: true,
            ..CustomerInput::default()
        });
        let created_at = record.created_at;
        let id = CustomerId::generate();
        let mut customer = record.into_customer(id);

        customer.overwrite(CustomerInput { city: "Recife".to_string(), ..CustomerInput::default() });

        assert_eq!(customer.id, id);
        assert_eq!(customer.created_at, created_at);
        assert_eq!(customer.name, "");
        assert_eq!(customer.city, "Recife");
        assert!(!customer.is_vip);
    }
}
