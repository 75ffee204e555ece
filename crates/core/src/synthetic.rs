//! Locale-flavoured fake customers for bulk seeding.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use fake::faker::address::raw::{CityName, StateAbbr};
use fake::faker::internet::raw::FreeEmail;
use fake::faker::name::raw::Name;
use fake::faker::phone_number::raw::PhoneNumber;
use fake::locales::PT_BR;
use fake::Fake;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use crate::domain::customer::{CustomerInput, LifetimeValue, NewCustomer, DEFAULT_COUNTRY};

pub const VIP_PROBABILITY: f64 = 0.10;
pub const MAX_BACKDATE_DAYS: i64 = 365 * 3;
/// Upper bound of a generated lifetime value, in cents (R$ 99 999,99).
pub const MAX_LIFETIME_VALUE_CENTS: i64 = 9_999_999;

/// Infinite stream of synthetic customers; take as many as needed.
///
/// Emails are unique for the lifetime of one generator.
pub struct SyntheticCustomers {
    rng: StdRng,
    reference_time: DateTime<Utc>,
    issued_emails: HashSet<String>,
    sequence: u64,
}

impl SyntheticCustomers {
    pub fn new(reference_time: DateTime<Utc>) -> Self {
        Self::with_rng(StdRng::from_entropy(), reference_time)
    }

    pub fn seeded(seed: u64, reference_time: DateTime<Utc>) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), reference_time)
    }

    fn with_rng(rng: StdRng, reference_time: DateTime<Utc>) -> Self {
        Self { rng, reference_time, issued_emails: HashSet::new(), sequence: 0 }
    }

    pub fn reference_time(&self) -> DateTime<Utc> {
        self.reference_time
    }

    fn next_customer(&mut self) -> NewCustomer {
        self.sequence += 1;

        let name: String = Name(PT_BR).fake_with_rng(&mut self.rng);
        let email = self.unique_email();
        let city: String = CityName(PT_BR).fake_with_rng(&mut self.rng);
        let state: String = StateAbbr(PT_BR).fake_with_rng(&mut self.rng);
        let phone: String = PhoneNumber(PT_BR).fake_with_rng(&mut self.rng);
        let is_vip = self.rng.gen_bool(VIP_PROBABILITY);
        let cents = self.rng.gen_range(1..=MAX_LIFETIME_VALUE_CENTS);
        let lifetime_value =
            LifetimeValue::new(Decimal::new(cents, 2)).unwrap_or(LifetimeValue::ZERO);
        let days_back = self.rng.gen_range(0..=MAX_BACKDATE_DAYS);

        NewCustomer::with_created_at(
            CustomerInput {
                name,
                email,
                city,
                state,
                country: DEFAULT_COUNTRY.to_string(),
                phone,
                is_vip,
                lifetime_value,
            },
            self.reference_time - Duration::days(days_back),
        )
    }

    fn unique_email(&mut self) -> String {
        let candidate: String = FreeEmail(PT_BR).fake_with_rng(&mut self.rng);
        let mut email = candidate.clone();
        let mut attempt = 0u32;
        while self.issued_emails.contains(&email) {
            attempt += 1;
            email = match candidate.split_once('@') {
                Some((local, domain)) => format!("{local}.{}{attempt}@{domain}", self.sequence),
                None => format!("{candidate}.{}{attempt}", self.sequence),
            };
        }
        self.issued_emails.insert(email.clone());
        email
    }
}

impl Iterator for SyntheticCustomers {
    type Item = NewCustomer;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_customer())
    }
}
