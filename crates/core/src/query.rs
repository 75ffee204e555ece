//! Translation of admin-form filter fields into a storage predicate.
//!
//! A [`Predicate`] is the conjunction of every condition the filters produce:
//! case-insensitive containment on name, email and city, plus an optional
//! created-at range whose bounds are each optional. Storage backends render it
//! into their own query language; [`Predicate::matches`] is the in-memory form
//! of the same semantics.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::customer::Customer;

/// Raw filter values collected by the read form. Every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerFilter {
    pub name: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub created_from: Option<NaiveDate>,
    pub created_to: Option<NaiveDate>,
}

/// Inclusive created-at bounds; `None` leaves that side open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CreatedAtRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl CreatedAtRange {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| instant >= from) && self.to.map_or(true, |to| instant <= to)
    }
}

/// Containment needles are stored already case-folded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Predicate {
    pub name_contains: Option<String>,
    pub email_contains: Option<String>,
    pub city_contains: Option<String>,
    pub created_at: Option<CreatedAtRange>,
}

impl Predicate {
    pub fn match_all() -> Self {
        Self::default()
    }

    pub fn is_match_all(&self) -> bool {
        self == &Self::default()
    }

    pub fn matches(&self, customer: &Customer) -> bool {
        contains_folded(&customer.name, self.name_contains.as_deref())
            && contains_folded(&customer.email, self.email_contains.as_deref())
            && contains_folded(&customer.city, self.city_contains.as_deref())
            && self.created_at.map_or(true, |range| range.contains(customer.created_at))
    }
}

pub fn build_query(filter: &CustomerFilter) -> Predicate {
    let created_at = if filter.created_from.is_some() || filter.created_to.is_some() {
        Some(CreatedAtRange {
            from: filter.created_from.map(start_of_day),
            to: filter.created_to.map(end_of_day),
        })
    } else {
        None
    };

    Predicate {
        name_contains: substring_condition(filter.name.as_deref()),
        email_contains: substring_condition(filter.email.as_deref()),
        city_contains: substring_condition(filter.city.as_deref()),
        created_at,
    }
}

/// Case-folding used for both stored search keys and query needles.
pub fn fold_case(value: &str) -> String {
    value.to_lowercase()
}

/// 00:00:00.000 UTC on `day`.
pub fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// 23:59:59.999 UTC on `day`, the last instant representable at storage precision.
pub fn end_of_day(day: NaiveDate) -> DateTime<Utc> {
    let last_milli = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    day.and_time(last_milli).and_utc()
}

fn substring_condition(value: Option<&str>) -> Option<String> {
    value.filter(|value| !value.is_empty()).map(fold_case)
}

fn contains_folded(haystack: &str, needle: Option<&str>) -> bool {
    needle.map_or(true, |needle| fold_case(haystack).contains(needle))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    use super::{build_query, end_of_day, start_of_day, CustomerFilter, Predicate};
    use crate::domain::customer::{CustomerId, CustomerInput, NewCustomer};

    fn day(year: i32, month: u32, date: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, date).expect("valid date")
    }

    fn customer(name: &str, email: &str, city: &str, created_at: chrono::DateTime<Utc>) -> crate::Customer {
        NewCustomer::with_created_at(
            CustomerInput {
                name: name.to_string(),
                email: email.to_string(),
                city: city.to_string(),
                ..CustomerInput::default()
            },
            created_at,
        )
        .into_customer(CustomerId::generate())
    }

    fn reference_dataset() -> Vec<crate::Customer> {
        let base = Utc.with_ymd_and_hms(2023, 3, 10, 15, 30, 0).single().expect("valid instant");
        vec![
            customer("João Silva", "joao.silva@example.com.br", "São Paulo", base),
            customer("Maria Souza", "MARIA@Example.com", "Rio de Janeiro", base + Duration::days(1)),
            customer("Ísis Araújo", "isis@provedor.net", "Belo Horizonte", base + Duration::days(40)),
            customer("", "", "", base - Duration::days(400)),
        ]
    }

    #[test]
    fn empty_filter_matches_every_record() {
        let predicate = build_query(&CustomerFilter::default());
        assert!(predicate.is_match_all());
        assert!(reference_dataset().iter().all(|record| predicate.matches(record)));
    }

    #[test]
    fn empty_strings_emit_no_condition() {
        let predicate = build_query(&CustomerFilter {
            name: Some(String::new()),
            email: Some(String::new()),
            city: Some(String::new()),
            ..CustomerFilter::default()
        });
        assert_eq!(predicate, Predicate::match_all());
    }

    #[test]
    fn substring_filters_are_case_insensitive_partial_matches() {
        let dataset = reference_dataset();

        let by_email = build_query(&CustomerFilter {
            email: Some("example.COM".to_string()),
            ..CustomerFilter::default()
        });
        let matched: Vec<_> = dataset.iter().filter(|r| by_email.matches(r)).collect();
        assert_eq!(matched.len(), 2);

        let by_name = build_query(&CustomerFilter {
            name: Some("ísis".to_string()),
            ..CustomerFilter::default()
        });
        let matched: Vec<_> = dataset.iter().filter(|r| by_name.matches(r)).collect();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].name, "Ísis Araújo");
    }

    #[test]
    fn substring_filters_are_not_exact_equality() {
        let predicate = build_query(&CustomerFilter {
            city: Some("paulo".to_string()),
            ..CustomerFilter::default()
        });
        assert_eq!(predicate.city_contains.as_deref(), Some("paulo"));
        assert!(reference_dataset().iter().any(|record| predicate.matches(record)));
    }

    #[test]
    fn conditions_are_combined_with_and() {
        let predicate = build_query(&CustomerFilter {
            name: Some("maria".to_string()),
            city: Some("paulo".to_string()),
            ..CustomerFilter::default()
        });
        assert!(!reference_dataset().iter().any(|record| predicate.matches(record)));
    }

    #[test]
    fn date_range_bounds_cover_whole_days() {
        let predicate = build_query(&CustomerFilter {
            created_from: Some(day(2024, 1, 10)),
            created_to: Some(day(2024, 1, 12)),
            ..CustomerFilter::default()
        });
        let range = predicate.created_at.expect("range emitted");
        assert_eq!(range.from, Some(Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap()));
        assert_eq!(
            range.to,
            Some(
                Utc.with_ymd_and_hms(2024, 1, 12, 23, 59, 59).unwrap()
                    + Duration::milliseconds(999)
            )
        );
    }

    #[test]
    fn boundary_instants_are_included_and_outside_excluded() {
        let predicate = build_query(&CustomerFilter {
            created_from: Some(day(2024, 1, 10)),
            created_to: Some(day(2024, 1, 12)),
            ..CustomerFilter::default()
        });
        let start = start_of_day(day(2024, 1, 10));
        let end = end_of_day(day(2024, 1, 12));

        assert!(predicate.matches(&customer("a", "", "", start)));
        assert!(predicate.matches(&customer("b", "", "", end)));
        assert!(!predicate.matches(&customer("c", "", "", start - Duration::milliseconds(1))));
        assert!(!predicate.matches(&customer("d", "", "", end + Duration::milliseconds(1))));
    }

    #[test]
    fn single_bound_leaves_other_side_open() {
        let only_from = build_query(&CustomerFilter {
            created_from: Some(day(2023, 3, 11)),
            ..CustomerFilter::default()
        });
        let range = only_from.created_at.expect("range emitted");
        assert!(range.to.is_none());
        let matched = reference_dataset().iter().filter(|r| only_from.matches(r)).count();
        assert_eq!(matched, 2);

        let only_to = build_query(&CustomerFilter {
            created_to: Some(day(2023, 3, 10)),
            ..CustomerFilter::default()
        });
        assert!(only_to.created_at.expect("range emitted").from.is_none());
        let matched = reference_dataset().iter().filter(|r| only_to.matches(r)).count();
        assert_eq!(matched, 2);
    }
}
