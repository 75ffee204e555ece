use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::ApplicationError;

/// Page sizes offered by the read form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum PageSize {
    Ten,
    TwentyFive,
    Fifty,
    #[default]
    OneHundred,
    TwoHundred,
}

impl PageSize {
    pub const ALL: [PageSize; 5] =
        [Self::Ten, Self::TwentyFive, Self::Fifty, Self::OneHundred, Self::TwoHundred];

    pub fn get(self) -> u32 {
        match self {
            Self::Ten => 10,
            Self::TwentyFive => 25,
            Self::Fifty => 50,
            Self::OneHundred => 100,
            Self::TwoHundred => 200,
        }
    }
}

impl TryFrom<u32> for PageSize {
    type Error = ApplicationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::ALL.into_iter().find(|size| size.get() == value).ok_or_else(|| {
            ApplicationError::Validation(format!(
                "page size `{value}` is not supported (expected 10|25|50|100|200)"
            ))
        })
    }
}

impl From<PageSize> for u32 {
    fn from(value: PageSize) -> Self {
        value.get()
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    size: PageSize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, size: PageSize::default() }
    }
}

impl PageRequest {
    pub fn new(page: u32, size: PageSize) -> Result<Self, ApplicationError> {
        if page == 0 {
            return Err(ApplicationError::Validation("page must be at least 1".to_string()));
        }
        Ok(Self { page, size })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> PageSize {
        self.size
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.size.get())
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.size.get())
    }
}

/// One window of a sorted result set, with the count of every match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_matching: u64,
    pub page: u32,
    pub page_size: PageSize,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        self.total_matching.div_ceil(u64::from(self.page_size.get()))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
