//! Deferred student query: filter and ordering are accumulated here and executed by the store.

use crate::model::Student;
use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StudentOrder {
    #[default]
    LastNameAsc,
    LastNameDesc,
    DateAsc,
    DateDesc,
}

impl StudentOrder {
    /// Map a sort token from the list page. Unknown or absent tokens mean ascending last name.
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some("name_desc") => StudentOrder::LastNameDesc,
            Some("Date") => StudentOrder::DateAsc,
            Some("date_desc") => StudentOrder::DateDesc,
            _ => StudentOrder::LastNameAsc,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            StudentOrder::LastNameAsc => "",
            StudentOrder::LastNameDesc => "name_desc",
            StudentOrder::DateAsc => "Date",
            StudentOrder::DateDesc => "date_desc",
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            StudentOrder::LastNameAsc | StudentOrder::LastNameDesc => "last_name",
            StudentOrder::DateAsc | StudentOrder::DateDesc => "enrollment_date",
        }
    }

    pub fn descending(&self) -> bool {
        matches!(self, StudentOrder::LastNameDesc | StudentOrder::DateDesc)
    }

    /// Single-key comparison; ties compare equal.
    pub fn compare(&self, a: &Student, b: &Student) -> Ordering {
        let ord = match self {
            StudentOrder::LastNameAsc | StudentOrder::LastNameDesc => a.last_name.cmp(&b.last_name),
            StudentOrder::DateAsc | StudentOrder::DateDesc => a.enrollment_date.cmp(&b.enrollment_date),
        };
        if self.descending() {
            ord.reverse()
        } else {
            ord
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StudentQuery {
    search: Option<String>,
    order: StudentOrder,
}

impl StudentQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep students whose last name or first/middle name contains `text`. Empty text is no filter.
    pub fn name_contains(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.search = if text.is_empty() { None } else { Some(text) };
        self
    }

    pub fn order_by(mut self, order: StudentOrder) -> Self {
        self.order = order;
        self
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn order(&self) -> StudentOrder {
        self.order
    }

    /// Same predicate the SQL store applies, for stores that filter in process.
    pub fn matches(&self, s: &Student) -> bool {
        match &self.search {
            Some(text) => s.last_name.contains(text.as_str()) || s.first_mid_name.contains(text.as_str()),
            None => true,
        }
    }
}
