//! Typed query parameters and their conversion into sqlx arguments.

use chrono::NaiveDate;
use sqlx::postgres::PgArguments;
use sqlx::Arguments;

/// A value bound to a positional placeholder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SqlParam {
    Int(i32),
    BigInt(i64),
    Text(String),
    Date(NaiveDate),
    /// Grade letter or NULL; the statement casts it to the enum type.
    OptText(Option<String>),
}

impl From<i32> for SqlParam {
    fn from(n: i32) -> Self {
        SqlParam::Int(n)
    }
}

impl From<i64> for SqlParam {
    fn from(n: i64) -> Self {
        SqlParam::BigInt(n)
    }
}

impl From<&str> for SqlParam {
    fn from(s: &str) -> Self {
        SqlParam::Text(s.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(s: String) -> Self {
        SqlParam::Text(s)
    }
}

impl From<NaiveDate> for SqlParam {
    fn from(d: NaiveDate) -> Self {
        SqlParam::Date(d)
    }
}

/// Build the argument list for a statement, in placeholder order.
pub fn to_arguments(params: &[SqlParam]) -> Result<PgArguments, sqlx::Error> {
    let mut args = PgArguments::default();
    for p in params {
        let added = match p {
            SqlParam::Int(n) => args.add(*n),
            SqlParam::BigInt(n) => args.add(*n),
            SqlParam::Text(s) => args.add(s.clone()),
            SqlParam::Date(d) => args.add(*d),
            SqlParam::OptText(v) => args.add(v.clone()),
        };
        added.map_err(sqlx::Error::Encode)?;
    }
    Ok(args)
}
