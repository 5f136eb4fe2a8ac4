//! `SQLite` column conversions for model enums and ids

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

use crate::models::{
    BusinessStatus, ConflictResolution, QueueAction, QueueState, RecordId, SyncStatus, TaskId,
};

/// Text-backed enums: stored via `as_str`, read back via `FromStr`.
/// Unknown text surfaces as a conversion error rather than a silent default.
macro_rules! text_column {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ToSql for $ty {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.as_str()))
                }
            }

            impl FromSql for $ty {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    value
                        .as_str()?
                        .parse()
                        .map_err(|error| FromSqlError::Other(Box::new(error)))
                }
            }
        )+
    };
}

text_column!(BusinessStatus, SyncStatus, QueueState, QueueAction, ConflictResolution);

impl ToSql for TaskId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TaskId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().map(Self::new)
    }
}

impl ToSql for RecordId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for RecordId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().map(|id| Self::from(id.to_string()))
    }
}
