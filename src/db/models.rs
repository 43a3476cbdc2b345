use crate::db::row::Row;
use crate::error::DbError;
use serde::Serialize;

/// A row of the `diseases` table, minus its timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Disease {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub symptoms: Option<String>,
    pub treatment: Option<String>,
}

impl TryFrom<&Row> for Disease {
    type Error = DbError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(Disease {
            id: row.try_i64("id")?,
            name: row
                .try_text("name")?
                .ok_or_else(|| DbError::Decode("disease name is NULL".to_string()))?,
            description: row.try_text("description")?,
            symptoms: row.try_text("symptoms")?,
            treatment: row.try_text("treatment")?,
        })
    }
}
