//! Row types bridging SQL results to domain types

use sqlx::FromRow;

use crate::model::PrecedentMatch;

/// Row returned by the precedent similarity query. `similarity` is computed
/// in SQL as `1 - (embedding <=> query)`.
#[derive(Debug, FromRow)]
pub struct PrecedentMatchRow {
    pub content: String,
    pub file_name: String,
    pub partner_author: Option<String>,
    pub similarity: f64,
}

impl PrecedentMatchRow {
    pub fn into_domain(self) -> PrecedentMatch {
        PrecedentMatch {
            content: self.content,
            file_name: self.file_name,
            partner_author: self.partner_author,
            similarity: self.similarity as f32,
        }
    }
}
