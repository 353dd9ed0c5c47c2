//! Small builder for the dynamic `WHERE` clauses used by list/search helpers.

use rusqlite::types::Value;

#[derive(Debug, Default)]
pub struct Filter {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a clause containing exactly one `?` placeholder.
    pub fn push(&mut self, clause: &str, value: impl Into<Value>) -> &mut Self {
        self.clauses.push(clause.to_string());
        self.params.push(value.into());
        self
    }

    /// Case-insensitive substring match of `term` against any of `columns`.
    pub fn search(&mut self, columns: &[&str], term: &str) -> &mut Self {
        let term = term.trim();
        if term.is_empty() || columns.is_empty() {
            return self;
        }
        let ors: Vec<String> = columns
            .iter()
            .map(|c| format!("instr(casefold({c}), casefold(?)) > 0"))
            .collect();
        self.clauses.push(format!("({})", ors.join(" OR ")));
        for _ in columns {
            self.params.push(Value::Text(term.to_string()));
        }
        self
    }

    /// `" WHERE a AND b"`, or an empty string when no clause was added.
    pub fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Parameters followed by trailing `LIMIT ? OFFSET ?` values.
    pub fn params_with_page(&self, limit: u32, offset: u32) -> Vec<Value> {
        let mut params = self.params.clone();
        params.push(Value::Integer(i64::from(limit)));
        params.push(Value::Integer(i64::from(offset)));
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_has_no_where() {
        assert_eq!(Filter::new().where_sql(), "");
    }

    #[test]
    fn search_binds_one_param_per_column() {
        let mut f = Filter::new();
        f.push("status = ?", "active".to_string())
            .search(&["title", "author"], "  rust ");
        assert_eq!(
            f.where_sql(),
            " WHERE status = ? AND (instr(casefold(title), casefold(?)) > 0 OR instr(casefold(author), casefold(?)) > 0)"
        );
        assert_eq!(f.params().len(), 3);
        assert_eq!(f.params()[1], Value::Text("rust".into()));
    }

    #[test]
    fn blank_search_is_ignored() {
        let mut f = Filter::new();
        f.search(&["name"], "   ");
        assert!(f.params().is_empty());
    }
}
