//! Filter conditions and bind-marker numbering

use crate::{dialect, Error, Result, Value};

/// Hands out dense `:1..:k` markers for one rendered statement.
#[derive(Debug, Clone)]
pub struct ParamIndexer {
    next: usize,
}

impl Default for ParamIndexer {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamIndexer {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Next marker, e.g. `:3`
    pub fn next_marker(&mut self) -> String {
        let marker = dialect::bind_marker(self.next);
        self.next += 1;
        marker
    }

    /// Number of markers handed out so far
    pub fn issued(&self) -> usize {
        self.next - 1
    }

    /// Replace each `?` in `template`, left to right, with the next marker.
    pub fn number(&mut self, template: &str) -> String {
        let mut sql = String::with_capacity(template.len() + 8);
        for ch in template.chars() {
            if ch == '?' {
                sql.push_str(&self.next_marker());
            } else {
                sql.push(ch);
            }
        }
        sql
    }
}

/// One filter fragment and the values bound to its `?` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    template: String,
    args: Vec<Value>,
    literal: bool,
}

impl Condition {
    pub fn new(template: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            template: template.into(),
            args,
            literal: false,
        }
    }

    /// Text copied into the statement as is, without placeholder numbering.
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            template: text.into(),
            args: Vec::new(),
            literal: true,
        }
    }

    /// `column IN (<list>)` with the list spliced in verbatim.
    ///
    /// The list is not bound; callers must only pass trusted text.
    pub fn in_literal(column: &str, list: &str) -> Self {
        Self::literal(format!("{column} IN ({list})"))
    }

    /// `column IN (?, ?, ...)` with every value bound.
    pub fn in_values(column: &str, values: Vec<Value>) -> Self {
        if values.is_empty() {
            return Self::literal(format!("{column} IN (NULL)"));
        }
        let placeholders = vec!["?"; values.len()].join(", ");
        Self::new(format!("{column} IN ({placeholders})"), values)
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Number this condition's markers and append its values to `params`.
    pub fn render(&self, indexer: &mut ParamIndexer, params: &mut Vec<Value>) -> Result<String> {
        if self.literal {
            return Ok(self.template.clone());
        }
        let placeholders = self.template.matches('?').count();
        if placeholders != self.args.len() {
            return Err(Error::sql_generation(format!(
                "'{}' has {} placeholders but {} values",
                self.template,
                placeholders,
                self.args.len()
            )));
        }
        let sql = indexer.number(&self.template);
        params.extend(self.args.iter().cloned());
        Ok(sql)
    }
}

/// AND-list, OR-list and at most one IN-clause of a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionSet {
    and: Vec<Condition>,
    or: Vec<Condition>,
    in_clause: Option<Condition>,
}

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_and(&mut self, condition: Condition) {
        self.and.push(condition);
    }

    pub fn push_or(&mut self, condition: Condition) {
        self.or.push(condition);
    }

    /// Replace the IN-clause; only the last one set is rendered.
    pub fn set_in(&mut self, condition: Condition) {
        self.in_clause = Some(condition);
    }

    pub fn is_empty(&self) -> bool {
        self.and.is_empty() && self.or.is_empty() && self.in_clause.is_none()
    }

    /// Render ` WHERE ...`, or an empty string when there is nothing to filter on.
    ///
    /// Markers continue from wherever `indexer` stands, so fragments rendered
    /// earlier in the same statement keep the lower numbers.
    pub fn render(&self, indexer: &mut ParamIndexer, params: &mut Vec<Value>) -> Result<String> {
        if self.is_empty() {
            return Ok(String::new());
        }

        let mut sql = String::from(" WHERE ");
        let mut first = true;

        for condition in &self.and {
            if !first {
                sql.push_str(" AND ");
            }
            sql.push_str(&condition.render(indexer, params)?);
            first = false;
        }

        for condition in &self.or {
            if !first {
                sql.push_str(" OR ");
            }
            sql.push_str(&condition.render(indexer, params)?);
            first = false;
        }

        if let Some(condition) = &self.in_clause {
            if !first {
                sql.push_str(" AND ");
            }
            sql.push_str(&condition.render(indexer, params)?);
        }

        Ok(sql)
    }
}
