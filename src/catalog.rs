//! Allowlist of relations and columns that projection queries may name.
//!
//! Table, view and column names cannot be bound as statement parameters, so
//! they are spliced into SQL text. Before that happens each name must look like
//! a plain identifier and must exist in this catalog, which is introspected from
//! the live database at startup and again after every bootstrap.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::GatewayError;
use crate::executor::Executor;
use crate::results::{CustomDbRow, ResultSet};
use crate::types::{DatabaseType, RowValues};

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("identifier pattern is valid")
});

const POSTGRES_RELATIONS: &str = "\
select c.table_name::text as relation_name,
       case when t.table_type = 'VIEW' then 'view' else 'table' end as relation_type,
       c.column_name::text as column_name
from information_schema.columns c
join information_schema.tables t
  on t.table_schema = c.table_schema and t.table_name = c.table_name
where c.table_schema = current_schema()
order by c.table_name, c.ordinal_position";

const POSTGRES_PROCEDURES: &str = "\
select routine_name::text as routine_name
from information_schema.routines
where routine_schema = current_schema() and routine_type = 'PROCEDURE'";

const SQLITE_RELATIONS: &str = "\
select m.name as relation_name, m.type as relation_type, p.name as column_name
from sqlite_master m join pragma_table_info(m.name) p
where m.type in ('table', 'view') and m.name not like 'sqlite_%'
order by m.name, p.cid";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    Table,
    View,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relation {
    pub name: String,
    pub kind: RelationKind,
    pub columns: Vec<String>,
}

impl Relation {
    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c.eq_ignore_ascii_case(column))
    }
}

/// Relations keyed by lower-cased name; lookups ignore ASCII case because both
/// backends fold unquoted identifiers.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    relations: BTreeMap<String, Relation>,
    procedures: BTreeSet<String>,
}

impl SchemaCatalog {
    /// Introspect the schema visible through `executor`.
    ///
    /// # Errors
    /// Returns the driver error if the catalog query fails.
    pub async fn load(executor: &dyn Executor) -> Result<Self, GatewayError> {
        let (relations_sql, procedures_sql) = match executor.database_type() {
            DatabaseType::Postgres => (POSTGRES_RELATIONS, Some(POSTGRES_PROCEDURES)),
            DatabaseType::Sqlite => (SQLITE_RELATIONS, None),
        };

        let rows = executor.execute(relations_sql, &[]).await?;
        let mut catalog = Self::from_column_listing(&rows)?;

        if let Some(sql) = procedures_sql {
            let rows = executor.execute(sql, &[]).await?;
            catalog.procedures = rows
                .results
                .iter()
                .filter_map(|row| row.get_by_index(0).and_then(RowValues::as_text))
                .map(str::to_ascii_lowercase)
                .collect();
        }

        info!(
            relations = catalog.relations.len(),
            procedures = catalog.procedures.len(),
            "schema catalog loaded"
        );
        Ok(catalog)
    }

    /// Build from rows of `(relation_name, relation_type, column_name)`.
    ///
    /// # Errors
    /// `GatewayError::ExecutionError` if a row does not have that shape.
    pub fn from_column_listing(rows: &ResultSet) -> Result<Self, GatewayError> {
        let mut relations: BTreeMap<String, Relation> = BTreeMap::new();
        for row in &rows.results {
            let name = text_at(row, 0)?;
            let kind = if text_at(row, 1)?.eq_ignore_ascii_case("view") {
                RelationKind::View
            } else {
                RelationKind::Table
            };
            let column = text_at(row, 2)?;

            relations
                .entry(name.to_ascii_lowercase())
                .or_insert_with(|| Relation {
                    name: name.to_string(),
                    kind,
                    columns: Vec::new(),
                })
                .columns
                .push(column.to_string());
        }
        Ok(Self {
            relations,
            procedures: BTreeSet::new(),
        })
    }

    #[must_use]
    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(&name.to_ascii_lowercase())
    }

    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Stored procedures the database reported (empty for backends without them).
    #[must_use]
    pub fn has_procedure(&self, name: &str) -> bool {
        self.procedures.contains(&name.to_ascii_lowercase())
    }

    #[must_use]
    pub fn knows_procedures(&self) -> bool {
        !self.procedures.is_empty()
    }

    /// Validate the identifiers of a projection before they are spliced into SQL.
    ///
    /// # Errors
    /// `GatewayError::MalformedRequest` if either name is not a plain identifier,
    /// the relation is unknown, or the relation has no such column.
    pub fn check_projection(&self, table: &str, attribute: Option<&str>) -> Result<(), GatewayError> {
        check_identifier(table)?;
        let relation = self.relation(table).ok_or_else(|| {
            GatewayError::MalformedRequest(format!("unknown table or view: {table}"))
        })?;

        if let Some(attribute) = attribute {
            check_identifier(attribute)?;
            if !relation.has_column(attribute) {
                return Err(GatewayError::MalformedRequest(format!(
                    "unknown attribute {attribute} on {}",
                    relation.name
                )));
            }
        }
        debug!(table, ?attribute, "projection identifiers accepted");
        Ok(())
    }
}

fn text_at(row: &CustomDbRow, idx: usize) -> Result<&str, GatewayError> {
    row.get_by_index(idx)
        .and_then(RowValues::as_text)
        .ok_or_else(|| GatewayError::ExecutionError(format!("catalog row has no text in column {idx}")))
}

/// Accept only `[A-Za-z_][A-Za-z0-9_]*` names of at most 63 bytes.
///
/// # Errors
/// `GatewayError::MalformedRequest` for anything else.
pub fn check_identifier(name: &str) -> Result<&str, GatewayError> {
    if IDENTIFIER.is_match(name) {
        Ok(name)
    } else {
        Err(GatewayError::MalformedRequest(format!(
            "invalid identifier: {name:?}"
        )))
    }
}
