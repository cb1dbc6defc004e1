//! Mapping-expression grammar: a small AST parsed once per target column.
//!
//! Expressions arrive as prefixed strings in the schema map
//! (`OPTIONSET:vin_ctstatus`, `FK:dim_product.vin_productid|_vin_mainproduct_value`,
//! `COALESCE(new_disease_simple, 'Unknown')`, ...). They are parsed exactly
//! once, at schema compile time, into this sum type; per-row evaluation never
//! touches the string form again. Unrecognized syntax is a configuration
//! error raised before any extraction starts.

use crate::error::{CoreError, CoreResult};
use crate::value::Value;

/// A parsed mapping expression for one target column.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `LITERAL:<v>` - the same value for every row.
    Literal(Value),
    /// `LOOKUP:<NAME>` - static constant table keyed by a row value.
    Lookup(String),
    /// `OPTIONSET:<col>` - resolve an integer code to its label.
    Optionset { column: String },
    /// `FK:<dim>.<lookup_col>|<source>` - single-column surrogate key lookup.
    Fk {
        dimension: String,
        lookup_column: String,
        source: FkSource,
    },
    /// `FK:<dim>.COMPOSITE|<c1>,<c2>,...` - composite natural-key lookup.
    FkComposite {
        dimension: String,
        columns: Vec<String>,
    },
    /// `CASE WHEN <col> = <lit> THEN <a> ELSE <b> END`
    Case(CaseExpr),
    /// `COALESCE(<col>, <default>)`
    Coalesce {
        /// `None` for the `COALESCE(NULL, ...)` placeholder form, which
        /// always yields the default.
        column: Option<String>,
        default: Value,
    },
    /// Direct passthrough of a source column.
    Column(String),
    /// Placeholder for columns produced by the date-spine generator.
    Generated,
    /// Placeholder for the value column of a delimited-field dimension.
    Delimited,
}

/// Where a single-column FK reads its natural-key value from.
#[derive(Debug, Clone, PartialEq)]
pub enum FkSource {
    /// Plain source column.
    Column(String),
    /// `EXTRACT_DATE:<col>` - leading `YYYY-MM-DD` of an ISO timestamp.
    DatePart(String),
    /// `DELIMITED_VALUE` - the current part of a delimited bridge.
    Delimited,
}

/// A single-branch conditional over one source column and a literal.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseExpr {
    pub column: String,
    /// `true` for `!=` / `<>`, `false` for `=`.
    pub negated: bool,
    pub compare: Value,
    pub then_value: Value,
    pub else_value: Value,
}

impl Expr {
    /// The dimension this expression references, if it is an FK.
    pub fn referenced_dimension(&self) -> Option<&str> {
        match self {
            Expr::Fk { dimension, .. } | Expr::FkComposite { dimension, .. } => Some(dimension),
            _ => None,
        }
    }

    pub fn is_fk(&self) -> bool {
        self.referenced_dimension().is_some()
    }
}

/// Parse one mapping-expression string.
///
/// Kinds are matched by prefix/shape in the documented precedence; anything
/// that is not a recognized form and not a bare column identifier fails.
pub fn parse(raw: &str) -> CoreResult<Expr> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(parse_err(raw, "empty expression"));
    }

    if let Some(rest) = raw.strip_prefix("LITERAL:") {
        return Ok(Expr::Literal(Value::parse_literal(rest)));
    }
    if let Some(rest) = raw.strip_prefix("LOOKUP:") {
        if rest.is_empty() {
            return Err(parse_err(raw, "missing lookup name"));
        }
        return Ok(Expr::Lookup(rest.to_string()));
    }
    if let Some(rest) = raw.strip_prefix("OPTIONSET:") {
        if !is_identifier(rest) {
            return Err(parse_err(raw, "optionset column must be an identifier"));
        }
        return Ok(Expr::Optionset {
            column: rest.to_string(),
        });
    }
    if let Some(rest) = raw.strip_prefix("FK:") {
        return parse_fk(raw, rest);
    }
    if raw.to_ascii_uppercase().starts_with("CASE WHEN") {
        return parse_case(raw);
    }
    if raw.starts_with("COALESCE(") {
        return parse_coalesce(raw);
    }
    if raw == "GENERATED" {
        return Ok(Expr::Generated);
    }
    if raw == "DELIMITED_VALUE" {
        return Ok(Expr::Delimited);
    }
    if is_identifier(raw) {
        return Ok(Expr::Column(raw.to_string()));
    }

    Err(parse_err(raw, "unrecognized expression kind"))
}

fn parse_err(expr: &str, reason: &str) -> CoreError {
    CoreError::ExprParse {
        expr: expr.to_string(),
        reason: reason.to_string(),
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `FK:<dim>.<lookup_col>|<source>` or `FK:<dim>.COMPOSITE|<c1>,<c2>,...`
fn parse_fk(raw: &str, body: &str) -> CoreResult<Expr> {
    let (dim_ref, source_ref) = body
        .split_once('|')
        .ok_or_else(|| parse_err(raw, "FK expression requires '|<source>'"))?;
    let (dimension, lookup_column) = dim_ref
        .split_once('.')
        .ok_or_else(|| parse_err(raw, "FK target must be '<dim>.<lookup_col>'"))?;

    if !is_identifier(dimension) {
        return Err(parse_err(raw, "FK dimension must be an identifier"));
    }

    if lookup_column == "COMPOSITE" {
        let columns: Vec<String> = source_ref
            .split(',')
            .map(|c| c.trim().to_string())
            .collect();
        if columns.is_empty() || columns.iter().any(|c| !is_identifier(c)) {
            return Err(parse_err(raw, "composite FK needs comma-separated columns"));
        }
        return Ok(Expr::FkComposite {
            dimension: dimension.to_string(),
            columns,
        });
    }

    if !is_identifier(lookup_column) {
        return Err(parse_err(raw, "FK lookup column must be an identifier"));
    }

    let source = if let Some(col) = source_ref.strip_prefix("EXTRACT_DATE:") {
        if !is_identifier(col) {
            return Err(parse_err(raw, "EXTRACT_DATE column must be an identifier"));
        }
        FkSource::DatePart(col.to_string())
    } else if source_ref == "DELIMITED_VALUE" {
        FkSource::Delimited
    } else if is_identifier(source_ref) {
        FkSource::Column(source_ref.to_string())
    } else {
        return Err(parse_err(raw, "FK source must be an identifier"));
    };

    Ok(Expr::Fk {
        dimension: dimension.to_string(),
        lookup_column: lookup_column.to_string(),
        source,
    })
}

/// `COALESCE(<col>, '<default>')` or `COALESCE(<col>, <int>)`;
/// `COALESCE(NULL, ...)` is the constant-default placeholder form.
fn parse_coalesce(raw: &str) -> CoreResult<Expr> {
    let inner = raw
        .strip_prefix("COALESCE(")
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| parse_err(raw, "unbalanced COALESCE parentheses"))?;
    let (col, default) = inner
        .split_once(',')
        .ok_or_else(|| parse_err(raw, "COALESCE requires a default"))?;

    let col = col.trim();
    let column = if col == "NULL" {
        None
    } else if is_identifier(col) {
        Some(col.to_string())
    } else {
        return Err(parse_err(raw, "COALESCE column must be an identifier"));
    };

    Ok(Expr::Coalesce {
        column,
        default: parse_literal_token(raw, default.trim())?,
    })
}

/// A quoted string or integer literal inside CASE/COALESCE.
fn parse_literal_token(raw: &str, token: &str) -> CoreResult<Value> {
    if let Some(s) = token.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        return Ok(Value::Text(s.to_string()));
    }
    token
        .parse::<i64>()
        .map(Value::Int)
        .map_err(|_| parse_err(raw, "expected a quoted string or integer literal"))
}

/// `CASE WHEN <col> <op> <lit> THEN <lit> ELSE <lit> END` with `=` or `!=`/`<>`.
/// Keywords are matched case-insensitively; at most one branch is taken.
fn parse_case(raw: &str) -> CoreResult<Expr> {
    let upper = raw.to_ascii_uppercase();
    let then_at = upper
        .find(" THEN ")
        .ok_or_else(|| parse_err(raw, "CASE WHEN requires THEN"))?;
    let else_at = upper
        .find(" ELSE ")
        .ok_or_else(|| parse_err(raw, "CASE WHEN requires ELSE"))?;
    if !upper.ends_with(" END") || else_at < then_at {
        return Err(parse_err(raw, "malformed CASE WHEN"));
    }

    let cond = raw["CASE WHEN".len()..then_at].trim();
    let then_tok = raw[then_at + " THEN ".len()..else_at].trim();
    let else_tok = raw[else_at + " ELSE ".len()..raw.len() - " END".len()].trim();

    let (column, negated, compare_tok) = if let Some((l, r)) = cond.split_once("!=") {
        (l.trim(), true, r.trim())
    } else if let Some((l, r)) = cond.split_once("<>") {
        (l.trim(), true, r.trim())
    } else if let Some((l, r)) = cond.split_once('=') {
        (l.trim(), false, r.trim())
    } else {
        return Err(parse_err(raw, "CASE condition must compare with '=' or '!='"));
    };

    if !is_identifier(column) {
        return Err(parse_err(raw, "CASE condition column must be an identifier"));
    }

    Ok(Expr::Case(CaseExpr {
        column: column.to_string(),
        negated,
        compare: parse_literal_token(raw, compare_tok)?,
        then_value: parse_literal_token(raw, then_tok)?,
        else_value: parse_literal_token(raw, else_tok)?,
    }))
}

#[cfg(test)]
#[path = "expr_test.rs"]
mod tests;
