
use itertools::Itertools;

use super::{CollectionSpec, PayloadKind, PayloadValue};
use crate::{RecipeError, Result};

/// A single filter condition on a declared payload field
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Exact match on a scalar payload field
    Equals { field: String, value: PayloadValue },
    /// Set membership: the field's value is one of the given strings
    OneOf { field: String, values: Vec<String> },
    /// List containment: a text-list field contains the given string
    Contains { field: String, value: String },
}

/// Conjunction of conditions restricting search results by payload attributes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    #[inline]
    pub fn push(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    #[inline]
    pub fn equals(mut self, field: impl Into<String>, value: PayloadValue) -> Self {
        self.conditions.push(Condition::Equals {
            field: field.into(),
            value,
        });
        self
    }

    #[inline]
    pub fn one_of(mut self, field: impl Into<String>, values: Vec<String>) -> Self {
        self.conditions.push(Condition::OneOf {
            field: field.into(),
            values,
        });
        self
    }

    #[inline]
    pub fn contains(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions.push(Condition::Contains {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Build a filter from CLI-style `field=value` arguments, resolving each
    /// field's kind against the collection spec.
    ///
    /// `equals` become exact-match conditions (values parsed per the declared
    /// kind), `one_of` take comma-separated value sets, and `contains` match
    /// against text-list fields.
    #[inline]
    pub fn from_cli_args(
        spec: &CollectionSpec,
        equals: &[String],
        one_of: &[String],
        contains: &[String],
    ) -> Result<Self> {
        let mut filter = Self::new();

        for arg in equals {
            let (field, raw) = split_arg(arg)?;
            let kind = declared_kind(spec, field)?;
            let value = match kind {
                PayloadKind::Text => PayloadValue::Text(raw.to_string()),
                PayloadKind::Number => PayloadValue::Number(raw.parse().map_err(|_| {
                    RecipeError::InvalidInput(format!(
                        "filter field '{}' expects a number, got '{}'",
                        field, raw
                    ))
                })?),
                PayloadKind::Flag => PayloadValue::Flag(raw.parse().map_err(|_| {
                    RecipeError::InvalidInput(format!(
                        "filter field '{}' expects true or false, got '{}'",
                        field, raw
                    ))
                })?),
                PayloadKind::TextList => {
                    return Err(RecipeError::InvalidInput(format!(
                        "field '{}' is a list; use --has to match its elements",
                        field
                    )));
                }
            };
            filter.push(Condition::Equals {
                field: field.to_string(),
                value,
            });
        }

        for arg in one_of {
            let (field, raw) = split_arg(arg)?;
            let values: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect();
            if values.is_empty() {
                return Err(RecipeError::InvalidInput(format!(
                    "empty value set for filter field '{}'",
                    field
                )));
            }
            filter.push(Condition::OneOf {
                field: field.to_string(),
                values,
            });
        }

        for arg in contains {
            let (field, raw) = split_arg(arg)?;
            filter.push(Condition::Contains {
                field: field.to_string(),
                value: raw.to_string(),
            });
        }

        Ok(filter)
    }

    /// Render the filter as a SQL predicate for the store, validating every
    /// condition against the collection's declared payload fields.
    #[inline]
    pub fn to_predicate(&self, spec: &CollectionSpec) -> Result<String> {
        let mut clauses = Vec::with_capacity(self.conditions.len());

        for condition in &self.conditions {
            clauses.push(render_condition(condition, spec)?);
        }

        Ok(clauses.join(" AND "))
    }
}

fn render_condition(condition: &Condition, spec: &CollectionSpec) -> Result<String> {
    match condition {
        Condition::Equals { field, value } => {
            let kind = declared_kind(spec, field)?;
            if value.kind() != kind {
                return Err(RecipeError::InvalidInput(format!(
                    "filter field '{}' expects {}, got {}",
                    field,
                    kind,
                    value.kind()
                )));
            }
            let literal = match value {
                PayloadValue::Text(s) => format!("'{}'", escape(s)),
                PayloadValue::Number(n) => format!("{}", n),
                PayloadValue::Flag(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
                PayloadValue::TextList(_) => {
                    return Err(RecipeError::InvalidInput(format!(
                        "cannot equality-match list field '{}'",
                        field
                    )));
                }
            };
            Ok(format!("{} = {}", field, literal))
        }
        Condition::OneOf { field, values } => {
            let kind = declared_kind(spec, field)?;
            if kind != PayloadKind::Text {
                return Err(RecipeError::InvalidInput(format!(
                    "set-membership filter requires a text field, '{}' is {}",
                    field, kind
                )));
            }
            if values.is_empty() {
                return Err(RecipeError::InvalidInput(format!(
                    "empty value set for filter field '{}'",
                    field
                )));
            }
            let literals = values.iter().map(|v| format!("'{}'", escape(v))).join(", ");
            Ok(format!("{} IN ({})", field, literals))
        }
        Condition::Contains { field, value } => {
            let kind = declared_kind(spec, field)?;
            if kind != PayloadKind::TextList {
                return Err(RecipeError::InvalidInput(format!(
                    "contains filter requires a text_list field, '{}' is {}",
                    field, kind
                )));
            }
            Ok(format!("array_has({}, '{}')", field, escape(value)))
        }
    }
}

fn declared_kind(spec: &CollectionSpec, field: &str) -> Result<PayloadKind> {
    spec.field(field).map(|f| f.kind).ok_or_else(|| {
        RecipeError::InvalidInput(format!(
            "unknown filter field '{}'; declared fields: {}",
            field,
            spec.payload_fields.iter().map(|f| f.name.as_str()).join(", ")
        ))
    })
}

fn split_arg(arg: &str) -> Result<(&str, &str)> {
    arg.split_once('=')
        .map(|(field, value)| (field.trim(), value.trim()))
        .filter(|(field, value)| !field.is_empty() && !value.is_empty())
        .ok_or_else(|| {
            RecipeError::InvalidInput(format!("filter must be of the form field=value: '{}'", arg))
        })
}

// String literals are single-quoted in the store's SQL dialect.
fn escape(value: &str) -> String {
    value.replace('\'', "''")
}
