use crate::{
    dialect::{Dialect, DialectAdapter},
    value::{FieldType, Value},
};

/// Postgres rejects varchar sizes above this; larger strings become text.
const MAX_CHAR_SIZE: u64 = 10_485_760;

///
/// Postgres
///

pub struct Postgres;

impl DialectAdapter for Postgres {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn quote_ident(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    fn type_for(&self, ty: FieldType, size: Option<u64>) -> String {
        match ty {
            FieldType::Bool => "boolean".to_string(),
            FieldType::I8 | FieldType::U8 | FieldType::I16 | FieldType::U16 => {
                "smallint".to_string()
            }
            FieldType::I32 | FieldType::U32 => "int".to_string(),
            FieldType::I64 | FieldType::U64 => "bigint".to_string(),
            FieldType::F32 => "real".to_string(),
            FieldType::F64 => "double precision".to_string(),
            // Enum support is application level; the column is plain varchar.
            FieldType::String | FieldType::Enum => match size {
                Some(size) if size > MAX_CHAR_SIZE => "text".to_string(),
                Some(size) => format!("varchar({size})"),
                None => "varchar".to_string(),
            },
            FieldType::Bytes => "bytea".to_string(),
            FieldType::Time => "timestamp with time zone".to_string(),
        }
    }

    fn supports_returning(&self) -> bool {
        true
    }

    fn supports_transactional_ddl(&self) -> bool {
        true
    }

    fn constraint_error_patterns(&self) -> &'static [&'static str] {
        &[
            "duplicate key value violates unique constraint",
            "violates foreign key constraint",
        ]
    }

    fn literal(&self, value: &Value) -> String {
        match value {
            Value::Bool(true) => "true".to_string(),
            Value::Bool(false) => "false".to_string(),
            Value::Bytes(v) => {
                let hex: String = v.iter().map(|b| format!("{b:02x}")).collect();
                format!("'\\x{hex}'")
            }
            other => super::default_literal(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_numbered() {
        assert_eq!(Postgres.placeholder(1), "$1");
        assert_eq!(Postgres.placeholder(12), "$12");
    }

    #[test]
    fn narrow_integers_widen_to_smallint() {
        assert_eq!(Postgres.type_for(FieldType::I8, None), "smallint");
        assert_eq!(Postgres.type_for(FieldType::U16, None), "smallint");
    }

    #[test]
    fn oversized_strings_become_text() {
        assert_eq!(
            Postgres.type_for(FieldType::String, Some(MAX_CHAR_SIZE + 1)),
            "text"
        );
    }

    #[test]
    fn bool_literals_are_keywords() {
        assert_eq!(Postgres.literal(&Value::Bool(true)), "true");
    }
}
