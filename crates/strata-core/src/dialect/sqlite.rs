use crate::{
    DEFAULT_STRING_LEN,
    dialect::{Dialect, DialectAdapter},
    value::FieldType,
};

///
/// Sqlite
///
/// SQLite accepts RETURNING and transactional DDL, but cannot alter column
/// types or attach foreign keys after table creation; the migration
/// executor refuses those entries before anything runs.
///

pub struct Sqlite;

impl DialectAdapter for Sqlite {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn quote_ident(&self, ident: &str) -> String {
        format!("`{ident}`")
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn type_for(&self, ty: FieldType, size: Option<u64>) -> String {
        match ty {
            FieldType::Bool => "bool".to_string(),
            FieldType::I8
            | FieldType::I16
            | FieldType::I32
            | FieldType::U8
            | FieldType::U16
            | FieldType::U32 => "integer".to_string(),
            FieldType::I64 | FieldType::U64 => "bigint".to_string(),
            FieldType::F32 | FieldType::F64 => "real".to_string(),
            // No size limit on varchar; the size is kept for declared intent.
            FieldType::String | FieldType::Enum => {
                format!("varchar({})", size.unwrap_or(DEFAULT_STRING_LEN))
            }
            FieldType::Bytes => "blob".to_string(),
            FieldType::Time => "datetime".to_string(),
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
            "UNIQUE constraint failed",
            "FOREIGN KEY constraint failed",
            "CHECK constraint failed",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_integers_share_one_affinity() {
        assert_eq!(Sqlite.type_for(FieldType::I8, None), "integer");
        assert_eq!(Sqlite.type_for(FieldType::U32, None), "integer");
        assert_eq!(Sqlite.type_for(FieldType::I64, None), "bigint");
    }

    #[test]
    fn strings_keep_declared_size() {
        assert_eq!(Sqlite.type_for(FieldType::String, Some(36)), "varchar(36)");
        assert_eq!(Sqlite.type_for(FieldType::Enum, None), "varchar(255)");
    }
}
