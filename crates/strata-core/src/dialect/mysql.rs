use crate::{
    DEFAULT_STRING_LEN,
    dialect::{Dialect, DialectAdapter},
    value::FieldType,
};

///
/// MySql
///
/// MySQL has no RETURNING clause and no transactional DDL; batch-insert ids
/// derive from `LAST_INSERT_ID` arithmetic instead.
///

pub struct MySql;

impl DialectAdapter for MySql {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    fn quote_ident(&self, ident: &str) -> String {
        format!("`{ident}`")
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn type_for(&self, ty: FieldType, size: Option<u64>) -> String {
        match ty {
            FieldType::Bool => "boolean".to_string(),
            FieldType::I8 => "tinyint".to_string(),
            FieldType::U8 => "tinyint unsigned".to_string(),
            FieldType::I16 => "smallint".to_string(),
            FieldType::U16 => "smallint unsigned".to_string(),
            FieldType::I32 => "int".to_string(),
            FieldType::U32 => "int unsigned".to_string(),
            FieldType::I64 => "bigint".to_string(),
            FieldType::U64 => "bigint unsigned".to_string(),
            FieldType::F32 | FieldType::F64 => "double".to_string(),
            FieldType::String | FieldType::Enum => {
                let size = size.unwrap_or(DEFAULT_STRING_LEN);
                match size {
                    0..=0xFFFF => format!("varchar({size})"),
                    0x0001_0000..=0x00FF_FFFF => "mediumtext".to_string(),
                    _ => "longtext".to_string(),
                }
            }
            FieldType::Bytes => match size.unwrap_or(0xFFFF) {
                0..=0xFF => "tinyblob".to_string(),
                0x100..=0xFFFF => "blob".to_string(),
                0x0001_0000..=0x00FF_FFFF => "mediumblob".to_string(),
                _ => "longblob".to_string(),
            },
            FieldType::Time => "timestamp".to_string(),
        }
    }

    fn supports_returning(&self) -> bool {
        false
    }

    fn supports_transactional_ddl(&self) -> bool {
        false
    }

    fn constraint_error_patterns(&self) -> &'static [&'static str] {
        // 1062 duplicate entry, 1451/1452 foreign-key violations.
        &["Error 1062", "Error 1451", "Error 1452"]
    }
}
