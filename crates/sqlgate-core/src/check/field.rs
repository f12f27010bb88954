//! Column definition vetting shared by CREATE TABLE and the ALTER column
//! specs.

use crate::driver::Connector;
use crate::session::Session;
use sqlgate_commons::constants::MAX_COLUMN_NAME_LENGTH;
use sqlgate_commons::errors::CheckCode;
use sqlgate_sql::ast::{ColumnDefinition, FieldType};

impl<C: Connector> Session<C> {
    pub(crate) fn mysql_check_field(&mut self, table_name: &str, column: &ColumnDefinition) {
        let name = column.name.as_str();

        if matches!(
            column.field_type,
            FieldType::Enum(_) | FieldType::Set(_) | FieldType::Bit { .. }
        ) {
            self.append_error_no(CheckCode::InvalidDataType, &[name]);
        }

        if let FieldType::Char { len: Some(len) } = column.field_type {
            if len > 10 {
                self.append_error_no(CheckCode::CharToVarcharLen, &[name]);
            }
        }

        if column.charset.is_some() || column.collation.is_some() {
            self.append_error_no(CheckCode::CharsetOnColumn, &[table_name, name]);
        }

        let has_comment = column.comment.as_deref().is_some_and(|c| !c.is_empty());
        if !has_comment && self.config.check_column_comment {
            self.append_error_no(CheckCode::ColumnHaveNoComment, &[name, table_name]);
        }

        if column.field_type.is_blob_or_text() {
            self.append_error_no(CheckCode::UseTextOrBlob, &[name]);
        } else if !column.not_null && !self.config.enable_nullable {
            self.append_error_no(CheckCode::NotAllowedNullable, &[name, table_name]);
        }

        if name.len() > MAX_COLUMN_NAME_LENGTH {
            self.append_error_no(CheckCode::WrongColumnName, &[name]);
        }

        if column.field_type.is_blob_or_text() && column.not_null {
            self.append_error_no(CheckCode::TextNotNullableError, &[name, table_name]);
        }

        if column.auto_increment {
            if !column.field_type.is_unsigned() {
                self.append_error_no(CheckCode::AutoincUnsigned, &[table_name]);
            }

            if !column.field_type.allows_auto_increment() {
                self.append_error_no(CheckCode::SetDataTypeIntBigint, &[]);
            }
        }

        if matches!(column.field_type, FieldType::Timestamp { .. })
            && !column.has_no_default_flag()
        {
            self.append_error_no(CheckCode::TimestampDefault, &[table_name]);
        }
    }
}
