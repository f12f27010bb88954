//! Engine-wide constants.

/// Maximum total byte length of the columns covered by one index.
pub const MAX_KEY_LENGTH: usize = 767;

/// MySQL limit on database identifier length.
pub const MAX_DATABASE_NAME_LENGTH: usize = 64;

/// MySQL limit on column identifier length.
pub const MAX_COLUMN_NAME_LENGTH: usize = 64;

/// Name of the per-backup-schema operation log table.
pub const REMOTE_BACKUP_TABLE: &str = "$_$Inception_backup_information$_$";

/// Statement answered directly before a batch is opened.
pub const VERSION_COMMENT_QUERY: &str = "select @@version_comment limit 1";

/// Statement answered directly before a batch is opened.
pub const SET_AUTOCOMMIT_QUERY: &str = "SET AUTOCOMMIT = 0";
