//! End-to-end batch scenarios over the mock driver.

mod common;

use common::*;
use sqlgate_commons::errors::DriverError;
use sqlgate_commons::models::BinlogPosition;
use sqlgate_commons::AuditConfig;
use sqlgate_core::BatchOutput;

fn rows(output: BatchOutput) -> Vec<sqlgate_commons::models::ResultRow> {
    match output {
        BatchOutput::Records(rows) => rows,
        BatchOutput::Variables(_) => panic!("expected records"),
    }
}

#[test]
fn missing_begin_marker_aborts_with_trailer() {
    let state = new_state();
    let mut session = session(&state);

    let result = rows(session.run("SELECT 1;"));

    assert_eq!(result.len(), 2);
    assert_eq!(result[0].err_level, 2);
    assert_eq!(result[0].sql, "SELECT 1");
    assert!(result[0]
        .error_message
        .contains("Must start as begin statement."));
    assert_eq!(result[1].err_level, 2);
    assert!(result[1].error_message.contains("Must end with commit."));
}

#[test]
fn create_table_without_primary_key_is_rejected() {
    let state = new_state();
    let mut session = session(&state);

    let input = batch("", "CREATE TABLE test.t1(a INT) ENGINE=INNODB;");
    let result = rows(session.run(&input));

    assert_eq!(result.len(), 2);
    assert_eq!(result[1].err_level, 2);
    assert!(result[1]
        .error_message
        .contains("Set a primary key for table 't1'"));
}

#[test]
fn add_column_execution_produces_drop_column_rollback() {
    let state = new_state();
    let mut session = session(&state);

    let input = batch(
        "--execute=true;",
        "CREATE TABLE test.t1(id INT PRIMARY KEY, c INT) ENGINE=INNODB COMMENT='x';\n\
         ALTER TABLE test.t1 ADD COLUMN d INT COMMENT 'y';",
    );
    let result = rows(session.run(&input));

    assert_eq!(result.len(), 3);
    assert_eq!(result[1].stage_status, "EXEC_OK");
    assert_eq!(result[2].stage_status, "EXEC_OK");

    let records = session.records();
    assert_eq!(
        records.get(1).unwrap().ddl_rollback,
        "DROP TABLE `test`.`t1`;"
    );
    assert_eq!(
        records.get(2).unwrap().ddl_rollback,
        "ALTER TABLE `test`.`t1` DROP COLUMN `d`;"
    );
}

#[test]
fn drop_column_rollback_preserves_type_null_default_comment() {
    let state = new_state();
    state.borrow_mut().tables.insert(
        "test.t2".to_string(),
        vec![
            field("id", "int(11)", "NO", "PRI"),
            field_with_default("c", "varchar(10)", "NO", "x", "y"),
        ],
    );
    let mut session = session(&state);

    let input = batch("--execute=true;", "ALTER TABLE test.t2 DROP COLUMN c;");
    let result = rows(session.run(&input));

    assert_eq!(result.len(), 2);
    assert_eq!(result[1].err_level, 0);
    assert_eq!(
        session.records().get(1).unwrap().ddl_rollback,
        "ALTER TABLE `test`.`t2` ADD COLUMN `c` varchar(10) NOT NULL DEFALUT 'x' COMMENT 'y';"
    );
}

#[test]
fn duplicate_index_detected_from_single_live_probe() {
    let state = new_state();
    {
        let mut s = state.borrow_mut();
        s.tables.insert(
            "test.t3".to_string(),
            vec![field("id", "int(11)", "NO", "PRI"), field("b", "int(11)", "YES", "")],
        );
        s.indexes.insert(
            "test.t3".to_string(),
            vec![index_row("t3", "ix_a", 1, "a", true)],
        );
    }
    let mut session = session(&state);

    let input = batch("", "ALTER TABLE test.t3 ADD INDEX ix_a (b);");
    let result = rows(session.run(&input));

    assert_eq!(result[1].err_level, 2);
    assert!(result[1].error_message.contains("Duplicate index 'ix_a'"));
    assert_eq!(state.borrow().call_count("show_index"), 1);
}

#[test]
fn dml_backup_records_binlog_window_and_operation_row() {
    let state = new_state();
    {
        let mut s = state.borrow_mut();
        s.tables.insert(
            "test.t1".to_string(),
            vec![field("id", "int(11)", "NO", "PRI")],
        );
        s.variables.insert("log_bin".to_string(), "ON".to_string());
        s.variables
            .insert("binlog_format".to_string(), "ROW".to_string());
        s.master_positions
            .push_back(BinlogPosition::new("bin.1", 100));
        s.master_positions
            .push_back(BinlogPosition::new("bin.1", 200));
    }
    let mut session = session_with(backup_config(), &state);

    let input = batch(
        "--execute=true;--backup=true;",
        "INSERT INTO test.t1 VALUES (1);",
    );
    let result = rows(session.run(&input));

    assert_eq!(result.len(), 2);
    assert_eq!(result[1].stage_status, "BACKUP_OK");

    let record = session.records().get(1).unwrap();
    assert_eq!(record.start_file, "bin.1");
    assert_eq!(record.start_position, 100);
    assert_eq!(record.end_file, "bin.1");
    assert_eq!(record.end_position, 200);
    assert_eq!(record.backup_db_name, "127_0_0_1_3306_test");
    assert!(!record.opid.is_empty());

    let state = state.borrow();
    let op_row = state
        .exec_log
        .iter()
        .find(|sql| sql.contains("$_$Inception_backup_information$_$") && sql.starts_with("INSERT"))
        .expect("operation-info row written");
    assert!(op_row.contains("`127_0_0_1_3306_test`"));
    assert!(op_row.contains("'bin.1'"));
    assert!(op_row.ends_with("'INSERT')"));
}

#[test]
fn check_mode_never_touches_the_target() {
    let state = new_state();
    let mut session = session(&state);

    let input = batch(
        "--check=true;--execute=true;--backup=true;",
        "CREATE TABLE test.t9(id INT PRIMARY KEY) ENGINE=INNODB;",
    );
    let result = rows(session.run(&input));

    assert_eq!(result.len(), 2);
    assert_eq!(result[1].stage, "CHECK");
    assert_eq!(result[1].stage_status, "OK");
    assert!(state.borrow().exec_log.is_empty());
}

#[test]
fn created_table_resolves_from_cache_without_live_lookup() {
    let state = new_state();
    let mut session = session(&state);

    let input = batch(
        "",
        "CREATE TABLE test.tc(id INT PRIMARY KEY, a INT) ENGINE=INNODB;\n\
         INSERT INTO test.tc (a) VALUES (1);",
    );
    let result = rows(session.run(&input));

    assert_eq!(result[2].err_level, 0);
    // one probe from CREATE's existence check; the INSERT hits the cache
    assert_eq!(state.borrow().call_count("show_full_fields"), 1);
}

#[test]
fn dropped_table_reports_not_exists_without_live_lookup() {
    let state = new_state();
    state.borrow_mut().tables.insert(
        "test.t4".to_string(),
        vec![field("id", "int(11)", "NO", "PRI")],
    );
    let config = AuditConfig {
        enable_drop_table: true,
        ..Default::default()
    };
    let mut session = session_with(config, &state);

    let input = batch(
        "",
        "DROP TABLE test.t4;\nINSERT INTO test.t4 VALUES (1);",
    );
    let result = rows(session.run(&input));

    assert_eq!(result[2].err_level, 2);
    assert!(result[2].error_message.contains("doesn't exist"));
    assert_eq!(state.borrow().call_count("show_full_fields"), 1);
}

#[test]
fn warnings_gate_execution_unless_ignored() {
    let config = AuditConfig {
        enable_nullable: false,
        ..Default::default()
    };
    let body = "CREATE TABLE test.tw(id INT PRIMARY KEY, c INT) ENGINE=INNODB;";

    let state = new_state();
    let mut blocked = session_with(config.clone(), &state);
    let result = rows(blocked.run(&batch("--execute=true;", body)));
    assert_eq!(result[1].err_level, 1);
    assert!(state.borrow().exec_log.is_empty());

    let state = new_state();
    let mut ignored = session_with(config, &state);
    let result = rows(ignored.run(&batch("--execute=true;--ignore_warnings=true;", body)));
    assert_eq!(result[1].err_level, 1);
    assert_eq!(result[1].stage_status, "EXEC_OK");
    assert!(state
        .borrow()
        .exec_log
        .iter()
        .any(|sql| sql.starts_with("CREATE TABLE test.tw")));
}

#[test]
fn missing_commit_appends_synthetic_record() {
    let state = new_state();
    let mut session = session(&state);

    let input = format!(
        "{}CREATE TABLE test.t1(id INT PRIMARY KEY) ENGINE=INNODB;",
        begin_marker("")
    );
    let result = rows(session.run(&input));

    assert_eq!(result.len(), 3);
    let trailer = result.last().unwrap();
    assert_eq!(trailer.err_level, 2);
    assert_eq!(trailer.sql, "");
    assert!(trailer.error_message.contains("Must end with commit."));
}

#[test]
fn execute_failure_marks_record_and_halts() {
    let state = new_state();
    {
        let mut s = state.borrow_mut();
        s.tables.insert(
            "test.t1".to_string(),
            vec![field("id", "int(11)", "NO", "PRI")],
        );
        s.exec_failures.insert(
            "INSERT INTO test.t1 VALUES (1)".to_string(),
            DriverError::new(1062, "Duplicate entry '1' for key 'PRIMARY'"),
        );
    }
    let mut session = session(&state);

    let input = batch(
        "--execute=true;",
        "INSERT INTO test.t1 VALUES (1);\nINSERT INTO test.t1 VALUES (2);",
    );
    let result = rows(session.run(&input));

    assert_eq!(result[1].stage_status, "EXEC_FAIL");
    assert_eq!(result[1].err_level, 2);
    assert!(result[1].error_message.contains("Duplicate entry"));
    // the second insert never ran
    assert!(!state
        .borrow()
        .exec_log
        .iter()
        .any(|sql| sql.contains("VALUES (2)")));
    assert_eq!(result[2].stage, "CHECK");
}
