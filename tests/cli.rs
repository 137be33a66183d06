mod common;

use std::fs;

use assert_cmd::Command;
use common::{PARCELS_CSV, TestWorkspace};
use predicates::{prelude::PredicateBooleanExt, str::contains};

fn csv2psql() -> Command {
    let mut cmd = Command::cargo_bin("csv2psql").expect("binary exists");
    cmd.env_remove("CSV2PSQL_SCHEMA").env_remove("CSV2PSQL_ROLE");
    cmd
}

#[test]
fn convert_names_the_table_after_the_file() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("Parcels.csv", PARCELS_CSV);

    csv2psql()
        .args(["convert", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("CREATE TABLE parcels ("))
        .stdout(contains("COPY parcels FROM stdin NULL AS '';"))
        .stdout(contains("1002\t7\t98000\tGrace Hopper\t20200115"));
}

#[test]
fn table_names_starting_with_public_keep_their_name() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("publications.csv", PARCELS_CSV);

    csv2psql()
        .args(["convert", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("CREATE TABLE publications ("))
        .stdout(contains("search_path").not());
}

#[test]
fn convert_writes_to_an_output_file() -> anyhow::Result<()> {
    let workspace = TestWorkspace::new();
    let input = workspace.write("parcels.csv", PARCELS_CSV);
    let output = workspace.path().join("parcels.sql");

    csv2psql()
        .args([
            "convert",
            input.to_str().unwrap(),
            "county_parcels",
            "-o",
            output.to_str().unwrap(),
            "--key",
            "parcel_id",
            "--merge",
            "--serial",
            "id",
        ])
        .assert()
        .success();

    let sql = fs::read_to_string(&output)?;
    assert!(sql.contains("CREATE TABLE temp_county_parcels ("));
    assert!(sql.contains("ADD COLUMN id SERIAL;"));
    assert!(sql.contains("LOCK TABLE county_parcels IN EXCLUSIVE MODE;"));
    Ok(())
}

#[test]
fn convert_reads_stdin_with_an_explicit_table() {
    csv2psql()
        .args(["convert", "-", "parcels", "--show-notices", "--no-analyze"])
        .write_stdin(PARCELS_CSV)
        .assert()
        .success()
        .stdout(contains("COPY parcels FROM stdin"))
        .stdout(contains("client_min_messages").not())
        .stdout(contains("ANALYZE").not());
}

#[test]
fn convert_from_stdin_needs_a_table_name() {
    csv2psql()
        .args(["convert", "-"])
        .write_stdin(PARCELS_CSV)
        .assert()
        .failure()
        .stderr(contains("cannot guess a table name"));
}

#[test]
fn unknown_datatype_is_rejected() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("parcels.csv", PARCELS_CSV);

    csv2psql()
        .args([
            "convert",
            input.to_str().unwrap(),
            "--datatype",
            "block:varchar",
        ])
        .assert()
        .failure()
        .stderr(contains("Unknown datatype 'varchar'"));
}

#[test]
fn schema_and_role_come_from_the_environment() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("parcels.csv", PARCELS_CSV);

    csv2psql()
        .env("CSV2PSQL_SCHEMA", "gis")
        .env("CSV2PSQL_ROLE", "loader")
        .args(["convert", input.to_str().unwrap(), "--utf8"])
        .assert()
        .success()
        .stdout(contains(
            "SET ROLE loader;\nSET search_path TO gis;\n\\encoding UTF8\n",
        ))
        .stdout(contains("ALTER TABLE parcels OWNER TO loader;"));
}

#[test]
fn convert_applies_dates_and_join_keys() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("parcels.csv", PARCELS_CSV);

    csv2psql()
        .args([
            "convert",
            input.to_str().unwrap(),
            "--dates",
            "sold_on:YYYYMMDD",
            "--joinkeys",
            "parcel_id,block:pkey",
        ])
        .assert()
        .success()
        .stdout(contains("to_date(sold_on::TEXT,'YYYYMMDD')"))
        .stdout(contains("ALTER TABLE parcels ADD PRIMARY KEY (pkey);"));
}

#[test]
fn sniff_prints_a_schema_table() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("parcels.csv", PARCELS_CSV);

    csv2psql()
        .args(["sniff", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("sql type"))
        .stdout(contains("DOUBLE PRECISION"))
        .stdout(contains("Owner Name"));
}

#[test]
fn sniff_emits_json() -> anyhow::Result<()> {
    let workspace = TestWorkspace::new();
    let input = workspace.write("parcels.csv", PARCELS_CSV);

    let assert = csv2psql()
        .args([
            "sniff",
            input.to_str().unwrap(),
            "--json",
            "--datatype",
            "sold_on:text",
        ])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    let value: serde_json::Value = serde_json::from_str(&stdout)?;
    let columns = value["columns"].as_array().expect("columns array");
    assert_eq!(columns.len(), 5);
    assert_eq!(columns[0]["name"], "parcel_id");
    assert_eq!(columns[0]["sql_type"]["type"], "integer");
    assert_eq!(columns[4]["sql_type"]["type"], "text");
    assert!(columns[4]["sql_type"]["width"].is_null());
    Ok(())
}
