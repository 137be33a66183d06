use csv2psql::{
    sniff::{ColumnDescriptor, SchemaMap, SqlType},
    sql::{
        AugmentColumns, CompositeKey, DateRepair, DuplicateQuery, DumpCommand, MergeTransaction,
        SessionPreamble, TableDdl, ddl::modified_time_trigger,
    },
};

fn column(name: &str, sql_type: SqlType) -> ColumnDescriptor {
    ColumnDescriptor {
        name: name.to_string(),
        source_name: name.to_string(),
        sql_type,
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn create_table_maps_widths_to_types() {
    let schema = SchemaMap {
        columns: vec![
            column("small", SqlType::Integer { bytes: 2 }),
            column("regular", SqlType::Integer { bytes: 4 }),
            column("big", SqlType::Integer { bytes: 8 }),
            column("ratio", SqlType::Float { bytes: 8 }),
            column("notes", SqlType::Text { width: None }),
            column("name", SqlType::Text { width: Some(255) }),
        ],
    };
    let sql = TableDdl::new("parcels", &schema).render().unwrap();
    assert_eq!(
        sql,
        "DROP TABLE IF EXISTS parcels;\n\
         CREATE TABLE parcels (\n\
         \tsmall SMALLINT,\n\
         \tregular INTEGER,\n\
         \tbig BIGINT,\n\
         \tratio DOUBLE PRECISION,\n\
         \tnotes TEXT,\n\
         \tname VARCHAR(255)\n\
         );"
    );
}

#[test]
fn create_table_adds_owner_keys_and_cascade() {
    let schema = SchemaMap {
        columns: vec![
            column("id", SqlType::Integer { bytes: 4 }),
            column("user", SqlType::default_text()),
        ],
    };
    let key = strings(&["id"]);
    let unique = strings(&["User"]);
    let sql = TableDdl::new("accounts", &schema)
        .cascade(true)
        .not_null(true)
        .owner(Some("loader"))
        .primary_key(&key)
        .unique(&unique)
        .render()
        .unwrap();
    assert!(sql.starts_with("DROP TABLE IF EXISTS accounts CASCADE;"));
    assert!(sql.contains("\tid INTEGER NOT NULL,\n\t\"user\" VARCHAR(150) NOT NULL\n"));
    assert!(sql.contains("ALTER TABLE accounts OWNER TO loader;"));
    assert!(sql.contains("ALTER TABLE accounts ADD PRIMARY KEY (id);"));
    assert!(sql.ends_with("ALTER TABLE accounts ADD UNIQUE (\"user\");"));
}

#[test]
fn preamble_lists_enabled_settings_in_order() {
    let preamble = SessionPreamble {
        role: Some("loader"),
        search_path: Some("gis"),
        force_utf8: true,
        quiet: true,
    };
    assert_eq!(
        preamble.render().unwrap(),
        "SET ROLE loader;\nSET search_path TO gis;\n\\encoding UTF8\nSET client_min_messages TO ERROR;"
    );
}

#[test]
fn reserved_role_and_schema_names_are_quoted() {
    let preamble = SessionPreamble {
        role: Some("user"),
        search_path: Some("order"),
        force_utf8: false,
        quiet: false,
    };
    assert_eq!(
        preamble.render().unwrap(),
        "SET ROLE \"user\";\nSET search_path TO \"order\";"
    );

    let schema = SchemaMap {
        columns: vec![column("id", SqlType::Integer { bytes: 4 })],
    };
    let sql = TableDdl::new("accounts", &schema)
        .owner(Some("user"))
        .render()
        .unwrap();
    assert!(sql.ends_with("ALTER TABLE accounts OWNER TO \"user\";"));
}

#[test]
fn composite_key_joins_parts_with_dashes() {
    let columns = strings(&["Parcel ID", "Block"]);
    let key = CompositeKey {
        columns: &columns,
        key_name: "pkey",
    };
    assert_eq!(key.joined().unwrap(), "parcel_id || '-' || block");
    let sql = key.render("parcels").unwrap();
    assert_eq!(
        sql,
        "ALTER TABLE parcels ADD COLUMN pkey VARCHAR(200);\n\
         UPDATE parcels SET pkey = (parcel_id || '-' || block);\n\
         DELETE FROM parcels\n\
         WHERE parcel_id IS NULL OR block IS NULL;\n\
         ALTER TABLE parcels ALTER COLUMN pkey SET NOT NULL;\n\
         ALTER TABLE parcels ADD PRIMARY KEY (pkey);"
    );
}

#[test]
fn duplicate_query_compares_natural_key_by_serial() {
    let natural_key = strings(&["one", "two"]);
    let query = DuplicateQuery {
        table: "temp_t",
        natural_key: &natural_key,
        serial: "id",
    };
    assert_eq!(
        query.clause().unwrap(),
        "t1.id > t2.id AND t1.one = t2.one AND t1.two = t2.two"
    );
    assert_eq!(
        query.count().unwrap(),
        "SELECT COUNT(*)\nFROM temp_t AS t1, temp_t AS t2\nWHERE t1.id > t2.id AND t1.one = t2.one AND t1.two = t2.two;"
    );
    let delete = query.delete().unwrap();
    assert!(delete.starts_with("DELETE FROM temp_t\nWHERE id IN (\nSELECT t1.id\nFROM temp_t AS t1"));
    assert!(delete.ends_with("\n);"));
}

#[test]
fn date_repair_emits_one_statement_per_column() {
    let columns = strings(&["Sold On", "listed"]);
    let repair = DateRepair {
        format: "YYYYMMDD",
        columns: &columns,
    };
    let sql = repair.render("parcels").unwrap();
    let lines: Vec<_> = sql.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines[0],
        "ALTER TABLE parcels ALTER COLUMN sold_on TYPE DATE USING CASE WHEN sold_on IS NOT NULL \
         AND sold_on::INT <> 0 THEN to_date(sold_on::TEXT,'YYYYMMDD') ELSE NULL END;"
    );
}

#[test]
fn merge_without_fields_is_just_the_transaction() {
    let merge = MergeTransaction::new("parcels", "temp_parcels", "id", Vec::<String>::new());
    assert_eq!(
        merge.render().unwrap(),
        "BEGIN TRANSACTION;\nLOCK TABLE parcels IN EXCLUSIVE MODE;\n\nCOMMIT;"
    );
}

#[test]
fn merge_updates_then_inserts_missing_rows() {
    let merge = MergeTransaction::new("parcels", "temp_parcels", "id", ["id", "owner", "value"]);
    let sql = merge.render().unwrap();
    assert!(sql.starts_with("BEGIN TRANSACTION;\nLOCK TABLE parcels IN EXCLUSIVE MODE;"));
    assert!(sql.contains(
        "UPDATE parcels\nSET owner = temp_parcels.owner, value = temp_parcels.value\n\
         FROM temp_parcels\nWHERE parcels.id = temp_parcels.id;"
    ));
    assert!(sql.contains(
        "INSERT INTO parcels (id, owner, value)\n\
         SELECT DISTINCT temp_parcels.id, temp_parcels.owner, temp_parcels.value\n\
         FROM temp_parcels\n\
         LEFT OUTER JOIN parcels ON (parcels.id = temp_parcels.id)\n\
         WHERE parcels.id IS NULL;"
    ));
    assert!(sql.ends_with("COMMIT;"));
    let update_at = sql.find("UPDATE").unwrap();
    let insert_at = sql.find("INSERT").unwrap();
    assert!(update_at < insert_at);
}

#[test]
fn merge_with_only_the_key_skips_the_update() {
    let merge = MergeTransaction::new("t", "temp_t", "id", ["id"]);
    let sql = merge.render().unwrap();
    assert!(!sql.contains("UPDATE"));
    assert!(sql.contains("INSERT INTO t (id)"));
}

#[test]
fn augment_columns_follow_fixed_order() {
    let augment = AugmentColumns {
        modified_time: true,
        serial: Some("Row ID"),
        timestamp: Some("loaded_at"),
    };
    assert_eq!(
        augment.render("temp_t").unwrap().unwrap(),
        "ALTER TABLE temp_t ADD COLUMN modified_time TIMESTAMP DEFAULT current_timestamp;\n\
         ALTER TABLE temp_t ADD COLUMN row_id SERIAL;\n\
         ALTER TABLE temp_t ADD COLUMN loaded_at TIMESTAMP DEFAULT current_timestamp;"
    );
    assert_eq!(AugmentColumns::default().render("t").unwrap(), None);
}

#[test]
fn modified_time_trigger_is_named_after_the_table() {
    let sql = modified_time_trigger("parcels");
    assert!(sql.starts_with("DROP TRIGGER IF EXISTS update_modified_time_parcels ON parcels;"));
    assert!(sql.ends_with("EXECUTE PROCEDURE update_modified_time();"));
}

#[test]
fn dump_command_defaults_schema_and_option() {
    let command = DumpCommand {
        database: "gis",
        schema: None,
        table: "temp_parcels",
        option: None,
    };
    assert_eq!(
        command.render(),
        "pg_dump gis --schema public --table temp_parcels -s"
    );
}
