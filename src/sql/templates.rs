//! Literal SQL text. Placeholders are `{name}` and are filled by
//! [`render`](super::render).

pub const SET_ROLE: &str = "SET ROLE {role};";
pub const SET_SEARCH_PATH: &str = "SET search_path TO {schema};";
pub const FORCE_UTF8: &str = "\\encoding UTF8";
pub const QUIET_NOTICES: &str = "SET client_min_messages TO ERROR;";

pub const DROP_TABLE: &str = "DROP TABLE IF EXISTS {table}{cascade};";
pub const CREATE_TABLE: &str = "CREATE TABLE {table} (\n\t{columns}\n);";
pub const OWNER_TO: &str = "ALTER TABLE {table} OWNER TO {role};";
pub const ADD_PRIMARY_KEY: &str = "ALTER TABLE {table} ADD PRIMARY KEY ({columns});";
pub const ADD_UNIQUE: &str = "ALTER TABLE {table} ADD UNIQUE ({columns});";
pub const ADD_COLUMN: &str = "ALTER TABLE {table} ADD COLUMN {column} {definition};";
pub const TRUNCATE_TABLE: &str = "TRUNCATE TABLE {table};";
pub const ANALYZE_TABLE: &str = "ANALYZE {table};";

pub const COPY_HEADER: &str = "COPY {table} FROM stdin NULL AS '';";
pub const COPY_TERMINATOR: &str = "\\.";

pub const DATE_REPAIR: &str = "ALTER TABLE {table} ALTER COLUMN {column} TYPE DATE USING CASE WHEN {column} IS NOT NULL AND {column}::INT <> 0 THEN to_date({column}::TEXT,'{format}') ELSE NULL END;";

pub const JOIN_KEY_PRIMARY: &str = "\
ALTER TABLE {table} ADD COLUMN {key} VARCHAR(200);
UPDATE {table} SET {key} = ({joined});
{bad_key_deletion}
ALTER TABLE {table} ALTER COLUMN {key} SET NOT NULL;
ALTER TABLE {table} ADD PRIMARY KEY ({key});";

pub const BAD_KEY_DELETION: &str = "DELETE FROM {table}\nWHERE {missing_keys};";

pub const SELECT_DUPLICATES: &str = "FROM {table} AS t1, {table} AS t2\nWHERE {clause}";
pub const COUNT_DUPLICATES: &str = "SELECT COUNT(*)\n{select};";
pub const DELETE_DUPLICATES: &str = "\
DELETE FROM {table}
WHERE {serial} IN (
SELECT t1.{serial}
{select}
);";

pub const MERGE_BEGIN: &str = "BEGIN TRANSACTION;\nLOCK TABLE {target} IN EXCLUSIVE MODE;";
pub const MERGE_UPDATE: &str = "\
UPDATE {target}
SET {sets}
FROM {staging}
WHERE {target}.{key} = {staging}.{key};";
pub const MERGE_INSERT: &str = "\
INSERT INTO {target} ({columns})
SELECT DISTINCT {selects}
FROM {staging}
LEFT OUTER JOIN {target} ON ({target}.{key} = {staging}.{key})
WHERE {target}.{key} IS NULL;";
pub const MERGE_COMMIT: &str = "COMMIT;";

pub const MODIFIED_TIME_PROCEDURE: &str = "\
CREATE OR REPLACE FUNCTION update_modified_time() RETURNS TRIGGER AS $$
BEGIN
    NEW.modified_time = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;";

pub const MODIFIED_TIME_TRIGGER: &str = "\
DROP TRIGGER IF EXISTS {trigger} ON {table};
CREATE TRIGGER {trigger} BEFORE UPDATE ON {table}
FOR EACH ROW EXECUTE PROCEDURE update_modified_time();";

pub const PG_DUMP: &str = "pg_dump {database} --schema {schema} --table {table} {option}";
