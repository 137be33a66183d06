use csv2psql::{
    error::ConvertError,
    mangle::{MAX_IDENTIFIER_LENGTH, is_reserved, mangle, mangle_table, sql_identifier},
};
use proptest::prelude::*;

#[test]
fn mangle_collapses_punctuation_and_case() {
    assert_eq!(mangle("Owner Name").unwrap(), "owner_name");
    assert_eq!(mangle("  Assessed   Value ($) ").unwrap(), "assessed_value");
    assert_eq!(mangle("ZIP-Code/4").unwrap(), "zip_code_4");
    assert_eq!(mangle("__id__").unwrap(), "id");
}

#[test]
fn mangle_prefixes_leading_digits() {
    assert_eq!(mangle("2019 total").unwrap(), "_2019_total");
}

#[test]
fn mangle_keeps_a_placeholder_for_symbol_only_names() {
    assert_eq!(mangle("$$$").unwrap(), "_");
}

#[test]
fn mangle_rejects_blank_names() {
    let err = mangle("   ").unwrap_err();
    assert!(matches!(err, ConvertError::Identifier { .. }));
}

#[test]
fn reserved_words_are_quoted() {
    assert!(is_reserved("select"));
    assert!(is_reserved("ORDER"));
    assert!(!is_reserved("parcel"));
    assert_eq!(sql_identifier("Order").unwrap(), "\"order\"");
    assert_eq!(sql_identifier("Owner Name").unwrap(), "owner_name");
}

#[test]
fn table_names_lose_directory_and_extension() {
    assert_eq!(mangle_table("data/2020/Parcels.csv").unwrap(), "parcels");
    assert_eq!(mangle_table("sales.TSV").unwrap(), "sales");
    assert_eq!(mangle_table("archive.tar").unwrap(), "archive_tar");
}

proptest! {
    #[test]
    fn mangled_names_are_bare_identifiers(raw in "[ -~]{1,40}") {
        prop_assume!(!raw.trim().is_empty());
        let ident = mangle(&raw).unwrap();
        prop_assert!(!ident.is_empty());
        prop_assert!(ident.len() <= MAX_IDENTIFIER_LENGTH);
        prop_assert!(ident.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
        prop_assert!(!ident.starts_with(|c: char| c.is_ascii_digit()));
        prop_assert_eq!(mangle(&ident).unwrap(), ident.clone());
    }
}
