mod common;

use assert_fs::prelude::*;
use common::{monday_clock, temp_store};
use debtor_core::core::services::{LifecycleService, SummaryService};
use debtor_core::domain::{CollectionStatus, NewDebtor};
use debtor_core::spreadsheet::{
    export_to_path, import_file, ExportFormat, ExportOutcome, SkipReason, SkippedRow,
};
use debtor_core::storage::DebtorStore;
use debtor_core::ErrorKind;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const SEMICOLON_SHEET: &str = "\
Pessoa;Nome;ValorTotal;Atraso;Celular1;Telefone
P-1;Ana Silva;1.234,56;30;(11) 99999-0000;(11) 3333-0000
P-2;Bruno;R$ 1.500;5;-;(11) 3333-1111
;Sem Identificador;10;1;;
p-1 ;Ana Repetida;10;1;;
P-3;;10;1;;
P-4;Carla;;2,7;( );n/a
P-5;Davi;abc;3;;
";

#[test]
fn csv_import_skips_invalid_rows_and_keeps_valid_ones() {
    let temp = assert_fs::TempDir::new().expect("temp dir");
    let sheet = temp.child("devedores.csv");
    sheet.write_str(SEMICOLON_SHEET).expect("write sheet");
    let store = temp_store();

    let summary = import_file(&store, sheet.path()).expect("import");
    assert_eq!(summary.imported, 3);
    assert_eq!(summary.skipped, 4);
    assert_eq!(
        summary.samples,
        vec![
            SkippedRow {
                line: 4,
                reason: SkipReason::MissingIdentifier
            },
            SkippedRow {
                line: 5,
                reason: SkipReason::Duplicate
            },
            SkippedRow {
                line: 6,
                reason: SkipReason::MissingName
            },
            SkippedRow {
                line: 8,
                reason: SkipReason::InvalidAmount
            },
        ]
    );

    let mut debtors = store.get_all().expect("list");
    debtors.sort_by_key(|debtor| debtor.id);
    let ana = &debtors[0];
    assert_eq!(ana.name, "Ana Silva");
    assert_eq!(ana.total_owed, dec!(1234.56));
    assert_eq!(ana.overdue_days, 30);
    assert_eq!(ana.phone.as_deref(), Some("(11) 99999-0000"));
    assert_eq!(ana.status(), CollectionStatus::Pending);
    assert_eq!(ana.collection_phase().get(), 1);

    let bruno = &debtors[1];
    assert_eq!(bruno.total_owed, dec!(1500));
    assert_eq!(bruno.phone.as_deref(), Some("(11) 3333-1111"));

    let carla = &debtors[2];
    assert_eq!(carla.total_owed, dec!(0));
    assert_eq!(carla.overdue_days, 2);
    assert_eq!(carla.phone, None);

    let again = import_file(&store, sheet.path()).expect("second import");
    assert_eq!(again.imported, 0);
    assert_eq!(again.skipped, 7);
    assert_eq!(store.get_all().expect("list").len(), 3);

    temp.close().expect("cleanup");
}

#[test]
fn missing_required_column_aborts_the_import() {
    let temp = assert_fs::TempDir::new().expect("temp dir");
    let sheet = temp.child("incompleto.csv");
    sheet
        .write_str("pessoa,nome,valortotal\nP-1,Ana,10\n")
        .expect("write sheet");
    let store = temp_store();

    let err = import_file(&store, sheet.path()).expect_err("missing atraso");
    assert_eq!(err.kind(), ErrorKind::Spreadsheet);
    assert!(err.to_string().contains("atraso"));
    assert!(store.get_all().expect("list").is_empty());
}

#[test]
fn unsupported_extension_is_rejected() {
    let temp = assert_fs::TempDir::new().expect("temp dir");
    let sheet = temp.child("devedores.pdf");
    sheet.write_str("not a sheet").expect("write file");
    let store = temp_store();

    let err = import_file(&store, sheet.path()).expect_err("pdf");
    assert_eq!(err.kind(), ErrorKind::Spreadsheet);
}

#[test]
fn csv_export_writes_iso_dates() {
    let store = temp_store();
    let clock = monday_clock();
    let service = LifecycleService::new(&store, &clock);
    let ana = service
        .create(NewDebtor::new("Ana Silva", dec!(150.00), 5).with_external_id("P-7"))
        .expect("create")
        .debtor
        .id;
    service
        .record_collection_and_reschedule(ana, None)
        .expect("collect");

    let temp = assert_fs::TempDir::new().expect("temp dir");
    let target = temp.child("relatorio.csv");
    let debtors = store.get_all().expect("list");
    let outcome = export_to_path(&debtors, target.path(), ExportFormat::Csv).expect("export");
    assert_eq!(
        outcome,
        ExportOutcome::Written {
            rows: 1,
            path: target.path().to_path_buf()
        }
    );

    let content = std::fs::read_to_string(target.path()).expect("read export");
    let mut lines = content.lines();
    assert_eq!(
        lines.next(),
        Some("pessoa,nome,valortotal,atraso,telefone,id,status,fase_cobranca,data_cobranca,ultima_cobranca,data_pagamento")
    );
    let row: Vec<&str> = lines.next().expect("data row").split(',').collect();
    let iso = Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("regex");
    assert!(iso.is_match(row[8]), "next collection `{}`", row[8]);
    assert!(iso.is_match(row[9]), "last collection `{}`", row[9]);
    assert_eq!(row[8], "2024-03-18");
    assert_eq!(row[10], "");
}

#[test]
fn empty_export_writes_nothing() {
    let temp = assert_fs::TempDir::new().expect("temp dir");
    let target = temp.child("vazio.xlsx");

    let outcome = export_to_path(&[], target.path(), ExportFormat::Xlsx).expect("export");
    assert_eq!(outcome, ExportOutcome::Empty);
    target.assert(predicates::path::missing());
}

#[test]
fn xlsx_export_can_be_imported_into_a_fresh_store() {
    let source = temp_store();
    let clock = monday_clock();
    let service = LifecycleService::new(&source, &clock);
    service
        .create(
            NewDebtor::new("Ana Silva", dec!(1234.56), 30)
                .with_external_id("P-1")
                .with_phone("(11) 99999-0000"),
        )
        .expect("ana");
    service
        .create(NewDebtor::new("Bruno", dec!(100), 5).with_external_id("1042"))
        .expect("bruno");

    let temp = assert_fs::TempDir::new().expect("temp dir");
    let target = temp.child("devedores.xlsx");
    let debtors = source.get_all().expect("list");
    export_to_path(&debtors, target.path(), ExportFormat::Xlsx).expect("export");
    target.assert(predicates::path::exists());

    let destination = temp_store();
    let summary = import_file(&destination, target.path()).expect("import");
    assert_eq!(summary.imported, 2);
    assert_eq!(summary.skipped, 0);

    let mut imported = destination.get_all().expect("list");
    imported.sort_by_key(|debtor| debtor.id);
    assert_eq!(imported[0].name, "Ana Silva");
    assert_eq!(imported[0].total_owed, dec!(1234.56));
    assert_eq!(imported[0].overdue_days, 30);
    assert_eq!(imported[0].phone.as_deref(), Some("(11) 99999-0000"));
    assert_eq!(imported[1].external_person_id.as_deref(), Some("1042"));
    assert_eq!(imported[1].total_owed, dec!(100));
}

#[test]
fn summary_of_imported_extreme_amounts_does_not_overflow() {
    let temp = assert_fs::TempDir::new().expect("temp dir");
    let sheet = temp.child("grandes.csv");
    sheet
        .write_str(
            "pessoa,nome,valortotal,atraso\n\
             P-1,Ana,79228162514264337593543950335,10\n\
             P-2,Bruno,79228162514264337593543950335,20\n",
        )
        .expect("write sheet");
    let store = temp_store();

    let summary = import_file(&store, sheet.path()).expect("import");
    assert_eq!(summary.imported, 2);

    let debtors = store.get_all().expect("list");
    let totals = SummaryService::summarize(&debtors);
    assert_eq!(totals.total_owed, Decimal::MAX);
    assert_eq!(totals.open_owed, Decimal::MAX);
    assert_eq!(totals.mean_overdue_days, Some(dec!(15)));
}
