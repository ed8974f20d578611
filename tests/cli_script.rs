use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn script_command(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("debtor_core_cli").expect("binary built");
    cmd.env("DEBTOR_CORE_CLI_SCRIPT", "1")
        .env("DEBTOR_CORE_HOME", home.path())
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn script_mode_runs_collection_workflow() {
    let home = TempDir::new().unwrap();
    let input = "\
# register and settle one debtor
add \"Ana Silva\" 150 5 --person P-7
collect 1
pay 1
show 1
exit
";

    script_command(&home)
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("Debtor Ana Silva registered."))
        .stdout(contains("recorded and rescheduled"))
        .stdout(contains("marked as PAID"));

    assert!(home.path().join("data").join("debtors.db").exists());
}

#[test]
fn records_survive_between_runs() {
    let home = TempDir::new().unwrap();
    script_command(&home)
        .write_stdin("add Bruno 80 12\nexit\n")
        .assert()
        .success();

    script_command(&home)
        .write_stdin("list\nexit\n")
        .assert()
        .success()
        .stdout(contains("Bruno"));
}

#[test]
fn unknown_command_suggests_the_closest_match() {
    let home = TempDir::new().unwrap();
    script_command(&home)
        .write_stdin("collectt 1\nexit\n")
        .assert()
        .success()
        .stderr(contains("Unknown command `collectt`"))
        .stdout(contains("Did you mean `collect`?"));
}

#[test]
fn invalid_input_is_reported_without_aborting() {
    let home = TempDir::new().unwrap();
    script_command(&home)
        .write_stdin("add Bruno zero 1\nshow 99\nadd Carla 10 1\nexit\n")
        .assert()
        .success()
        .stderr(contains("Debtor 99 not found."))
        .stdout(contains("Debtor Carla registered."));
}

#[test]
fn import_then_export_through_the_shell() {
    let home = TempDir::new().unwrap();
    let sheet = home.path().join("devedores.csv");
    std::fs::write(
        &sheet,
        "pessoa,nome,valortotal,atraso,telefone\nP-1,Ana,10.5,3,1199990000\n,Sem Id,1,1,\n",
    )
    .unwrap();
    let target = home.path().join("saida.csv");
    let input = format!(
        "import \"{}\"\nexport \"{}\"\nexit\n",
        sheet.display(),
        target.display()
    );

    script_command(&home)
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("1 debtor(s) imported, 1 row(s) skipped."))
        .stderr(contains("line 3: missing identifier"))
        .stdout(contains("1 debtor(s) exported"));

    let exported = std::fs::read_to_string(&target).unwrap();
    assert!(exported.starts_with("pessoa,nome,valortotal"));
    assert!(exported.contains("P-1,Ana,10.5,3,1199990000"));
}

#[test]
fn config_changes_are_persisted() {
    let home = TempDir::new().unwrap();
    script_command(&home)
        .write_stdin("config page_size 50\nexit\n")
        .assert()
        .success()
        .stdout(contains("page_size set to `50`."));

    script_command(&home)
        .write_stdin("config page_size\nexit\n")
        .assert()
        .success()
        .stdout(contains("page_size = 50"))
        .stdout(contains("set to").not());
}
