use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let p = dir.path().join(name);
    fs::write(&p, contents).expect("write file ok");
    p
}

fn assert_fails_with(src: &str, stage_prefix: &str) {
    let dir = tempdir().unwrap();
    let main_c = write_file(&dir, "bad.c", src);

    Command::cargo_bin("selene")
        .unwrap()
        .arg(&main_c)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with(stage_prefix));
}

#[test]
fn lexer_error_on_stray_character() {
    assert_fails_with("int main(void) { return 1 @ 2; }", "Lexer Error");
}

#[test]
fn lexer_error_quotes_the_offending_text() {
    let dir = tempdir().unwrap();
    let main_c = write_file(&dir, "bad.c", "int main(void) { int 1foo = 2; }");

    Command::cargo_bin("selene")
        .unwrap()
        .arg(&main_c)
        .assert()
        .failure()
        .stderr(predicate::str::contains("'1foo'"));
}

#[test]
fn parser_error_on_missing_semicolon() {
    assert_fails_with("int main(void) { return 2 }", "Parser Error");
}

#[test]
fn parser_error_on_missing_expression() {
    assert_fails_with("int main(void) { return ; }", "Parser Error");
}

#[test]
fn parser_error_on_bad_lvalue() {
    assert_fails_with("int main(void) { 1 = 2; return 0; }", "Parser Error");
}

#[test]
fn semantic_error_on_undeclared_variable() {
    assert_fails_with("int main(void) { return x; }", "Semantic Error");
}

#[test]
fn semantic_error_on_break_outside_loop() {
    assert_fails_with("int main(void) { break; return 0; }", "Semantic Error");
}

#[test]
fn semantic_error_on_undeclared_function() {
    assert_fails_with("int main(void) { return missing(); }", "Semantic Error");
}

#[test]
fn semantic_error_on_bad_arity() {
    assert_fails_with(
        "int f(int a) { return a; } int main(void) { return f(1, 2); }",
        "Semantic Error",
    );
}

#[test]
fn semantic_error_on_non_constant_global_initializer() {
    assert_fails_with(
        "int f(void) { return 3; } int x = f(); int main(void) { return x; }",
        "Semantic Error",
    );
}

#[test]
fn diagnostics_are_a_single_line() {
    let dir = tempdir().unwrap();
    let main_c = write_file(&dir, "bad.c", "int main(void) { return x; }");

    let output = Command::cargo_bin("selene")
        .unwrap()
        .arg(&main_c)
        .output()
        .unwrap();

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert_eq!(stderr.trim_end().lines().count(), 1);
}

#[test]
fn missing_file_fails() {
    Command::cargo_bin("selene")
        .unwrap()
        .arg("does-not-exist.c")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Unable to read source file"));
}
