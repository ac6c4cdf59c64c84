use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Helper to write a file in a tempdir
fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let p = dir.path().join(name);
    fs::write(&p, contents).expect("write file ok");
    p
}

fn compile_to_string(src: &str) -> String {
    let dir = tempdir().unwrap();
    let main_c = write_file(&dir, "main.c", src);

    let output = Command::cargo_bin("selene")
        .unwrap()
        .arg(&main_c)
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "compilation failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn return_constant() {
    let asm = compile_to_string("int main(void) { return 2; }");

    assert!(asm.contains("main:"));
    assert!(asm.contains("movl $2, %eax"));
    assert!(asm.contains("\tret\n"));
}

#[test]
fn unary_chain() {
    let asm = compile_to_string("int main(void) { return -(~0); }");

    assert!(asm.contains("\tnotl"));
    assert!(asm.contains("\tnegl"));
}

#[test]
fn bitwise_operations() {
    let asm = compile_to_string(
        "int main(void) { \
             int a = 12; \
             int b = 10; \
             if ((a & b) != 8) return 1; \
             if ((a | b) != 14) return 2; \
             if ((a ^ b) != 6) return 3; \
             if ((a << 1) != 24) return 4; \
             if ((a >> 1) != 6) return 5; \
             return 0; \
         }",
    );

    assert!(asm.contains("\tandl"));
    assert!(asm.contains("\torl"));
    assert!(asm.contains("\txorl"));
    assert!(asm.contains("\tsall"));
    assert!(asm.contains("\tsarl"));
}

#[test]
fn static_local_gets_its_own_storage() {
    let asm = compile_to_string(
        "int foo(void) { static int x = 5; x = x + 1; return x; } \
         int main(void) { \
             if (foo() != 6) return 1; \
             if (foo() != 7) return 2; \
             if (foo() != 8) return 3; \
             return 0; \
         }",
    );

    assert!(asm.contains("x.static.0:"));
    assert!(asm.contains("\t.long 5"));
    assert!(!asm.contains(".globl x.static.0"));
    assert!(asm.contains("x.static.0(%rip)"));
}

#[test]
fn long_arithmetic_keeps_64_bits() {
    let asm = compile_to_string(
        "long foo(void) { long x = 4294967296 + 10; return x; } \
         int main(void) { \
             if (foo() == 10) return 1; \
             if (foo() > 100) return 0; \
             return 2; \
         }",
    );

    assert!(asm.contains("foo:"));
    // the wide literal survives into a quadword move
    assert!(asm.contains("$4294967296"));
    assert!(asm.contains("movq"));
}

#[test]
fn branching_and_conditionals() {
    let asm = compile_to_string(
        "int main(void) { \
             int r = 0; \
             if (1) r = r + 1; \
             if (5 > 4) r = r + 1; else r = 666; \
             r = (1 ? r + 1 : 0); \
             return r; \
         }",
    );

    assert!(asm.contains("\tje L."));
    assert!(asm.contains("\tjmp L."));
    assert!(asm.contains("_end_if:"));
}

#[test]
fn function_calls_use_the_sysv_registers() {
    let asm = compile_to_string(
        "int add(int a, int b) { return a + b; } \
         int main(void) { return add(1, 2); }",
    );

    assert!(asm.contains("%edi"));
    assert!(asm.contains("%esi"));
    assert!(asm.contains("\tcall"));
}

#[test]
fn seventh_argument_goes_on_the_stack() {
    let asm = compile_to_string(
        "int pick(int a, int b, int c, int d, int e, int f, int g) { return g; } \
         int main(void) { return pick(1, 2, 3, 4, 5, 6, 7); }",
    );

    assert!(asm.contains("\tpushq"));
    assert!(asm.contains("16(%rbp)"));
    assert!(asm.contains("\taddq $16, %rsp"));
}

#[test]
fn loops_compile() {
    let asm = compile_to_string(
        "int main(void) { \
             int total = 0; \
             int i; \
             for (i = 0; i < 10; i = i + 1) { \
                 if (i == 5) continue; \
                 total = total + i; \
             } \
             while (total > 40) total = total - 1; \
             do total = total + 1; while (0); \
             return total; \
         }",
    );

    assert!(asm.contains("_cont"));
    assert!(asm.contains("_brk"));
    assert!(asm.contains("_start"));
}

#[test]
fn unsigned_division_avoids_sign_extension() {
    let asm = compile_to_string(
        "int main(void) { unsigned int a = 7; unsigned int b = a / 2; return b; }",
    );

    assert!(asm.contains("\tdivl"));
    assert!(!asm.contains("\tcdq\n"));
}

#[test]
fn emits_nothing_on_stderr_on_success() {
    let dir = tempdir().unwrap();
    let main_c = write_file(&dir, "ok.c", "int main(void) { return 0; }");

    Command::cargo_bin("selene")
        .unwrap()
        .arg(&main_c)
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}
