use std::process::ExitCode;

fn main() -> ExitCode {
    selene_driver::main()
}
