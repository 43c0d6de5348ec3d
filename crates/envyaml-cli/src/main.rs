use std::process::ExitCode;

fn main() -> ExitCode {
    envyaml_cli::run()
}
