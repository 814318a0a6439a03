use std::process::ExitCode;

fn main() -> ExitCode {
    fretado_cli::run()
}
