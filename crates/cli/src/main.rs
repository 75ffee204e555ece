use std::process::ExitCode;

fn main() -> ExitCode {
    eshop_cli::run()
}
