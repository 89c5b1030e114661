use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    pispy_cli::main()
}
