use std::process::ExitCode;

fn main() -> ExitCode {
    match prebid_line_items::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
