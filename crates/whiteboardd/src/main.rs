use std::process::ExitCode;

fn main() -> ExitCode {
    match whiteboardd::run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            // Telemetry may not be installed yet when the launch fails.
            eprintln!("whiteboardd: {error}");
            ExitCode::FAILURE
        }
    }
}
