use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match carelink::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("carelink: {e}");
            ExitCode::FAILURE
        }
    }
}
