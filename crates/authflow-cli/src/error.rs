use authflow_core::FlowError;
use colored::Colorize;

pub fn handle_error(err: anyhow::Error) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), err);

    let code = err
        .downcast_ref::<FlowError>()
        .map(FlowError::exit_code)
        .unwrap_or(1);

    let msg = err.to_string().to_lowercase();

    if msg.contains("configuration error") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Check the files under your config directory, or set the");
        eprintln!("  missing keys in the environment:");
        eprintln!("  {} LOGIN_URL=... CPF=... SENHA=... authflow", "$".dimmed());
    }

    if msg.contains("validation failed") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Inspect the screenshots in the run's artifacts directory");
        eprintln!("  to see what the page actually showed.");
    }

    std::process::exit(code);
}
