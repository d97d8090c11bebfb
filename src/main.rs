use clap::Parser;
use class_composer::{compose, handle_pipe_command, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Handle commands
    match cli.command {
        Commands::Build(args) => {
            // Run the composition
            match compose(args).await {
                Ok(result) => {
                    println!("Composition successful!");
                    println!("  - Processed {} files", result.total_files_processed);
                    println!("  - Evaluated {} expressions", result.total_expressions);
                    println!("  - Emitted {} unique tokens", result.total_tokens);
                    Ok(())
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Pipe(args) => {
            // Handle pipe mode
            handle_pipe_command(args).await?;
            Ok(())
        }
    }
}
