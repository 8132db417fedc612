pub mod handlers;

use crate::presentation::cli::{Cli, Commands};
use qrx_core::error::Result;

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Encode {
            source,
            output,
            exclude,
            chunk_size,
            error_correction,
            deterministic,
        } => handlers::handle_encode(
            source,
            output,
            exclude,
            chunk_size,
            error_correction,
            deterministic,
        ),
        Commands::Decode {
            input,
            output,
            duplicates,
            totals,
            strict,
            report,
        } => handlers::handle_decode(input, output, duplicates, totals, strict, report),
        Commands::Inspect { input, json } => handlers::handle_inspect(input, json),
    }
}
