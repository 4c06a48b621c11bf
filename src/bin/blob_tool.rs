use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use marks_blob::core::decoder;
use marks_blob::core::encoder;
use marks_blob::utils::logger;

#[derive(Parser)]
#[command(name = "blob-tool")]
#[command(about = "Encode JSON datasets into tokens and decode them offline")]
struct Args {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode a JSON array of flat objects into a token
    Encode {
        /// Path to the JSON file, or "-" for stdin
        input: String,

        /// Print the CSV that goes into the token instead of the token
        #[arg(long)]
        csv: bool,
    },
    /// Decode a token and print the rows or the requested marks as JSON
    Decode {
        token: String,

        /// Names to project marks for; repeat for several
        #[arg(short, long = "name")]
        names: Vec<String>,
    },
}

fn read_input(input: &str) -> Result<Vec<u8>> {
    if input == "-" {
        let mut buf = Vec::new();
        std::io::Read::read_to_end(&mut std::io::stdin(), &mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read(input).with_context(|| format!("failed to read {}", input))
}

fn main() -> Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    match args.command {
        Command::Encode { input, csv } => {
            let raw = read_input(&input)?;
            if csv {
                let dataset = marks_blob::core::Dataset::from_json_slice(&raw)?;
                print!("{}", encoder::to_csv(&dataset)?);
            } else {
                let token = encoder::encode_json(&raw)?;
                tracing::debug!("Token length: {}", token.len());
                println!("{}", token);
            }
        }
        Command::Decode { token, names } => {
            let result = decoder::decode(&token, &names)?;
            println!("{}", serde_json::to_string_pretty(&result.to_json())?);
        }
    }

    Ok(())
}
