use clap::Parser;
use client::{run, Connection};
use log::{error, info};
use shared::{SERVER_DEFAULT_HOSTNAME, SERVER_DEFAULT_PORT};
use tokio::io::{stdin, stdout, BufReader};

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal client for the Nim server", long_about = None)]
struct Args {
    /// Server host name
    #[arg(default_value = SERVER_DEFAULT_HOSTNAME)]
    hostname: String,

    /// Server port
    #[arg(default_value_t = SERVER_DEFAULT_PORT)]
    port: u16,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    info!("Connecting to {}:{}", args.hostname, args.port);

    let connection = match Connection::connect(&args.hostname, args.port).await {
        Ok(connection) => connection,
        Err(e) => {
            error!("Failed to connect: {}", e);
            eprintln!("Connection Refused");
            return Err(e.into());
        }
    };

    run(connection, BufReader::new(stdin()), stdout()).await?;

    Ok(())
}
