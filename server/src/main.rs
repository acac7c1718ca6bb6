use clap::Parser;
use log::{error, info};
use server::{Server, ServerConfig};
use shared::{Strategy, MAX_HEAP_SIZE, SERVER_DEFAULT_PORT};

fn heap_size(value: &str) -> Result<i16, String> {
    match value.parse::<i16>() {
        Ok(size) if (1..=MAX_HEAP_SIZE).contains(&size) => Ok(size),
        _ => Err(format!(
            "heap sizes should be numbers between 1 and {}",
            MAX_HEAP_SIZE
        )),
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Multiplexed Nim game server", long_about = None)]
struct Args {
    /// Size of heap A
    #[arg(value_parser = heap_size)]
    heap_a: i16,

    /// Size of heap B
    #[arg(value_parser = heap_size)]
    heap_b: i16,

    /// Size of heap C
    #[arg(value_parser = heap_size)]
    heap_c: i16,

    /// Number of simultaneous players
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    num_players: u32,

    /// Size of the waiting list
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    wait_list_size: u32,

    /// Port to listen on
    #[arg(default_value_t = SERVER_DEFAULT_PORT)]
    port: u16,

    /// Interface to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Play the nim-sum strategy instead of taking one from the largest heap
    #[arg(long)]
    optimal_strategy: bool,

    /// Serve clients from a thread pool (not supported)
    #[arg(long)]
    multithreading: bool,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        let mut config = ServerConfig::new(
            [self.heap_a, self.heap_b, self.heap_c],
            self.num_players as usize,
            self.wait_list_size as usize,
        );
        config.host = self.host;
        config.port = self.port;
        config.strategy = if self.optimal_strategy {
            Strategy::Optimal
        } else {
            Strategy::Greedy
        };
        config
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    if args.multithreading {
        error!("Multithreading is not implemented");
        return Err("the --multithreading server is not supported".into());
    }

    let mut server = Server::new(args.into_config()).await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
    }

    Ok(())
}
