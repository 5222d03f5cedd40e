//! mpdradio command-line entry point.

mod args;
mod config;
mod mpd;
mod player;
mod registry;

use anyhow::{bail, Context, Result};
use clap::Parser;
use mpdradio_core::library::Library;
use mpdradio_core::protocol::Response;
use tracing::{debug, error, info, Level};
use tracing_subscriber::EnvFilter;

use crate::args::{Cli, Commands, PlayerCommand, RadioCommand};
use crate::config::ConfigFile;
use crate::mpd::{ClientSettings, MpdClient};
use crate::registry::{player_address, PlayerRegistry};

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing on stderr so stdout carries only command output.
fn init_tracing(cli: &Cli) {
    let level = if cli.quiet {
        Level::WARN
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr);

    if cli.no_timestamps {
        builder.without_time().init();
    } else {
        builder.init();
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = ConfigFile::default_location();
    let mut library = config.load()?;
    debug!("Loaded config from {:?}", config.path());

    let runtime = tokio::runtime::Runtime::new()?;

    runtime.block_on(async {
        let mut registry = PlayerRegistry::new(ClientSettings::default());

        let result = tokio::select! {
            result = dispatch(&cli, &config, &mut library, &mut registry) => result,
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT, shutting down");
                Ok(())
            }
        };

        // Stops keepalive tasks and closes sockets before the runtime goes away
        registry.shutdown_all().await;
        result
    })
}

async fn dispatch(
    cli: &Cli,
    config: &ConfigFile,
    library: &mut Library,
    registry: &mut PlayerRegistry,
) -> Result<()> {
    match &cli.command {
        Commands::Player(command) => player_command(command, config, library, registry).await,
        Commands::Radio(command) => radio_command(command, config, library),
        command => {
            let client = select_player(cli.player.as_deref(), library, registry).await?;
            playback_command(command, &client, library).await
        }
    }
}

/// The player named on the command line, or the first saved one.
async fn select_player(
    requested: Option<&str>,
    library: &Library,
    registry: &mut PlayerRegistry,
) -> Result<MpdClient> {
    if let Some(input) = requested {
        return Ok(registry.add_address(player_address(input)).await?);
    }

    let Some(first) = library.players.first() else {
        bail!("No saved players, add one with `mpdradio player add <host>`");
    };

    // Unreachable players stay registered; the first command reconnects.
    registry.connect_saved(std::slice::from_ref(first)).await;
    registry.first().cloned().context("No player available")
}

async fn playback_command(command: &Commands, client: &MpdClient, library: &Library) -> Result<()> {
    match command {
        Commands::Status => {
            println!("{}", player::status(client).await?);
        }
        Commands::Play(args) => {
            let url = match (&args.url, &args.radio) {
                (Some(url), _) => url.clone(),
                (None, Some(name)) => library
                    .radio(name)
                    .map(|radio| radio.url.clone())
                    .with_context(|| format!("Radio '{}' not found", name))?,
                (None, None) => bail!("Nothing to play"),
            };
            let id = player::play(client, &url).await?;
            info!("Playing {} as song {} on {}", url, id, client.address());
        }
        Commands::Stop => player::stop(client).await?,
        Commands::Pause => player::pause(client).await?,
        Commands::Volume(args) => {
            let volume = player::change_volume(client, args.delta).await?;
            println!("Volume: {}%", volume);
        }
        Commands::Send(args) => {
            let response = client.execute_or_reconnect(&args.command.join(" ")).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print_response(&response);
            }
        }
        Commands::Player(_) | Commands::Radio(_) => {
            unreachable!("Library commands handled separately")
        }
    }
    Ok(())
}

async fn player_command(
    command: &PlayerCommand,
    config: &ConfigFile,
    library: &mut Library,
    registry: &mut PlayerRegistry,
) -> Result<()> {
    match command {
        PlayerCommand::Add { host, port } => {
            // Only save players that answer
            let client = registry.add(host, Some(*port)).await?;
            library.add_player(client.address())?;
            config.save(library)?;
            println!(
                "Added player {} ({})",
                client.address(),
                client.server_version().unwrap_or_default()
            );
        }
        PlayerCommand::Remove { address } => {
            library.remove_player(address)?;
            config.save(library)?;
            println!("Removed player {}", address);
        }
        PlayerCommand::List => {
            if library.players.is_empty() {
                println!("No saved players");
                return Ok(());
            }

            registry.connect_saved(&library.players).await;
            debug!("{} players registered", registry.len());

            for address in &library.players {
                let client = registry.find(address);
                let online = match client {
                    Some(client) => client.is_connected().await,
                    None => false,
                };
                match client.and_then(MpdClient::server_version) {
                    Some(version) if online => println!("{}\tonline\t{}", address, version),
                    _ => println!("{}\toffline", address),
                }
            }
        }
    }
    Ok(())
}

fn radio_command(command: &RadioCommand, config: &ConfigFile, library: &mut Library) -> Result<()> {
    match command {
        RadioCommand::Add { name, url } => {
            library.add_radio(name.as_str(), url.as_str())?;
            config.save(library)?;
            println!("Added radio {}", name);
        }
        RadioCommand::Remove { name } => {
            library.remove_radio(name)?;
            config.save(library)?;
            println!("Removed radio {}", name);
        }
        RadioCommand::List => {
            if library.radios.is_empty() {
                println!("No saved radios");
            }
            for radio in &library.radios {
                println!("{}\t{}", radio.name, radio.url);
            }
        }
    }
    Ok(())
}

/// Print a raw response: sorted fields, then unparsed lines, then a
/// summary of any binary payload.
fn print_response(response: &Response) {
    let mut fields: Vec<_> = response.fields.iter().collect();
    fields.sort();

    for (key, value) in fields {
        println!("{}: {}", key, value);
    }
    for line in &response.unparsed {
        println!("{}", line);
    }
    if !response.binary.is_empty() {
        println!("({} bytes of binary data)", response.binary.len());
    }
    if !response.status.is_empty() {
        println!("OK {}", response.status);
    }
}
