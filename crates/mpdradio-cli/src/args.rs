//! CLI argument parsing with clap derive macros.

use clap::{ArgGroup, Parser, Subcommand};

/// Remote control for MPD internet radio players.
///
/// Keeps a list of players and radio stations, and drives playback on a
/// player over the MPD protocol.
#[derive(Debug, Parser)]
#[command(name = "mpdradio", version)]
pub struct Cli {
    /// Player to control as host:port [default: first saved player]
    #[arg(short, long, global = true, value_name = "ADDR")]
    pub player: Option<String>,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log protocol traffic
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Omit timestamps from log output
    #[arg(short = 't', long, global = true)]
    pub no_timestamps: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show what the player is doing
    Status,

    /// Play a saved radio or a stream URL
    #[command(after_help = "\
Examples:
  mpdradio play Jazz                              # Saved radio by name
  mpdradio play --url http://jazz.example/stream  # Any stream URL
  mpdradio -p kitchen:6600 play Jazz              # On a specific player")]
    Play(PlayArgs),

    /// Stop playback
    Stop,

    /// Toggle pause
    Pause,

    /// Change the volume by a relative amount
    #[command(after_help = "\
Examples:
  mpdradio volume 5                     # Louder
  mpdradio volume -10                   # Quieter")]
    Volume(VolumeArgs),

    /// Send a raw protocol command and print the response
    #[command(after_help = "\
Examples:
  mpdradio send status
  mpdradio send --json currentsong
  mpdradio send albumart '\"radio/cover.png\"' 0")]
    Send(SendArgs),

    /// Manage saved players
    #[command(subcommand)]
    Player(PlayerCommand),

    /// Manage saved radios
    #[command(subcommand)]
    Radio(RadioCommand),
}

#[derive(Debug, clap::Args)]
#[command(group(ArgGroup::new("source").required(true).args(["radio", "url"])))]
pub struct PlayArgs {
    /// Name of a saved radio
    pub radio: Option<String>,

    /// Stream URL to play directly
    #[arg(long)]
    pub url: Option<String>,
}

#[derive(Debug, clap::Args)]
pub struct VolumeArgs {
    /// Percentage points to add (negative to lower)
    #[arg(allow_hyphen_values = true)]
    pub delta: i32,
}

#[derive(Debug, clap::Args)]
pub struct SendArgs {
    /// Command word and arguments, joined with spaces
    #[arg(
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,

    /// Print the whole response as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum PlayerCommand {
    /// Connect to a player and save it
    Add {
        /// Host name or IP address
        host: String,

        /// TCP port
        #[arg(long, default_value_t = mpdradio_core::protocol::DEFAULT_PORT)]
        port: u16,
    },

    /// Forget a saved player
    Remove {
        /// Address as shown by `player list`
        address: String,
    },

    /// List saved players
    List,
}

#[derive(Debug, Subcommand)]
pub enum RadioCommand {
    /// Save a radio station
    Add {
        /// Display name
        name: String,

        /// Stream URL
        url: String,
    },

    /// Forget a saved radio
    Remove {
        /// Display name
        name: String,
    },

    /// List saved radios
    List,
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands, PlayerCommand};
    use clap::Parser;

    #[test]
    fn test_send_parses_hyphenated_args() {
        let cli = Cli::parse_from(["mpdradio", "send", "--json", "find", "-x", "any"]);

        match cli.command {
            Commands::Send(args) => {
                assert_eq!(args.command, vec!["find", "-x", "any"]);
                assert!(args.json);
            }
            _ => panic!("Expected send command"),
        }
    }

    #[test]
    fn test_volume_accepts_negative_delta() {
        let cli = Cli::parse_from(["mpdradio", "volume", "-10"]);

        match cli.command {
            Commands::Volume(args) => assert_eq!(args.delta, -10),
            _ => panic!("Expected volume command"),
        }
    }

    #[test]
    fn test_play_needs_radio_or_url() {
        assert!(Cli::try_parse_from(["mpdradio", "play"]).is_err());
        assert!(Cli::try_parse_from(["mpdradio", "play", "Jazz", "--url", "http://x"]).is_err());

        let cli = Cli::parse_from(["mpdradio", "play", "--url", "http://jazz.example/stream"]);
        match cli.command {
            Commands::Play(args) => {
                assert_eq!(args.url.as_deref(), Some("http://jazz.example/stream"));
                assert!(args.radio.is_none());
            }
            _ => panic!("Expected play command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["mpdradio", "status", "-p", "kitchen:6600", "-q"]);

        assert_eq!(cli.player.as_deref(), Some("kitchen:6600"));
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Status));
    }

    #[test]
    fn test_player_add_default_port() {
        let cli = Cli::parse_from(["mpdradio", "player", "add", "livingroom"]);

        match cli.command {
            Commands::Player(PlayerCommand::Add { host, port }) => {
                assert_eq!(host, "livingroom");
                assert_eq!(port, 6600);
            }
            _ => panic!("Expected player add command"),
        }
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["mpdradio", "-q", "-v", "status"]).is_err());
    }
}
