//! IPTV Player - command-line front end
//! Opens M3U playlists from disk or URL and manages saved playlists

// Use mimalloc for faster memory allocation (Linux, macOS)
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, warn};

use iptv_player::logging::init_logging;
use iptv_player::{
    settings, AppConfig, Channel, ExternalPlayer, M3uParser, Player, PlaylistStore, Result,
    UrlHistory,
};

#[derive(Parser)]
#[command(name = "iptv-player", version, about = "M3U/M3U8 IPTV player")]
struct Cli {
    /// Settings file (defaults to the per-user config directory)
    #[arg(long, global = true, env = "IPTV_PLAYER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the channels of a playlist file or URL
    Open {
        source: String,
        /// Only channels of this group (exact match)
        #[arg(long)]
        group: Option<String>,
        /// Only channels whose name contains this text (case-insensitive)
        #[arg(long)]
        search: Option<String>,
    },
    /// List the groups of a playlist file or URL
    Groups { source: String },
    /// Manage saved playlists
    #[command(subcommand)]
    Playlist(PlaylistCommand),
    /// Recently opened playlist URLs
    #[command(subcommand)]
    History(HistoryCommand),
    /// Play a stream with the configured external player
    Play { url: String },
    /// Export, import or reset all user data
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Subcommand)]
enum PlaylistCommand {
    /// Saved playlists, most recently modified first
    List,
    Create { name: String },
    Delete { name: String },
    Rename { old: String, new: String },
    Show { name: String },
    /// Add one channel by URL
    Add {
        playlist: String,
        url: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        logo: Option<String>,
        #[arg(long)]
        tvg_id: Option<String>,
    },
    /// Add every channel of a playlist file or URL
    Import {
        playlist: String,
        source: String,
        #[arg(long)]
        group: Option<String>,
    },
    Remove { playlist: String, url: String },
    /// Write a saved playlist as an M3U file
    Export { name: String, path: PathBuf },
}

#[derive(Subcommand)]
enum HistoryCommand {
    List,
    Clear,
}

#[derive(Subcommand)]
enum SettingsCommand {
    Export { path: PathBuf },
    Import { path: PathBuf },
    Reset,
}

fn is_url(source: &str) -> bool {
    let lower = source.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Load a playlist from disk or the network. URLs are remembered in the
/// history before fetching, like the desktop dialog does.
fn load_source(config: &AppConfig, source: &str) -> Result<M3uParser> {
    let mut parser = M3uParser::new();
    if is_url(source) {
        let mut history = UrlHistory::load(&config.url_history_file);
        if let Err(e) = history.add(source) {
            warn!(error = %e, "could not update URL history");
        }
        parser.load_from_url(source, &config.fetch_options())?;
    } else {
        parser.load_from_file(source)?;
    }
    Ok(parser)
}

fn print_channel(ch: &Channel) {
    println!("{}\t{}\t{}", ch.name, ch.group, ch.url);
}

fn run_playlist(config: &AppConfig, command: PlaylistCommand) -> Result<()> {
    let mut store = PlaylistStore::open(&config.playlists_dir)?;
    match command {
        PlaylistCommand::List => {
            for summary in store.history() {
                println!(
                    "{}\t{} channels\tupdated {}",
                    summary.name,
                    summary.channel_count,
                    summary.last_updated.format("%Y-%m-%d %H:%M")
                );
            }
        }
        PlaylistCommand::Create { name } => {
            let playlist = store.create(&name)?;
            println!("{} ({} channels)", playlist.name, playlist.len());
        }
        PlaylistCommand::Delete { name } => store.delete(&name)?,
        PlaylistCommand::Rename { old, new } => store.rename(&old, &new)?,
        PlaylistCommand::Show { name } => {
            let playlist = store
                .get(&name)
                .ok_or_else(|| iptv_player::Error::NotFound(name.clone()))?;
            for ch in playlist.channels() {
                print_channel(ch);
            }
        }
        PlaylistCommand::Add {
            playlist,
            url,
            name,
            group,
            logo,
            tvg_id,
        } => {
            let mut channel = Channel::new(name.as_deref().unwrap_or(&url), &url);
            if let Some(group) = group {
                channel.group = group;
            }
            channel.logo = logo.unwrap_or_default();
            channel.tvg_id = tvg_id.unwrap_or_default();
            if !store.add_channel(&playlist, channel)? {
                println!("already in {}", playlist);
            }
        }
        PlaylistCommand::Import {
            playlist,
            source,
            group,
        } => {
            let parser = load_source(config, &source)?;
            let channels: Vec<&Channel> = match &group {
                Some(group) => parser.channels_by_group(group),
                None => parser.channels().iter().collect(),
            };
            let mut added = 0;
            for ch in channels {
                if store.add_channel(&playlist, ch.clone())? {
                    added += 1;
                }
            }
            println!("added {} channels to {}", added, playlist);
        }
        PlaylistCommand::Remove { playlist, url } => {
            if !store.remove_channel(&playlist, &Channel::new("", &url))? {
                println!("not in {}", playlist);
            }
        }
        PlaylistCommand::Export { name, path } => store.export_m3u(&name, path)?,
    }
    Ok(())
}

fn run(config: &AppConfig, command: Command) -> Result<()> {
    match command {
        Command::Open {
            source,
            group,
            search,
        } => {
            let parser = load_source(config, &source)?;
            let mut channels: Vec<&Channel> = match &search {
                Some(query) => parser.search_channels(query),
                None => parser.channels().iter().collect(),
            };
            if let Some(group) = &group {
                channels.retain(|ch| &ch.group == group);
            }
            if let Some(epg) = parser.epg_url() {
                println!("# EPG: {}", epg);
            }
            for ch in channels {
                print_channel(ch);
            }
        }
        Command::Groups { source } => {
            let parser = load_source(config, &source)?;
            for group in parser.groups() {
                println!("{}\t{}", group, parser.channels_by_group(group).len());
            }
        }
        Command::Playlist(command) => run_playlist(config, command)?,
        Command::History(HistoryCommand::List) => {
            for url in UrlHistory::load(&config.url_history_file).urls() {
                println!("{}", url);
            }
        }
        Command::History(HistoryCommand::Clear) => {
            UrlHistory::load(&config.url_history_file).clear()?;
        }
        Command::Play { url } => {
            let engine = ExternalPlayer::new(&config.external_player)
                .with_user_agent(&config.user_agent);
            let mut player = Player::new(engine);
            player.set_volume(config.volume);
            player.play(&url)?;
            if let Some(code) = player.engine_mut().wait()? {
                if code != 0 {
                    warn!(code, "player exited with error");
                }
            }
        }
        Command::Settings(SettingsCommand::Export { path }) => settings::export(config, path)?,
        Command::Settings(SettingsCommand::Import { path }) => {
            let count = settings::import(config, path)?;
            println!("imported {} playlists", count);
        }
        Command::Settings(SettingsCommand::Reset) => settings::reset(config)?,
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    init_logging(&config.log_level);

    match run(&config, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
