//! Interactive command shell.
//!
//! Commands live in one static table mapping names to handlers, plus an
//! explicit alias map. Any unique prefix of a command name resolves to
//! that command ("mu" runs "mute"); ambiguous prefixes list the options.

use std::io::{self, BufRead, Write};
use std::path::Path;

use thiserror::Error;

use crate::library::{RemoteError, SnapshotError};
use crate::player::PlaybackState;
use crate::search::SearchError;
use crate::session::Session;

mod query;

use query::SearchExpr;


#[derive(Debug, Error)]
enum ShellError {
    #[error("{0}")]
    Search(#[from] SearchError),
    #[error("{0}")]
    Remote(#[from] RemoteError),
    #[error("{0}")]
    Snapshot(#[from] SnapshotError),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("{0}")]
    Message(String),
}

/// Whether the command loop keeps going.
enum Flow {
    Continue,
    Quit,
}

type Handler = fn(&mut Session, &str) -> Result<Flow, ShellError>;

struct Command {
    name: &'static str,
    usage: &'static str,
    help: &'static str,
    run: Handler,
}

#[rustfmt::skip]
static COMMANDS: &[Command] = &[
    Command { name: "play", usage: "play", help: "Start or resume playback.", run: cmd_play },
    Command { name: "pause", usage: "pause", help: "Pause playback.", run: cmd_pause },
    Command { name: "p", usage: "p", help: "Pause/play toggle.", run: cmd_toggle },
    Command { name: "stop", usage: "stop", help: "Stop playback and rewind to the first track.", run: cmd_stop },
    Command { name: "next", usage: "next [n]", help: "Move forward n tracks (default 1).", run: cmd_next },
    Command { name: "prev", usage: "prev [n]", help: "Move back n tracks (default 1).", run: cmd_prev },
    Command { name: "jump", usage: "jump <track>", help: "Jump to the given track number.", run: cmd_jump },
    Command { name: "next_album", usage: "next_album", help: "Move to the first track of the next album.", run: cmd_next_album },
    Command { name: "prev_album", usage: "prev_album", help: "Move to the first track of the previous album.", run: cmd_prev_album },
    Command { name: "status", usage: "status", help: "Show the player status.", run: cmd_status },
    Command { name: "playlist", usage: "playlist [<pattern> ...]", help: "Show the playlist, or replace it with search results.", run: cmd_playlist },
    Command { name: "volume", usage: "volume [0..10]", help: "Show or set the volume.", run: cmd_volume },
    Command { name: "mute", usage: "mute", help: "Set the volume to zero.", run: cmd_mute },
    Command { name: "seek", usage: "seek <seconds>", help: "Seek to an absolute position.", run: cmd_seek },
    Command { name: "ff", usage: "ff [seconds]", help: "Fast forward (default from config).", run: cmd_ff },
    Command { name: "rew", usage: "rew [seconds]", help: "Rewind (default from config).", run: cmd_rew },
    Command { name: "shuffle", usage: "shuffle", help: "Shuffle the playlist.", run: cmd_shuffle },
    Command { name: "shuffle_albums", usage: "shuffle_albums", help: "Shuffle album order, keeping track order within albums.", run: cmd_shuffle_albums },
    Command { name: "clear", usage: "clear", help: "Stop playback and clear the playlist.", run: cmd_clear },
    Command { name: "search", usage: "search <pattern> [in <field> or <field>] [and ...]", help: "Search the collection.", run: cmd_search },
    Command { name: "add", usage: "add <pattern> [in <field> ...]", help: "Search the collection and append matches to the playlist.", run: cmd_add },
    Command { name: "skipto", usage: "skipto <pattern> [in <field> ...]", help: "Skip to the next playlist track matching the pattern.", run: cmd_skipto },
    Command { name: "loaddir", usage: "loaddir <path>", help: "Load a collection from a directory tree.", run: cmd_loaddir },
    Command { name: "loadremote", usage: "loadremote [host[:port]] [password]", help: "Load a collection from a remote library server.", run: cmd_loadremote },
    Command { name: "savecollection", usage: "savecollection <path>", help: "Save the collection to a snapshot file.", run: cmd_savecollection },
    Command { name: "loadcollection", usage: "loadcollection <path>", help: "Load a collection from a snapshot file.", run: cmd_loadcollection },
    Command { name: "help", usage: "help", help: "Show this list.", run: cmd_help },
    Command { name: "exit", usage: "exit", help: "Quit.", run: cmd_exit },
    Command { name: "quit", usage: "quit", help: "Quit.", run: cmd_exit },
];

/// Easier-to-type aliases. Unique prefixes already resolve on their own
/// ("mu" finds "mute"), so only the genuinely ambiguous shortcuts are
/// listed here.
static ALIASES: &[(&str, &str)] = &[
    ("n", "next"),
    ("pr", "prev"),
    ("pl", "playlist"),
    ("sa", "shuffle_albums"),
    ("na", "next_album"),
    ("pa", "prev_album"),
];

enum Resolved {
    Found(&'static Command),
    Ambiguous(Vec<&'static str>),
    Unknown,
}

fn resolve(verb: &str) -> Resolved {
    let verb = match ALIASES.iter().find(|(alias, _)| *alias == verb) {
        Some((_, name)) => name,
        None => verb,
    };

    if let Some(cmd) = COMMANDS.iter().find(|c| c.name == verb) {
        return Resolved::Found(cmd);
    }

    let matches: Vec<&'static Command> = COMMANDS
        .iter()
        .filter(|c| c.name.starts_with(verb))
        .collect();
    match matches.as_slice() {
        [] => Resolved::Unknown,
        [cmd] => Resolved::Found(cmd),
        many => Resolved::Ambiguous(many.iter().map(|c| c.name).collect()),
    }
}

/// Run the interactive loop until `exit` or end of input.
pub fn run(session: &mut Session) -> io::Result<()> {
    println!("vivace interactive shell. Type 'help' for help.");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("vivace> ");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match dispatch(session, input) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => println!("Error: {e}"),
        }
    }
    Ok(())
}

fn dispatch(session: &mut Session, input: &str) -> Result<Flow, ShellError> {
    let (verb, rest) = match input.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (input, ""),
    };

    match resolve(verb) {
        Resolved::Found(cmd) => (cmd.run)(session, rest),
        Resolved::Ambiguous(options) => {
            println!("Command \"{verb}\" is ambiguous, options are:");
            for option in options {
                println!("  {option}");
            }
            Ok(Flow::Continue)
        }
        Resolved::Unknown => {
            println!("Unknown command \"{verb}\", try 'help'.");
            Ok(Flow::Continue)
        }
    }
}

fn print_status(session: &Session) {
    println!("{}", session.with_player(|p| p.status()));
}

fn cmd_play(session: &mut Session, _rest: &str) -> Result<Flow, ShellError> {
    session.with_player(|p| p.play());
    print_status(session);
    Ok(Flow::Continue)
}

fn cmd_pause(session: &mut Session, _rest: &str) -> Result<Flow, ShellError> {
    session.with_player(|p| p.pause());
    print_status(session);
    Ok(Flow::Continue)
}

fn cmd_toggle(session: &mut Session, rest: &str) -> Result<Flow, ShellError> {
    if session.with_player(|p| p.state()) == PlaybackState::Playing {
        cmd_pause(session, rest)
    } else {
        cmd_play(session, rest)
    }
}

fn cmd_stop(session: &mut Session, _rest: &str) -> Result<Flow, ShellError> {
    session.with_player(|p| p.stop());
    print_status(session);
    Ok(Flow::Continue)
}

fn parse_count(rest: &str, usage: &'static str) -> Result<i64, ShellError> {
    if rest.is_empty() {
        return Ok(1);
    }
    rest.parse().map_err(|_| ShellError::Usage(usage))
}

fn cmd_next(session: &mut Session, rest: &str) -> Result<Flow, ShellError> {
    let n = parse_count(rest, "next [n]")?;
    session.with_player(|p| p.next(n));
    print_status(session);
    Ok(Flow::Continue)
}

fn cmd_prev(session: &mut Session, rest: &str) -> Result<Flow, ShellError> {
    let n = parse_count(rest, "prev [n]")?;
    session.with_player(|p| p.prev(n));
    print_status(session);
    Ok(Flow::Continue)
}

fn cmd_jump(session: &mut Session, rest: &str) -> Result<Flow, ShellError> {
    let track: i64 = rest
        .parse()
        .map_err(|_| ShellError::Usage("jump <track>"))?;
    session.with_player(|p| p.set_current_track(track));
    print_status(session);
    Ok(Flow::Continue)
}

fn cmd_next_album(session: &mut Session, _rest: &str) -> Result<Flow, ShellError> {
    session.with_player(|p| p.next_album());
    print_status(session);
    Ok(Flow::Continue)
}

fn cmd_prev_album(session: &mut Session, _rest: &str) -> Result<Flow, ShellError> {
    session.with_player(|p| p.prev_album());
    print_status(session);
    Ok(Flow::Continue)
}

fn cmd_status(session: &mut Session, _rest: &str) -> Result<Flow, ShellError> {
    print_status(session);
    Ok(Flow::Continue)
}

fn cmd_playlist(session: &mut Session, rest: &str) -> Result<Flow, ShellError> {
    if !rest.is_empty() {
        let Some(collection) = session.collection() else {
            return Err(ShellError::Message(
                "no collection loaded, run loaddir first".into(),
            ));
        };
        let results = SearchExpr::parse(rest)?.over_collection(collection);
        let count = results.len();
        session.with_player(|p| p.set_playlist(results));
        println!("Playlist replaced with {count} tracks.");
        return Ok(Flow::Continue);
    }
    session.with_player(|p| {
        if p.playlist().is_empty() {
            println!("(empty playlist)");
        } else {
            println!("{}", p.playlist());
        }
    });
    Ok(Flow::Continue)
}

fn cmd_volume(session: &mut Session, rest: &str) -> Result<Flow, ShellError> {
    if rest.is_empty() {
        println!("{:.1}", session.with_player(|p| p.volume()));
        return Ok(Flow::Continue);
    }
    let volume: f64 = rest
        .parse()
        .map_err(|_| ShellError::Usage("volume [0..10]"))?;
    session.with_player(|p| p.set_volume(volume));
    Ok(Flow::Continue)
}

fn cmd_mute(session: &mut Session, _rest: &str) -> Result<Flow, ShellError> {
    session.with_player(|p| p.mute());
    Ok(Flow::Continue)
}

fn cmd_seek(session: &mut Session, rest: &str) -> Result<Flow, ShellError> {
    let seconds: f64 = rest
        .parse()
        .map_err(|_| ShellError::Usage("seek <seconds>"))?;
    session.with_player(|p| p.seek(seconds));
    Ok(Flow::Continue)
}

fn parse_delta(session: &Session, rest: &str, usage: &'static str) -> Result<f64, ShellError> {
    if rest.is_empty() {
        return Ok(session.settings().player.seek_step as f64);
    }
    rest.parse().map_err(|_| ShellError::Usage(usage))
}

fn cmd_ff(session: &mut Session, rest: &str) -> Result<Flow, ShellError> {
    let delta = parse_delta(session, rest, "ff [seconds]")?;
    session.with_player(|p| p.ff(delta));
    Ok(Flow::Continue)
}

fn cmd_rew(session: &mut Session, rest: &str) -> Result<Flow, ShellError> {
    let delta = parse_delta(session, rest, "rew [seconds]")?;
    session.with_player(|p| p.rew(delta));
    Ok(Flow::Continue)
}

fn cmd_shuffle(session: &mut Session, _rest: &str) -> Result<Flow, ShellError> {
    session.with_player(|p| p.playlist_mut().shuffle());
    Ok(Flow::Continue)
}

fn cmd_shuffle_albums(session: &mut Session, _rest: &str) -> Result<Flow, ShellError> {
    session.with_player(|p| p.playlist_mut().shuffle_albums());
    Ok(Flow::Continue)
}

fn cmd_clear(session: &mut Session, _rest: &str) -> Result<Flow, ShellError> {
    session.with_player(|p| {
        p.stop();
        p.playlist_mut().clear();
    });
    Ok(Flow::Continue)
}

fn cmd_search(session: &mut Session, rest: &str) -> Result<Flow, ShellError> {
    let Some(collection) = session.collection() else {
        return Err(ShellError::Message(
            "no collection loaded, run loaddir first".into(),
        ));
    };
    let results = SearchExpr::parse(rest)?.over_collection(collection);
    if results.is_empty() {
        println!("No matching tracks.");
    } else {
        println!("{results}");
    }
    Ok(Flow::Continue)
}

fn cmd_add(session: &mut Session, rest: &str) -> Result<Flow, ShellError> {
    let Some(collection) = session.collection() else {
        return Err(ShellError::Message(
            "no collection loaded, run loaddir first".into(),
        ));
    };
    let results = SearchExpr::parse(rest)?.over_collection(collection);
    let count = results.len();
    session.with_player(|p| p.playlist_mut().extend(results.iter().cloned()));
    println!("Added {count} tracks.");
    Ok(Flow::Continue)
}

fn cmd_skipto(session: &mut Session, rest: &str) -> Result<Flow, ShellError> {
    let expr = SearchExpr::parse(rest)?;
    let positions = session.with_player(|p| expr.over_playlist(p.playlist()));
    if positions.is_empty() {
        println!("Couldn't find any matching tracks.");
        return Ok(Flow::Continue);
    }
    println!("Found {} matching tracks in playlist.", positions.len());
    session.with_player(|p| p.skip_to(&positions));
    print_status(session);
    Ok(Flow::Continue)
}

fn cmd_loaddir(session: &mut Session, rest: &str) -> Result<Flow, ShellError> {
    if rest.is_empty() {
        return Err(ShellError::Usage("loaddir <path>"));
    }
    let count = session.load_directory(Path::new(rest));
    if session.collection().is_some_and(|c| c.is_empty()) {
        println!("No audio files found under {rest}.");
    } else {
        println!("Loaded {count} tracks.");
    }
    Ok(Flow::Continue)
}

fn cmd_loadremote(session: &mut Session, rest: &str) -> Result<Flow, ShellError> {
    let mut parts = rest.split_whitespace();
    let remote = &session.settings().remote;
    let (mut host, mut port) = (remote.host.clone(), remote.port);

    if let Some(spec) = parts.next() {
        match spec.split_once(':') {
            Some((h, p)) => {
                host = h.to_string();
                port = p
                    .parse()
                    .map_err(|_| ShellError::Usage("loadremote [host[:port]] [password]"))?;
            }
            None => host = spec.to_string(),
        }
    }
    let password = parts.next().map(str::to_string);

    println!("Connecting to {host}:{port}");
    let count = session.load_remote(&host, port, password.as_deref())?;
    println!("Loaded {count} tracks.");
    Ok(Flow::Continue)
}

fn cmd_savecollection(session: &mut Session, rest: &str) -> Result<Flow, ShellError> {
    if rest.is_empty() {
        return Err(ShellError::Usage("savecollection <path>"));
    }
    session.save_collection(Path::new(rest))?;
    Ok(Flow::Continue)
}

fn cmd_loadcollection(session: &mut Session, rest: &str) -> Result<Flow, ShellError> {
    if rest.is_empty() {
        return Err(ShellError::Usage("loadcollection <path>"));
    }
    let count = session.load_collection(Path::new(rest))?;
    println!("Loaded {count} tracks.");
    Ok(Flow::Continue)
}

fn cmd_help(_session: &mut Session, _rest: &str) -> Result<Flow, ShellError> {
    for cmd in COMMANDS {
        println!("  {:<55} {}", cmd.usage, cmd.help);
    }
    println!("\nAny unique command prefix works; aliases:");
    for (alias, name) in ALIASES {
        println!("  {alias:<4} -> {name}");
    }
    Ok(Flow::Continue)
}

fn cmd_exit(_session: &mut Session, _rest: &str) -> Result<Flow, ShellError> {
    Ok(Flow::Quit)
}
