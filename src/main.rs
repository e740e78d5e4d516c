use strum_engine::config::EngineConfig;
use strum_engine::coordinator::Coordinator;
use strum_engine::geometry::{Layout, Viewport};
use strum_engine::output::OfflineOutput;
use strum_engine::settings::{Capo, ChordSet, PlayerConfig, PresetStore};
use strum_engine::simulator::{Script, Simulator};
use strum_engine::tone::Tone;
use strum_engine::types::*;
#[cfg(feature = "audio")]
use strum_engine::{audio_output::CpalOutput, console_display};

use clap::Parser;
use crossbeam_channel::{unbounded, Sender};
use log::{error, info, warn};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "strum-engine")]
#[command(about = "Touch-driven virtual guitar: strum gestures in, plucked strings out")]
struct Cli {
    /// Chord to start on
    #[arg(long, default_value = "C")]
    chord: String,

    /// Capo position (0-12)
    #[arg(long, default_value_t = 0)]
    capo: u8,

    /// Tone: "acoustic" or "distortion" ("rock")
    #[arg(long, default_value = "acoustic")]
    tone: String,

    /// Gesture script: "down", "up", "taps", or "demo"
    #[arg(long, default_value = "demo")]
    demo: String,

    /// Virtual viewport width (px). Height >= width plays in portrait.
    #[arg(long, default_value_t = 1280.0)]
    width: f32,

    /// Virtual viewport height (px)
    #[arg(long, default_value_t = 720.0)]
    height: f32,

    /// Pointer sample interval for scripted gestures (ms)
    #[arg(long, default_value_t = 8)]
    sample_ms: u32,

    /// Offline render sample rate (Hz); overrides the config file
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Engine config JSON (tolerances, envelope, wavetable)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective engine config to this path and exit
    #[arg(long)]
    dump_config: Option<PathBuf>,

    /// Preset library JSON
    #[arg(long)]
    presets: Option<PathBuf>,

    /// Preset to load from the library (sets chord bar and capo)
    #[arg(long)]
    preset: Option<String>,

    /// Output WAV for offline rendering
    #[arg(long, default_value = "strum.wav")]
    out: PathBuf,

    /// Print strum events (offline) or a live string view (with --play)
    #[arg(long)]
    console: bool,

    /// Console display refresh rate (Hz)
    #[arg(long, default_value_t = 30)]
    display_hz: u32,

    /// Play live through the default audio device instead of rendering a WAV
    #[cfg(feature = "audio")]
    #[arg(long)]
    play: bool,
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .format_timestamp_millis()
    .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path).unwrap_or_else(|| {
            warn!("Using default engine config");
            EngineConfig::default()
        }),
        None => EngineConfig::default(),
    };
    if let Some(sr) = cli.sample_rate {
        config.sample_rate = sr;
    }

    if let Some(path) = &cli.dump_config {
        if let Err(e) = config.save(path) {
            error!("Failed to write config {:?}: {}", path, e);
            std::process::exit(1);
        }
        return;
    }

    let mut player = PlayerConfig {
        chord: cli.chord.clone(),
        capo: Capo::new(cli.capo),
        tone: Tone::from_name(&cli.tone),
    };
    let chord_bar = load_chord_bar(&cli, &mut player);

    let script = Script::from_name(&cli.demo);
    let layout = Layout::evenly_spaced(Viewport::new(cli.width, cli.height));
    let mut sim = Simulator::new(layout, cli.sample_ms);

    info!("═══════════════════════════════════════════════");
    info!("  STRUM ENGINE v{}", env!("CARGO_PKG_VERSION"));
    info!("  Chord: {}  Capo: {}  Tone: {}", player.chord, player.capo, player.tone);
    info!("  Chord bar: {}", chord_bar.chords().join(" "));
    info!("  Script: {:?}  Layout: {:?}", script, layout.viewport.orientation());
    info!("═══════════════════════════════════════════════");

    #[cfg(feature = "audio")]
    if cli.play {
        run_live(&cli, &config, player, chord_bar, &sim, script);
        return;
    }

    run_offline(&cli, &config, player, chord_bar, &mut sim, script);
}

/// Apply `--presets`/`--preset`. The preset's capo wins over `--capo`.
fn load_chord_bar(cli: &Cli, player: &mut PlayerConfig) -> ChordSet {
    let (Some(path), Some(name)) = (&cli.presets, &cli.preset) else {
        return ChordSet::default();
    };
    let Some(store) = PresetStore::load_file(path) else {
        warn!("No presets at {:?}; using the default chord bar", path);
        return ChordSet::default();
    };
    match store.load(name) {
        Some((chords, capo)) => {
            info!("Preset {:?}: {} chords, capo {}", name, chords.chords().len(), capo);
            player.capo = capo;
            chords
        }
        None => {
            warn!("Preset {:?} not found (have: {})", name, store.names().join(", "));
            ChordSet::default()
        }
    }
}

/// Render the script on the offline audio clock and write a WAV.
fn run_offline(
    cli: &Cli,
    config: &EngineConfig,
    player: PlayerConfig,
    chord_bar: ChordSet,
    sim: &mut Simulator,
    script: Script,
) {
    let sample_rate = config.sample_rate;
    let (event_tx, event_rx) = unbounded::<StrumEvent>();
    let event_txs: Vec<Sender<StrumEvent>> = if cli.console { vec![event_tx] } else { Vec::new() };

    let mut coord: Coordinator<OfflineOutput> = Coordinator::new(
        config,
        player,
        event_txs,
        Box::new(move || Ok(OfflineOutput::new(sample_rate))),
    )
    .with_chord_bar(chord_bar);

    let events = sim.script(&script.gestures());
    let wall_start = Instant::now();

    // The script stands in for a user who pressed Start.
    coord.handle(InputEvent::Activate);

    for te in events {
        if let Some(out) = coord.synth_mut().output_mut() {
            out.render_until(te.at);
        }
        coord.handle(te.event);
        coord.fire_due_pulses(wall_start + Duration::from_secs_f64(te.at));
        for ev in event_rx.try_iter() {
            println!("{:>8.3}s  {}", te.at, ev);
        }
    }

    let end = sim.script_secs();
    let late = coord.fire_due_pulses(wall_start + Duration::from_secs_f64(end + 1.0));
    for ev in event_rx.try_iter() {
        println!("{:>8.3}s  {}", end, ev);
    }
    if late > 0 {
        info!("{} pulses fired after the last event", late);
    }

    let Some(out) = coord.synth_mut().output_mut() else {
        error!("Audio never activated; nothing to write");
        return;
    };
    out.render_until(end);

    match out.write_wav(&cli.out) {
        Ok(()) => info!("{} plucks rendered to {:?}", coord.plucks(), cli.out),
        Err(e) => error!("Failed to write {:?}: {}", cli.out, e),
    }
}

/// Play the script live. The coordinator stays on this thread because the
/// output stream it opens may not be movable across threads.
#[cfg(feature = "audio")]
fn run_live(
    cli: &Cli,
    config: &EngineConfig,
    player: PlayerConfig,
    chord_bar: ChordSet,
    sim: &Simulator,
    script: Script,
) {
    use crossbeam_channel::bounded;
    use std::thread;

    let (input_tx, input_rx) = bounded::<InputEvent>(1024);
    let mut event_txs: Vec<Sender<StrumEvent>> = Vec::new();
    let mut handles = Vec::new();

    // ─── Console display (opt-in) ───────────────────────────────────
    if cli.console {
        let (tx, rx) = bounded::<StrumEvent>(256);
        event_txs.push(tx);
        let hz = cli.display_hz;
        let pulse = Duration::from_millis(config.synth.pulse_ms);
        handles.push(thread::Builder::new().name("display".into()).spawn(move || {
            console_display::ConsoleDisplay::new(rx, hz, pulse).run();
        }).unwrap());
    }

    // ─── Input source ───────────────────────────────────────────────
    let gestures = script.gestures();
    let mut sim_thread = Simulator::new(*sim.layout(), cli.sample_ms);
    handles.push(thread::Builder::new().name("simulator".into()).spawn(move || {
        let tx = input_tx;
        tx.send(InputEvent::Activate).ok();
        sim_thread.run(&gestures, &tx);
    }).unwrap());

    // ─── Coordinator (this thread) ──────────────────────────────────
    let mut coord: Coordinator<CpalOutput> =
        Coordinator::new(config, player, event_txs, Box::new(CpalOutput::open))
            .with_chord_bar(chord_bar);
    coord.run(input_rx);
    drop(coord);

    for h in handles {
        let _ = h.join();
    }
}
