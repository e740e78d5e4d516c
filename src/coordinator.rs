use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::{debug, info, warn};
use std::time::{Duration, Instant};

use crate::chords::ChordLibrary;
use crate::config::EngineConfig;
use crate::gesture::GestureTracker;
use crate::output::AudioOutput;
use crate::pulse::{PulseSink, StringVisuals};
use crate::settings::{ChordSet, PlayerConfig};
use crate::synth::{ScheduledPluck, StringSynth};
use crate::types::*;

/// Opens the audio output the first time a user gesture needs it.
pub type OutputOpener<O> = Box<dyn FnMut() -> Result<O, String>>;

/// How long `run` sleeps when no pulse is pending.
const IDLE_POLL: Duration = Duration::from_millis(50);

/// The coordinator receives InputEvents (pointer samples, layout changes,
/// and settings changes), runs them through the gesture tracker and the
/// synth, and broadcasts StrumEvents to downstream consumers.
///
/// # Audio activation
///
/// Audio starts on the first user gesture: either an explicit `Activate`
/// or the first pointer-down. Until then every trigger is a silent no-op.
///
/// # Visual pulses
///
/// Each scheduled pluck queues a pulse on the wall clock. `run` wakes up
/// for the next due pulse; callers driving `handle` directly call
/// `fire_due_pulses` themselves.
pub struct Coordinator<O: AudioOutput> {
    event_txs: Vec<Sender<StrumEvent>>,
    tracker: GestureTracker,
    synth: StringSynth<O>,
    visuals: StringVisuals,
    player: PlayerConfig,
    chord_bar: ChordSet,
    opener: OutputOpener<O>,
    plucks: u64,
}

impl<O: AudioOutput> Coordinator<O> {
    pub fn new(
        config: &EngineConfig,
        player: PlayerConfig,
        event_txs: Vec<Sender<StrumEvent>>,
        opener: OutputOpener<O>,
    ) -> Self {
        let synth = StringSynth::new(config.synth, ChordLibrary::default());
        if !synth.library().contains(&player.chord) {
            warn!("Chord {:?} not in library; plucks will use the default", player.chord);
        }
        Self {
            event_txs,
            tracker: GestureTracker::new(config.tracker),
            synth,
            visuals: StringVisuals::new(Duration::from_millis(config.synth.pulse_ms)),
            player,
            chord_bar: ChordSet::default(),
            opener,
            plucks: 0,
        }
    }

    /// Replace the chord bar, e.g. from a loaded preset. The current chord
    /// moves to the bar's first chord if it is no longer on it.
    pub fn with_chord_bar(mut self, chord_bar: ChordSet) -> Self {
        self.chord_bar = chord_bar;
        self.chord_bar.reconcile(&mut self.player.chord);
        self
    }

    pub fn player(&self) -> &PlayerConfig {
        &self.player
    }

    pub fn chord_bar(&self) -> &ChordSet {
        &self.chord_bar
    }

    pub fn synth(&self) -> &StringSynth<O> {
        &self.synth
    }

    pub fn synth_mut(&mut self) -> &mut StringSynth<O> {
        &mut self.synth
    }

    pub fn tracker(&self) -> &GestureTracker {
        &self.tracker
    }

    pub fn visuals(&self) -> &StringVisuals {
        &self.visuals
    }

    pub fn plucks(&self) -> u64 {
        self.plucks
    }

    /// Process one event. Returns the voices it scheduled, in trigger order.
    pub fn handle(&mut self, event: InputEvent) -> Vec<ScheduledPluck> {
        match event {
            InputEvent::PointerDown(sample) => {
                self.activate();
                let triggers = self.tracker.pointer_down(sample);
                self.trigger(&triggers)
            }
            InputEvent::PointerMove(sample) => {
                let triggers = self.tracker.pointer_move(sample);
                self.trigger(&triggers)
            }
            InputEvent::PointerUp(id) => {
                self.tracker.pointer_up(id);
                Vec::new()
            }
            InputEvent::Layout(layout) => {
                self.tracker.set_layout(layout);
                Vec::new()
            }
            InputEvent::Activate => {
                self.activate();
                Vec::new()
            }
            InputEvent::SelectChord(name) => {
                if !self.synth.library().contains(&name) {
                    warn!("Chord {:?} not in library; plucks will use the default", name);
                }
                self.player.chord = name;
                self.broadcast_config();
                Vec::new()
            }
            InputEvent::ToggleChord(name) => {
                self.chord_bar.toggle(&name);
                self.chord_bar.reconcile(&mut self.player.chord);
                self.broadcast_config();
                Vec::new()
            }
            InputEvent::SelectTone(tone) => {
                self.player.tone = tone;
                self.broadcast_config();
                Vec::new()
            }
            InputEvent::CapoUp => {
                self.player.capo.increment();
                self.broadcast_config();
                Vec::new()
            }
            InputEvent::CapoDown => {
                self.player.capo.decrement();
                self.broadcast_config();
                Vec::new()
            }
        }
    }

    /// Flash every string whose pulse is due at `now`. Returns how many fired.
    pub fn fire_due_pulses(&mut self, now: Instant) -> usize {
        let due = self.synth.take_due_pulses(now);
        for &string in &due {
            self.visuals.pulse(string);
            self.broadcast(StrumEvent::Pulse { string });
        }
        due.len()
    }

    /// Live loop: handle events until the input channel closes, waking up
    /// in between to fire pulses on time.
    pub fn run(&mut self, input_rx: Receiver<InputEvent>) {
        info!("Coordinator running ({})", self.player_summary());

        loop {
            let timeout = self
                .synth
                .next_pulse_due()
                .map(|due| due.saturating_duration_since(Instant::now()))
                .unwrap_or(IDLE_POLL);

            match input_rx.recv_timeout(timeout) {
                Ok(event) => {
                    self.handle(event);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            self.fire_due_pulses(Instant::now());
        }

        info!("Coordinator shutting down after {} plucks", self.plucks);
    }

    fn activate(&mut self) {
        let opener = &mut self.opener;
        if let Err(e) = self.synth.init_audio(|| opener()) {
            warn!("Audio activation failed: {}", e);
        }
    }

    fn trigger(&mut self, triggers: &[StringTrigger]) -> Vec<ScheduledPluck> {
        let mut scheduled = Vec::with_capacity(triggers.len());
        for t in triggers {
            if let Some(p) = self.synth.play_string(t.string, &self.player, t.delay) {
                self.plucks += 1;
                self.broadcast(StrumEvent::Pluck {
                    string: p.string,
                    frequency: p.frequency,
                    start: p.start,
                    stop: p.stop,
                });
                scheduled.push(p);
            }
        }
        if !scheduled.is_empty() {
            debug!("{} of {} triggers sounded", scheduled.len(), triggers.len());
        }
        scheduled
    }

    fn broadcast_config(&self) {
        info!("Now playing {}", self.player_summary());
        self.broadcast(StrumEvent::Config {
            chord: self.player.chord.clone(),
            capo: self.player.capo.get(),
            tone: self.player.tone,
        });
    }

    fn broadcast(&self, event: StrumEvent) {
        for tx in &self.event_txs {
            let _ = tx.send(event.clone());
        }
    }

    fn player_summary(&self) -> String {
        format!(
            "chord={} capo={} tone={}",
            self.player.chord, self.player.capo, self.player.tone
        )
    }
}
