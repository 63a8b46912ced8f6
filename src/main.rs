// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::{crate_version, Parser, Subcommand};
use notesync::config::{Audio, Player};
use notesync::notes::Score;
use notesync::scheduler::Scheduler;
use notesync::{audio, schedule::Schedule};
use tokio::sync::oneshot;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Grace period after completion so the last tone's release reaches the device.
const DRAIN_DELAY: Duration = Duration::from_millis(250);

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "Plays a score with synchronized note highlighting."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the available audio output devices.
    Devices {},
    /// Prints when every note of a score would start, without playing it.
    Schedule {
        /// The path to the score.
        score_path: String,
        /// Seconds per beat. Overrides the score's own tempo.
        #[arg[short, long]]
        beat_duration: Option<f64>,
    },
    /// Plays a score through the audio interface.
    Play {
        /// The path to the score.
        score_path: String,
        /// The path to the player config.
        #[arg[short, long]]
        config: Option<String>,
        /// The device name to play through. Overrides the player config.
        #[arg[short, long]]
        device: Option<String>,
        /// Seconds per beat. Overrides the score and the player config.
        #[arg[short, long]]
        beat_duration: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices.iter() {
                println!("- {}", device);
            }
        }
        Commands::Schedule {
            score_path,
            beat_duration,
        } => {
            let score = Score::deserialize(&PathBuf::from(&score_path))?;
            let beat_duration = score.tempo(beat_duration, None)?;
            let schedule = Schedule::build(score.notes(), beat_duration);

            println!(
                "{} ({} notes, {}s per beat):",
                score.name(),
                score.notes().len(),
                beat_duration.seconds()
            );
            for (scheduled, note) in schedule.notes().iter().zip(score.notes()) {
                println!("- {:>8.3}s  #{} {}", scheduled.offset, scheduled.index, note);
            }
            println!("- {:>8.3}s  complete", schedule.completion());
        }
        Commands::Play {
            score_path,
            config,
            device,
            beat_duration,
        } => {
            let score = Score::deserialize(&PathBuf::from(&score_path))?;
            let mut player = match config {
                Some(config) => Player::deserialize(&PathBuf::from(&config))?,
                None => Player::new(Audio::new("default"), None),
            };
            if let Some(device) = device {
                player.set_audio(Audio::new(&device));
            }
            let beat_duration = score.tempo(beat_duration, Some(&player))?;

            let engine = audio::get_engine(player.audio());
            engine.initialize();
            engine.resume();
            if !engine.is_available() {
                warn!(
                    engine = engine.to_string(),
                    "Audio unavailable, highlighting only"
                );
            }

            let scheduler = Scheduler::new(beat_duration);
            let (done_tx, done_rx) = oneshot::channel::<()>();
            let notes = score.notes().to_vec();
            scheduler.run(
                score.notes(),
                move |index| {
                    if let Some(note) = notes.get(index) {
                        info!(index, note = note.to_string(), "Highlight");
                    }
                },
                move || {
                    let _ = done_tx.send(());
                },
                engine.clone(),
            );

            tokio::select! {
                _ = done_rx => {
                    tokio::time::sleep(DRAIN_DELAY).await;
                    info!(score = score.name(), "Finished playing score");
                }
                _ = tokio::signal::ctrl_c() => {
                    tokio::task::block_in_place(|| scheduler.stop());
                    info!(score = score.name(), "Playback stopped");
                }
            }
        }
    }

    Ok(())
}
