//! Deploy tooling for the pico_synth_sandbox song player.
//!
//! The player is a CircuitPython program (`code.py`) plus the MIDI file
//! parser it imports (`lib/umidiparser.py`). This crate gets them onto the
//! board and checks the SD card the player reads its songs from:
//!
//! - **Device resolution** - Find the mounted CIRCUITPY volume for `$USER`
//! - **Upload** - Copy the manifest onto the device, one file at a time
//! - **Requirements** - Install CircuitPython library dependencies via `circup`
//! - **Player model** - `player.json` validation, selection, volume and MIDI timing
//!
//! # Architecture
//!
//! ```text
//! synth-player-deploy (bin)
//!     │
//!     ├── targets ── all | upload | requirements | check
//!     │      │
//!     │      ├── context ── project dir + device + manifest
//!     │      ├── upload ─── sha256-compared, synced copies
//!     │      └── requirements ── circup (preflight via `which`)
//!     │
//!     └── player ── config, song, controller, playback
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use synth_player_deploy::{DeployContext, DeviceLocator, DeployManifest, Target};
//!
//! let device = DeviceLocator::new("alice")?.resolve();
//! let ctx = DeployContext::new(".".into(), device, DeployManifest::default());
//! synth_player_deploy::targets::run(&ctx, Target::Upload)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod context;
pub mod device;
pub mod manifest;
pub mod player;
pub mod preflight;
pub mod requirements;
pub mod targets;
pub mod upload;

pub use context::DeployContext;
pub use device::DeviceLocator;
pub use manifest::DeployManifest;
pub use targets::Target;
