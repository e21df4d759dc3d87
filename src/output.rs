use anyhow::{Context, Result};
use flock_common::{Agent, OutputConfig, Snapshot};
use log::{info, warn};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    /// Binary format (much more compact)
    Bincode,
    /// MessagePack format (compact and cross-platform)
    MessagePack,
}

impl SnapshotFormat {
    /// Parses the `format` setting. Unknown names fall back to JSON with a warning.
    pub fn from_setting(setting: Option<&str>) -> Self {
        match setting.unwrap_or("json") {
            "json" => SnapshotFormat::Json,
            "bincode" => SnapshotFormat::Bincode,
            "messagepack" | "msgpack" => SnapshotFormat::MessagePack,
            other => {
                warn!("Unknown output format: {}. Using JSON instead.", other);
                SnapshotFormat::Json
            }
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            SnapshotFormat::Json => "json",
            SnapshotFormat::Bincode => "bin",
            SnapshotFormat::MessagePack => "msgpack",
        }
    }
}

/// Writes every snapshot to `<base_filename>_snapshots.<ext>` and returns the path.
pub fn write_snapshots(snapshots: &[Snapshot], output: &OutputConfig) -> Result<PathBuf> {
    let format = SnapshotFormat::from_setting(output.format.as_deref());
    let path = PathBuf::from(format!("{}_snapshots.{}", output.base_filename, format.extension()));
    write_snapshots_to(snapshots, format, &path)?;
    info!("{} snapshots saved to {} ({:?})", snapshots.len(), path.display(), format);
    Ok(path)
}

pub fn write_snapshots_to(snapshots: &[Snapshot], format: SnapshotFormat, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Error creating snapshot file '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);
    match format {
        SnapshotFormat::Json => serde_json::to_writer(&mut writer, snapshots)
            .context("Error serializing snapshots to JSON")?,
        SnapshotFormat::Bincode => bincode::serialize_into(&mut writer, snapshots)
            .context("Error serializing snapshots to bincode")?,
        SnapshotFormat::MessagePack => rmp_serde::encode::write(&mut writer, snapshots)
            .context("Error serializing snapshots to MessagePack")?,
    }
    writer.flush()?;
    Ok(())
}

/// Writes one CSV row per agent: id, sprite, position and velocity.
pub fn write_final_positions(agents: &[Agent], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Error creating CSV file '{}'", path.display()))?;
    writer.write_record(["id", "sprite", "x", "y", "vx", "vy"])?;
    for agent in agents {
        writer.write_record(&[
            agent.id.to_string(),
            agent.sprite_index.to_string(),
            format!("{:.4}", agent.position.x),
            format!("{:.4}", agent.position.y),
            format!("{:.4}", agent.velocity.x),
            format!("{:.4}", agent.velocity.y),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
