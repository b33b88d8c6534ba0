use anyhow::{Context, Result};
use clap::Args;
use notify_core::clock::ManualClock;
use notify_core::directory::Contact;
use notify_core::host::{
    ManualTicker, MemoryWatermark, RecordingLookup, RecordingPresenter, RecordingSignals,
    StaticChat, WatermarkStore,
};
use notify_core::model::{BulkFetch, DynamicData, RawEvent};
use notify_core::render::RenderItem;
use notify_core::{Collaborators, Engine, SeenOrigin};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::cmd::config::resolve_config;
use crate::output::{self, OutputMode};
use crate::watermark::FileWatermark;

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Bulk fetch result (JSON object with `c`, `ltd`, `a`, `u`).
    #[arg(long)]
    pub bulk: PathBuf,

    /// Live stream capture, one raw event per line.
    #[arg(long)]
    pub live: Option<PathBuf>,

    /// Promotional notices (JSON array).
    #[arg(long)]
    pub dynamic: Option<PathBuf>,

    /// File holding the persisted watermark. In-memory when omitted.
    #[arg(long)]
    pub watermark: Option<PathBuf>,

    /// Mark everything seen after replaying.
    #[arg(long)]
    pub mark_seen: bool,

    /// Countdown ticks to run after replaying.
    #[arg(long, default_value_t = 0)]
    pub ticks: u32,

    /// Replay clock start, unix seconds. Defaults to the current time.
    #[arg(long)]
    pub now: Option<i64>,
}

/// What a replay prints.
#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub unseen: usize,
    pub watermark: u64,
    pub notifications: Vec<RenderItem>,
}

pub fn run_replay(args: &ReplayArgs, config_path: Option<&Path>, output: OutputMode) -> Result<()> {
    let report = replay(args, config_path)?;
    let stdout = io::stdout();
    let mut w = stdout.lock();
    print_report(&mut w, &report, output)?;
    Ok(())
}

pub fn replay(args: &ReplayArgs, config_path: Option<&Path>) -> Result<ReplayReport> {
    let config = resolve_config(config_path)?;
    let bulk = read_bulk(&args.bulk)?;
    let live = args.live.as_deref().map(read_live).transpose()?.unwrap_or_default();
    let dynamic = args
        .dynamic
        .as_deref()
        .map(read_dynamic)
        .transpose()?
        .unwrap_or_default();

    let start = args.now.unwrap_or_else(|| chrono::Utc::now().timestamp());
    let clock = ManualClock::new(start);
    let lookup = RecordingLookup::default();
    let tick_secs = i64::try_from(config.tick_interval_ms.div_ceil(1000).max(1)).unwrap_or(1);

    let watermark: Box<dyn WatermarkStore> = match &args.watermark {
        Some(path) => Box::new(FileWatermark::new(path)),
        None => Box::new(MemoryWatermark::default()),
    };

    let host = Collaborators {
        clock: Box::new(clock.clone()),
        watermark,
        signals: Box::new(RecordingSignals::default()),
        chat: Box::new(StaticChat::default()),
        ticker: Box::new(ManualTicker::default()),
        lookup: Box::new(lookup.clone()),
        presenter: Box::new(RecordingPresenter::default()),
    };
    let mut engine = Engine::new(config, host);

    info!(
        events = bulk.events.len(),
        live = live.len(),
        dynamic = dynamic.len(),
        "replaying capture"
    );
    engine.load_bulk(bulk);
    for raw in live {
        engine.apply_live(raw);
    }
    for data in dynamic {
        engine.ingest_dynamic(data);
    }

    for _ in 0..args.ticks {
        clock.advance(tick_secs);
        engine.on_tick();
    }

    if args.mark_seen {
        engine.mark_all_seen(SeenOrigin::Local);
    }

    let mut notifications = engine.render_pass();
    let requested = lookup.requests();
    if !requested.is_empty() {
        // No directory to ask; fall back to bare handles.
        debug!(count = requested.len(), "resolving users by handle");
        for handle in requested {
            engine.complete_lookup(Contact {
                handle,
                email: None,
                name: None,
            });
        }
        notifications = engine.render_pass();
    }

    Ok(ReplayReport {
        unseen: engine.unseen_count(),
        watermark: engine.watermark(),
        notifications,
    })
}

fn read_bulk(path: &Path) -> Result<BulkFetch> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn read_live(path: &Path) -> Result<Vec<RawEvent>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("{}:{}: invalid event", path.display(), idx + 1))
        })
        .collect()
}

fn read_dynamic(path: &Path) -> Result<Vec<DynamicData>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn print_report(w: &mut dyn Write, report: &ReplayReport, output: OutputMode) -> io::Result<()> {
    if output.is_json() {
        return output::write_json(w, report);
    }

    output::pretty_section(w, "Notifications")?;
    if report.notifications.is_empty() {
        writeln!(w, "(none)")?;
    }
    for item in &report.notifications {
        output::pretty_item(w, item)?;
    }
    output::pretty_rule(w)?;
    output::pretty_kv(w, "unseen", report.unseen.to_string())?;
    output::pretty_kv(w, "watermark", report.watermark.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    const NOW: i64 = 1_700_000_000;

    fn args(dir: &TempDir) -> ReplayArgs {
        ReplayArgs {
            bulk: dir.path().join("bulk.json"),
            live: None,
            dynamic: None,
            watermark: None,
            mark_seen: false,
            ticks: 0,
            now: Some(NOW),
        }
    }

    fn write(dir: &TempDir, name: &str, body: &str) -> Result<PathBuf> {
        let path = dir.path().join(name);
        fs::write(&path, body)?;
        Ok(path)
    }

    #[test]
    fn replays_bulk_and_live() -> Result<()> {
        let dir = TempDir::new()?;
        let bulk = json!({
            "c": 3,
            "ltd": 0,
            "a": [
                { "t": "put", "td": 10, "u": "ana", "n": "X", "f": [{ "h": "h2" }] },
                { "t": "put", "td": 60, "u": "ana", "n": "X", "f": [{ "h": "h1" }] },
                { "t": "psts", "td": 5, "r": "s" }
            ]
        });
        write(&dir, "bulk.json", &bulk.to_string())?;
        let live = write(
            &dir,
            "live.jsonl",
            "{\"t\":\"psts\",\"r\":\"f\"}\n\n{\"t\":\"nope\"}\n",
        )?;

        let mut args = args(&dir);
        args.live = Some(live);
        let report = replay(&args, None)?;

        assert_eq!(report.notifications.len(), 3);
        assert_eq!(report.unseen, 1);
        let put = report
            .notifications
            .iter()
            .find(|n| n.item_count == 2)
            .expect("combined put");
        assert_eq!(put.text, "ana added 2 files");
        Ok(())
    }

    #[test]
    fn mark_seen_persists_watermark() -> Result<()> {
        let dir = TempDir::new()?;
        write(&dir, "bulk.json", "{}")?;
        let dynamic = write(&dir, "dynamic.json", r#"[{ "id": 4, "t": "Sale" }, { "id": 9, "t": "Promo" }]"#)?;

        let mut args = args(&dir);
        args.dynamic = Some(dynamic);
        args.watermark = Some(dir.path().join("watermark"));
        args.mark_seen = true;
        let report = replay(&args, None)?;

        assert_eq!(report.unseen, 0);
        assert_eq!(report.watermark, 9);
        assert_eq!(fs::read_to_string(dir.path().join("watermark"))?, "9\n");
        Ok(())
    }

    #[test]
    fn ticks_expire_promotions() -> Result<()> {
        let dir = TempDir::new()?;
        write(&dir, "bulk.json", "{}")?;
        let body = json!([{ "id": 1, "t": "Flash", "e": NOW + 2 }]).to_string();
        let dynamic = write(&dir, "dynamic.json", &body)?;

        let mut args = args(&dir);
        args.dynamic = Some(dynamic.clone());
        args.ticks = 1;
        let report = replay(&args, None)?;
        assert_eq!(report.notifications[0].remaining.as_deref(), Some("00:00:01"));

        args.ticks = 2;
        let report = replay(&args, None)?;
        assert!(report.notifications.is_empty());
        assert_eq!(report.unseen, 0);
        Ok(())
    }

    #[test]
    fn pretty_report_lists_items() -> Result<()> {
        let report = ReplayReport {
            unseen: 0,
            watermark: 0,
            notifications: Vec::new(),
        };
        let mut buf = Vec::new();
        print_report(&mut buf, &report, OutputMode::Pretty)?;
        let text = String::from_utf8(buf)?;
        assert!(text.starts_with("Notifications\n"));
        assert!(text.contains("(none)"));
        assert!(text.contains("unseen:      0"));
        Ok(())
    }

    #[test]
    fn bad_live_line_reports_location() -> Result<()> {
        let dir = TempDir::new()?;
        write(&dir, "bulk.json", "{}")?;
        let live = write(&dir, "live.jsonl", "{\"t\":\"psts\",\"r\":\"s\"}\nnot json\n")?;
        let mut args = args(&dir);
        args.live = Some(live);
        let err = replay(&args, None).expect_err("should fail");
        assert!(format!("{err:#}").contains("live.jsonl:2"));
        Ok(())
    }
}
