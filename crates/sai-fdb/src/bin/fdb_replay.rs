//! Replays an FDB learn/age/flush scenario against the cache.
//!
//! A scenario is a YAML file naming the switch objects (ports, LAGs, VLANs)
//! and a list of steps. Delivered notifications and dumps are printed as they
//! happen, as text or as JSON lines.
//!
//! ```yaml
//! objects:
//!   ports: [1, 2]
//!   lags: [1]
//!   vlans: [10]
//! steps:
//!   - op: register
//!     mac: "00:11:22:33:44:55"
//!     vlan: 10
//!   - op: learn
//!     mac: "00:11:22:33:44:55"
//!     vlan: 10
//!     port: "port:1"
//!   - op: drain
//!   - op: teardown
//!     object: "port:1"
//! ```

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use log::{error, info, warn};
use sai_common::{MacAddress, SaiObjectId, SaiObjectType, VlanId};
use sai_fdb::{
    render_entries, render_registered, FdbAttribute, FdbCache, FdbCacheConfig, FdbEntry,
    FdbEntryType, FdbKey, FdbNotification, FlushEntryType, FlushScope, NotificationPump,
    NotificationRecorder, PacketAction, SwitchObjectRegistry,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// FDB cache scenario replay
#[derive(Parser, Debug)]
#[command(name = "fdb-replay")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scenario file (YAML)
    scenario: PathBuf,

    /// Cache configuration file (TOML)
    #[arg(short = 'c', long, default_value = "/etc/opx/sai_fdb_cache.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Print notifications and dumps as JSON lines
    #[arg(long)]
    json: bool,

    /// Deliver notifications from the background pump as well as on drain steps
    #[arg(long)]
    pump: bool,

    /// Exit with failure if any step fails
    #[arg(long)]
    strict: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScenarioObjects {
    ports: Vec<u64>,
    lags: Vec<u64>,
    vlans: Vec<u16>,
}

#[derive(Debug, Deserialize)]
struct Scenario {
    #[serde(default)]
    objects: ScenarioObjects,
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Step {
    Register {
        mac: MacAddress,
        vlan: VlanId,
    },
    Unregister {
        mac: MacAddress,
        vlan: VlanId,
    },
    Learn {
        mac: MacAddress,
        vlan: VlanId,
        port: String,
        #[serde(default)]
        entry_type: FdbEntryType,
        #[serde(default)]
        action: PacketAction,
    },
    Move {
        mac: MacAddress,
        vlan: VlanId,
        port: String,
    },
    Age {
        mac: MacAddress,
        vlan: VlanId,
    },
    Delete {
        mac: MacAddress,
        vlan: VlanId,
    },
    Flush {
        #[serde(default)]
        port: Option<String>,
        #[serde(default)]
        vlan: Option<VlanId>,
        #[serde(default)]
        entry_type: FlushEntryType,
    },
    /// Deletes a port, LAG or VLAN and flushes every entry it owned.
    Teardown {
        #[serde(default)]
        object: Option<String>,
        #[serde(default)]
        vlan: Option<VlanId>,
    },
    Drain,
    Dump,
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Step::Register { .. } => "register",
            Step::Unregister { .. } => "unregister",
            Step::Learn { .. } => "learn",
            Step::Move { .. } => "move",
            Step::Age { .. } => "age",
            Step::Delete { .. } => "delete",
            Step::Flush { .. } => "flush",
            Step::Teardown { .. } => "teardown",
            Step::Drain => "drain",
            Step::Dump => "dump",
        }
    }
}

/// Parses "port:N" or "lag:N".
fn parse_object(text: &str) -> Result<SaiObjectId> {
    let (kind, index) = text
        .split_once(':')
        .ok_or_else(|| anyhow!("expected port:N or lag:N, got {:?}", text))?;
    let index: u64 = index
        .parse()
        .with_context(|| format!("invalid object index in {:?}", text))?;
    let ty = match kind {
        "port" => SaiObjectType::Port,
        "lag" => SaiObjectType::Lag,
        other => bail!("unknown object kind {:?}", other),
    };
    Ok(SaiObjectId::new(ty, index))
}

fn build_objects(scenario: &ScenarioObjects) -> Result<SwitchObjectRegistry> {
    let objects = SwitchObjectRegistry::new();
    for &index in &scenario.ports {
        objects.add_port(SaiObjectId::new(SaiObjectType::Port, index));
    }
    for &index in &scenario.lags {
        objects.create_lag(SaiObjectId::new(SaiObjectType::Lag, index));
    }
    for &vlan in &scenario.vlans {
        objects.create_vlan(VlanId::new(vlan).with_context(|| format!("vlan {}", vlan))?);
    }
    Ok(objects)
}

struct Replay {
    objects: Arc<SwitchObjectRegistry>,
    cache: Arc<FdbCache>,
    recorder: Arc<NotificationRecorder>,
    json: bool,
}

impl Replay {
    fn apply(&self, step: &Step) -> Result<()> {
        match step {
            Step::Register { mac, vlan } => self.cache.register(FdbKey::new(*mac, *vlan))?,
            Step::Unregister { mac, vlan } => self.cache.unregister(&FdbKey::new(*mac, *vlan))?,
            Step::Learn {
                mac,
                vlan,
                port,
                entry_type,
                action,
            } => {
                let entry = FdbEntry::new(FdbKey::new(*mac, *vlan), parse_object(port)?)
                    .with_type(*entry_type)
                    .with_action(*action);
                self.cache.insert_or_update(entry)?;
            }
            Step::Move { mac, vlan, port } => {
                let port = parse_object(port)?;
                self.cache
                    .update_attribute(&FdbKey::new(*mac, *vlan), FdbAttribute::PortId(port))?;
            }
            Step::Age { mac, vlan } => {
                self.cache.age_out(&FdbKey::new(*mac, *vlan))?;
            }
            Step::Delete { mac, vlan } => {
                self.cache.remove(&FdbKey::new(*mac, *vlan))?;
            }
            Step::Flush {
                port,
                vlan,
                entry_type,
            } => {
                let port = port.as_deref().map(parse_object).transpose()?;
                let scope = match (port, *vlan) {
                    (None, None) => FlushScope::All,
                    (Some(port), None) => FlushScope::Port(port),
                    (None, Some(vlan)) => FlushScope::Vlan(vlan),
                    (Some(port), Some(vlan)) => FlushScope::PortVlan(port, vlan),
                };
                let removed = self.cache.flush(scope, *entry_type);
                info!("Flushed {} entries ({}, {})", removed, scope, entry_type);
            }
            Step::Teardown { object, vlan } => {
                let scope = match (object.as_deref(), *vlan) {
                    (Some(object), None) => {
                        let oid = parse_object(object)?;
                        let removed = match oid.object_type() {
                            Some(SaiObjectType::Lag) => self.objects.remove_lag(oid),
                            _ => self.objects.remove_port(oid),
                        };
                        if !removed {
                            bail!("{} does not exist", object);
                        }
                        FlushScope::Port(oid)
                    }
                    (None, Some(vlan)) => {
                        if !self.objects.remove_vlan(vlan) {
                            bail!("vlan {} does not exist", vlan);
                        }
                        FlushScope::Vlan(vlan)
                    }
                    _ => bail!("teardown takes exactly one of object or vlan"),
                };
                let flushed = self.cache.flush(scope, FlushEntryType::All);
                info!("Tore down {}, flushed {} entries", scope, flushed);
            }
            Step::Drain => {
                self.cache.send_notifications()?;
                self.print_notifications(&self.recorder.take())?;
            }
            Step::Dump => self.print_dump()?,
        }
        Ok(())
    }

    fn print_notifications(&self, notifications: &[FdbNotification]) -> Result<()> {
        for n in notifications {
            if self.json {
                println!("{}", serde_json::to_string(n)?);
            } else {
                println!("{} {} port:{}", n.event, n.key, n.port);
            }
        }
        Ok(())
    }

    fn print_dump(&self) -> Result<()> {
        let guard = self.cache.lock();
        let entries = guard.dump_all();
        let registered = guard.dump_registered();
        drop(guard);

        if self.json {
            println!(
                "{}",
                serde_json::json!({ "entries": entries, "registered": registered })
            );
        } else {
            print!("{}", render_entries(&entries));
            print!("{}", render_registered(&registered));
        }
        Ok(())
    }
}

async fn run(args: &Args) -> Result<usize> {
    let config = FdbCacheConfig::load_or_default(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let content = std::fs::read_to_string(&args.scenario)
        .with_context(|| format!("reading {}", args.scenario.display()))?;
    let scenario: Scenario = serde_yaml::from_str(&content)
        .with_context(|| format!("parsing {}", args.scenario.display()))?;

    let objects = Arc::new(build_objects(&scenario.objects)?);
    let cache = Arc::new(FdbCache::try_new(config, objects.clone())?);
    let recorder = Arc::new(NotificationRecorder::new());
    cache.set_notification_handler(recorder.clone());

    let pump = args.pump.then(|| NotificationPump::spawn(cache.clone()));
    let replay = Replay {
        objects,
        cache: cache.clone(),
        recorder,
        json: args.json,
    };

    let mut failures = 0;
    for (index, step) in scenario.steps.iter().enumerate() {
        if let Err(e) = replay.apply(step) {
            warn!("Step {} ({}) failed: {:#}", index, step.name(), e);
            failures += 1;
        }
    }

    if let Some(pump) = pump {
        pump.shutdown().await;
    }
    replay.cache.send_notifications()?;
    replay.print_notifications(&replay.recorder.take())?;

    let stats = cache.stats();
    info!(
        "Replay done: {} steps, {} failed, {} entries, {} notifications delivered",
        scenario.steps.len(),
        failures,
        cache.len(),
        stats.notifications_delivered
    );
    Ok(failures)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    match run(&args).await {
        Ok(failures) if failures > 0 && args.strict => {
            error!("{} steps failed", failures);
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("fdb-replay: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
