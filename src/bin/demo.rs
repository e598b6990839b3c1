//! A tiny runnable driver for the consensus core: builds one of a handful
//! of fixed scenario snapshots, hands it to [`continuity_core::decide`],
//! and prints the outcome. Not a node — no networking, no storage, no
//! configuration beyond picking a scenario and a log level.

use clap::Parser;
use continuity_core::{decide, ElectorId, ElectorSet, Event, EventHash, EventKind, History};
use std::collections::BTreeMap;
use tracing::{info, Level};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::prelude::__tracing_subscriber_SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

#[derive(Debug, Parser)]
#[clap(version, about = "runs one consensus round over a fixed scenario")]
struct Opts {
  #[clap(long, default_value = "s1", help = "scenario to run: s1 or s2")]
  scenario: String,

  #[clap(
    short,
    long,
    parse(from_occurrences),
    help = "use verbose output (-vv very verbose output)"
  )]
  verbose: u64,
}

fn merge(tag: &str, creator: &str, parents: &[&str]) -> Event {
  Event {
    event_hash: EventHash::of(tag.as_bytes()),
    creator: ElectorId::new(creator),
    kind: EventKind::Merge,
    tree_hash: parents.first().map(|p| EventHash::of(p.as_bytes())),
    parent_hash: parents.iter().map(|p| EventHash::of(p.as_bytes())).collect(),
  }
}

/// S1 (§8): a single elector, three merge events in a row.
fn scenario_s1() -> (Vec<Event>, Vec<&'static str>) {
  let events = vec![
    merge("a1", "A", &[]),
    merge("a2", "A", &["a1"]),
    merge("a3", "A", &["a2"]),
  ];
  (events, vec!["A"])
}

/// A four-elector round where every creator's merge at generation `k` lists
/// its own generation-`(k - 1)` event first (so it resolves as `tree_hash`)
/// followed by the other three creators' generation-`(k - 1)` events,
/// converging quickly on all four branch tails.
fn scenario_s2() -> (Vec<Event>, Vec<&'static str>) {
  let creators = ["A", "B", "C", "D"];
  let mut events = Vec::new();
  let mut previous: BTreeMap<&str, String> = BTreeMap::new();
  for creator in creators {
    let tag = format!("{}1", creator.to_lowercase());
    events.push(merge(&tag, creator, &[]));
    previous.insert(creator, tag);
  }
  for gen in 2..=6 {
    let mut current: BTreeMap<&str, String> = BTreeMap::new();
    for creator in creators {
      let tag = format!("{}{}", creator.to_lowercase(), gen);
      let mut parents = vec![previous[creator].as_str()];
      parents.extend(creators.iter().filter(|c| **c != creator).map(|c| previous[c].as_str()));
      events.push(merge(&tag, creator, &parents));
      current.insert(creator, tag);
    }
    previous = current;
  }
  (events, creators.to_vec())
}

fn main() -> anyhow::Result<()> {
  let opts = Opts::parse();

  let log_level = match opts.verbose {
    0 => Level::INFO,
    1 => Level::DEBUG,
    _ => Level::TRACE,
  };
  tracing_subscriber::registry()
    .with(tracing_subscriber::fmt::layer().with_filter(filter_fn(move |metadata| metadata.level() <= &log_level)))
    .init();

  let (events, elector_names) = match opts.scenario.as_str() {
    "s2" => scenario_s2(),
    _ => scenario_s1(),
  };

  info!(scenario = %opts.scenario, events = events.len(), "building history snapshot");
  let history = History::build(events)?;
  let electors = ElectorSet::new(elector_names.into_iter().map(ElectorId::new).collect());

  let outcome = decide(&history, &electors, 1);
  for report in &outcome.byzantine_reports {
    info!(elector = %report.elector, kind = ?report.kind, "byzantine elector detected");
  }
  match outcome.decision {
    Some(decision) => {
      info!(
        committed = decision.event_hashes.len(),
        proof = decision.consensus_proof_hashes.len(),
        "round decided"
      );
    }
    None => info!("round produced no decision"),
  }

  Ok(())
}
