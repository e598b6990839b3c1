//! The public entry point (§6): wires BranchBuilder → CandidateFinder →
//! ProofProtocol → Committer into the one call a ledger node makes per
//! round.

use crate::arena::History;
use crate::branch::Branches;
use crate::candidate::Candidates;
use crate::commit;
use crate::elector::ElectorSet;
use crate::event::EventHash;
use crate::fault::ByzantineReport;
use crate::proof::ProofProtocol;
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span};

/// The two hash collections a block needs once a round decides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
  pub event_hashes: Vec<EventHash>,
  pub consensus_proof_hashes: Vec<EventHash>,
}

/// Everything `decide` has to report for one round: the decision itself
/// (absent when the round doesn't converge) plus any byzantine behaviour
/// observed while building branches, regardless of whether it blocked
/// consensus.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Outcome {
  pub decision: Option<Decision>,
  pub byzantine_reports: Vec<ByzantineReport>,
}

/// Runs one consensus round over `history` for `electors`. `block_height`
/// is the height the caller resolved `electors` for; the core doesn't
/// interpret it beyond threading it through for telemetry.
///
/// No I/O, no mutation of `history`, no panics on malformed input — a
/// malformed snapshot is rejected earlier, at [`History::build`].
pub fn decide(history: &History, electors: &ElectorSet, block_height: u64) -> Outcome {
  let span = info_span!("decide", block_height, electors = electors.len());
  let _enter = span.enter();

  let branches = Branches::build(history, electors);
  let mut byzantine_reports = branches.reports().to_vec();

  let candidates = match Candidates::find(history, &branches, electors) {
    Some(candidates) => candidates,
    None => {
      debug!("no consensus this round: candidate search did not converge");
      return Outcome {
        decision: None,
        byzantine_reports,
      };
    }
  };

  let (decided, equivocation_reports) = ProofProtocol::run(history, &branches, &candidates, electors);
  byzantine_reports.extend(equivocation_reports);

  let decided_ys = match decided {
    Some(ys) => ys,
    None => {
      debug!("no consensus this round: every branch exhausted");
      return Outcome {
        decision: None,
        byzantine_reports,
      };
    }
  };

  let result = commit::commit(history, &candidates, electors, &decided_ys);
  Outcome {
    decision: Some(Decision {
      event_hashes: result.event_hashes,
      consensus_proof_hashes: result.consensus_proof_hashes,
    }),
    byzantine_reports,
  }
}
