//! Scenario replay: a TOML script of timed steps driven through a ledger
//! backed by the in-memory ownership registry, reserve and clock.

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use drip_accrual::{LedgerConfig, LedgerError, RewardLedger};
use drip_nullables::{NullClock, NullOwnership, NullReserve};
use drip_types::{Identity, PositionId, RewardAmount, RewardReserve};

#[derive(Debug, Deserialize)]
pub struct Scenario {
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
pub struct Step {
    /// Absolute time in seconds. Steps must not go back in time.
    pub at: u64,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Mint { id: u64, owner: String },
    Deposit { amount: String },
    Enter { caller: String, id: u64 },
    Leave { caller: String, id: u64 },
    Claim { caller: String, id: u64 },
    MultiEnter { caller: String, ids: Vec<u64> },
    MultiLeave { caller: String, ids: Vec<u64> },
    MultiClaim { caller: String, ids: Vec<u64> },
    SetRate { caller: String, rate: String },
    Withdraw { caller: String },
    Query { ids: Vec<u64> },
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Self::Mint { .. } => "mint",
            Self::Deposit { .. } => "deposit",
            Self::Enter { .. } => "enter",
            Self::Leave { .. } => "leave",
            Self::Claim { .. } => "claim",
            Self::MultiEnter { .. } => "multi_enter",
            Self::MultiLeave { .. } => "multi_leave",
            Self::MultiClaim { .. } => "multi_claim",
            Self::SetRate { .. } => "set_rate",
            Self::Withdraw { .. } => "withdraw",
            Self::Query { .. } => "query",
        }
    }
}

/// Outcome of one step. Amounts are decimal strings of whole units.
#[derive(Debug, Default, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub at: u64,
    pub action: &'static str,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortfall: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PositionSummary {
    pub id: u64,
    pub active: bool,
    pub accrued: String,
    pub total_claimed: String,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub steps: Vec<StepReport>,
    pub positions: Vec<PositionSummary>,
    pub reserve_balance: String,
    pub total_deposited: String,
    pub total_paid: String,
}

impl Scenario {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("invalid scenario")
    }
}

/// Replay `scenario` from `config.genesis`. Ledger errors are recorded per
/// step; malformed steps abort the whole run.
pub fn run(config: LedgerConfig, scenario: &Scenario) -> anyhow::Result<Report> {
    let genesis = config.genesis;
    let oracle = NullOwnership::new();
    let reserve = NullReserve::new();
    let clock = NullClock::new(genesis);
    let mut ledger = RewardLedger::new(config, &oracle, &reserve, &clock)?;

    let mut steps = Vec::with_capacity(scenario.steps.len());
    let mut last_at = genesis;
    for (index, step) in scenario.steps.iter().enumerate() {
        if step.at < last_at {
            bail!("step {index} at {}s goes back in time (previous step at {last_at}s)", step.at);
        }
        clock.set(step.at);
        last_at = step.at;

        let mut report = StepReport {
            index,
            at: step.at,
            action: step.action.name(),
            ok: true,
            ..StepReport::default()
        };
        let outcome = apply(&mut ledger, &oracle, &reserve, &step.action, &mut report)
            .with_context(|| format!("step {index} ({})", step.action.name()))?;
        if let Err(e) = outcome {
            tracing::debug!(index, error = %e, "step rejected by ledger");
            report.ok = false;
            report.error = Some(e.to_string());
        }
        steps.push(report);
    }

    let mut positions: Vec<_> = ledger
        .registry()
        .iter()
        .map(|p| PositionSummary {
            id: p.id.as_u64(),
            active: p.active,
            accrued: p.accrued.to_string(),
            total_claimed: p.total_claimed.to_string(),
        })
        .collect();
    positions.sort_by_key(|p| p.id);

    Ok(Report {
        steps,
        positions,
        reserve_balance: reserve.balance().to_string(),
        total_deposited: reserve.total_deposited().to_string(),
        total_paid: reserve.total_paid().to_string(),
    })
}

fn ids(raw: &[u64]) -> Vec<PositionId> {
    raw.iter().copied().map(PositionId::new).collect()
}

fn parse_amount(field: &str, value: &str) -> anyhow::Result<RewardAmount> {
    RewardAmount::from_decimal_str(value).with_context(|| format!("{field} {value:?}"))
}

type Ledger<'a> = RewardLedger<&'a NullOwnership, &'a NullReserve, &'a NullClock>;

/// Apply one action. The outer error is a malformed step; the inner one is
/// the ledger refusing it.
fn apply(
    ledger: &mut Ledger<'_>,
    oracle: &NullOwnership,
    reserve: &NullReserve,
    action: &Action,
    report: &mut StepReport,
) -> anyhow::Result<Result<(), LedgerError>> {
    let result = match action {
        Action::Mint { id, owner } => {
            oracle.mint(PositionId::new(*id), Identity::new(owner.as_str()));
            Ok(())
        }
        Action::Deposit { amount } => {
            let amount = parse_amount("amount", amount)?;
            reserve.deposit(amount);
            report.amount = Some(amount.to_string());
            Ok(())
        }
        Action::Enter { caller, id } => {
            ledger.enter(&Identity::new(caller.as_str()), PositionId::new(*id))
        }
        Action::Leave { caller, id } => ledger
            .leave(&Identity::new(caller.as_str()), PositionId::new(*id))
            .map(|paid| report.amount = Some(paid.to_string())),
        Action::Claim { caller, id } => ledger
            .claim_rewards(&Identity::new(caller.as_str()), PositionId::new(*id))
            .map(|paid| report.amount = Some(paid.to_string())),
        Action::MultiEnter { caller, ids: raw } => {
            ledger.multi_enter(&Identity::new(caller.as_str()), &ids(raw))
        }
        Action::MultiLeave { caller, ids: raw } => ledger
            .multi_leave(&Identity::new(caller.as_str()), &ids(raw))
            .map(|paid| report.amount = Some(paid.to_string())),
        Action::MultiClaim { caller, ids: raw } => ledger
            .multi_claim_rewards(&Identity::new(caller.as_str()), &ids(raw))
            .map(|receipt| {
                report.amount = Some(receipt.total.to_string());
                if !receipt.shortfall.is_zero() {
                    report.shortfall = Some(receipt.shortfall.to_string());
                }
            }),
        Action::SetRate { caller, rate } => {
            let rate = parse_amount("rate", rate)?;
            report.rate = Some(rate.to_string());
            ledger.set_rewards_rate(&Identity::new(caller.as_str()), rate)
        }
        Action::Withdraw { caller } => ledger
            .withdraw_reserve(&Identity::new(caller.as_str()))
            .map(|paid| report.amount = Some(paid.to_string())),
        Action::Query { ids: raw } => {
            let ids = ids(raw);
            report.amount = Some(ledger.multi_claimable_rewards(&ids).to_string());
            ledger
                .multi_rewards_rate_per_second(&ids)
                .map(|rate| report.rate = Some(rate.to_string()))
        }
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &str = include_str!("../scenarios/basic.toml");

    #[test]
    fn basic_scenario_replays() {
        let scenario = Scenario::from_toml_str(BASIC).unwrap();
        let report = run(LedgerConfig::default(), &scenario).unwrap();

        assert_eq!(report.steps.len(), scenario.steps.len());
        let by_action = |name: &str| {
            report
                .steps
                .iter()
                .filter(|s| s.action == name)
                .collect::<Vec<_>>()
        };

        let claims = by_action("claim");
        assert!(claims[0].ok);
        // one day at the default rate
        assert_eq!(claims[0].amount.as_deref(), Some("49.9999999999999392"));

        let foreign = by_action("leave");
        assert!(!foreign[0].ok);
        assert!(foreign[0].error.as_deref().unwrap().contains("does not own"));

        assert_eq!(report.positions.len(), 2);
        assert_eq!(report.total_deposited, "1000");
    }

    #[test]
    fn ledger_errors_are_reported_not_fatal() {
        let scenario = Scenario::from_toml_str(
            r#"
            [[step]]
            at = 0
            action = "claim"
            caller = "alice"
            id = 1

            [[step]]
            at = 10
            action = "withdraw"
            caller = "authority"
            "#,
        )
        .unwrap();
        let report = run(LedgerConfig::default(), &scenario).unwrap();
        assert!(!report.steps[0].ok);
        assert!(!report.steps[1].ok);
        assert_eq!(report.steps[1].error.as_deref(), Some("nothing to claim"));
    }

    #[test]
    fn steps_going_back_in_time_abort() {
        let scenario = Scenario::from_toml_str(
            r#"
            [[step]]
            at = 100
            action = "query"
            ids = [1]

            [[step]]
            at = 50
            action = "query"
            ids = [1]
            "#,
        )
        .unwrap();
        assert!(run(LedgerConfig::default(), &scenario).is_err());
    }

    #[test]
    fn bad_amount_aborts() {
        let scenario = Scenario::from_toml_str(
            r#"
            [[step]]
            at = 0
            action = "deposit"
            amount = "lots"
            "#,
        )
        .unwrap();
        assert!(run(LedgerConfig::default(), &scenario).is_err());
    }

    #[test]
    fn unknown_action_is_a_parse_error() {
        let err = Scenario::from_toml_str(
            r#"
            [[step]]
            at = 0
            action = "stake_forever"
            "#,
        );
        assert!(err.is_err());
    }
}
