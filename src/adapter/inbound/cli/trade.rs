//! `parimarket buy|sell|resolve` handlers.

use serde_json::json;

use crate::adapter::inbound::cli::command::{BuyArgs, ResolveArgs, SellArgs};
use crate::adapter::inbound::cli::event::OddsRow;
use crate::adapter::inbound::cli::output;
use crate::application::market::MarketService;
use crate::domain::{EventId, OutcomeId, Settlement, UserId};
use crate::error::Result;
use crate::port::outbound::store::RecordStore;

pub fn buy<S: RecordStore>(service: &MarketService<S>, args: &BuyArgs) -> Result<()> {
    let trade = service.buy(
        UserId::new(args.user),
        EventId::new(args.event),
        OutcomeId::new(args.outcome),
        args.amount,
    )?;
    let r = &trade.receipt;

    output::success(&format!(
        "Bought {} shares at {} ({} held)",
        r.shares, r.price, r.position_shares
    ));
    output::field("Balance", r.balance);
    output::table(trade.odds.iter().map(OddsRow::from));
    output::json_output(json!({
        "command": "buy",
        "shares": r.shares,
        "price": r.price,
        "position_shares": r.position_shares,
        "balance": r.balance,
        "odds": trade.odds,
    }));
    Ok(())
}

pub fn sell<S: RecordStore>(service: &MarketService<S>, args: &SellArgs) -> Result<()> {
    let trade = service.sell(
        UserId::new(args.user),
        EventId::new(args.event),
        OutcomeId::new(args.outcome),
        args.shares,
    )?;
    let r = &trade.receipt;

    output::success(&format!("Sold {} shares for {} pts", r.shares, r.points));
    output::field("Remaining", r.remaining_shares);
    output::field("Balance", r.balance);
    output::table(trade.odds.iter().map(OddsRow::from));
    output::json_output(json!({
        "command": "sell",
        "shares": r.shares,
        "points": r.points,
        "remaining_shares": r.remaining_shares,
        "balance": r.balance,
        "odds": trade.odds,
    }));
    Ok(())
}

pub fn resolve<S: RecordStore>(service: &MarketService<S>, args: &ResolveArgs) -> Result<()> {
    let resolution = service.resolve(EventId::new(args.event), OutcomeId::new(args.winner))?;

    let summary = match resolution.settlement {
        Settlement::NoTrades => "no trades; nothing to settle".to_string(),
        Settlement::Refunded => "nobody held the winner; all stakes refunded".to_string(),
        Settlement::Paid => format!(
            "{} pts pool paid to {} winner(s)",
            resolution.total_pool,
            resolution.winners().count()
        ),
    };
    output::success(&format!("Resolved event-{}: {summary}", args.event));
    for outcome in resolution.outcomes.iter() {
        let label = match (outcome.won, outcome.refund) {
            (true, _) => output::positive(format!("won {}", outcome.payout)),
            (false, true) => format!("refunded {}", outcome.payout),
            (false, false) => "lost".to_string(),
        };
        output::field(&outcome.user_id.to_string(), label);
    }

    output::json_output(json!({
        "command": "resolve",
        "event_id": resolution.event_id,
        "winning_outcome_id": resolution.winning_outcome_id,
        "settlement": resolution.settlement,
        "total_pool": resolution.total_pool,
        "winning_shares": resolution.winning_shares,
        "users": resolution.outcomes.iter().collect::<Vec<_>>(),
    }));
    Ok(())
}
