//! Read-only reports: odds, portfolio and the activity feed.

use serde_json::json;
use tabled::Tabled;

use crate::adapter::inbound::cli::command::{ActivityArgs, OddsArgs, UserArg};
use crate::adapter::inbound::cli::event::OddsRow;
use crate::adapter::inbound::cli::output;
use crate::application::market::{MarketService, PortfolioPosition};
use crate::domain::{ActivityEntry, EventId, UserId};
use crate::error::Result;
use crate::port::outbound::store::RecordStore;

#[derive(Tabled)]
struct PositionRow {
    #[tabled(rename = "Event")]
    event: String,
    #[tabled(rename = "Outcome")]
    outcome: String,
    #[tabled(rename = "Shares")]
    shares: String,
    #[tabled(rename = "Avg price")]
    avg_price: String,
    #[tabled(rename = "If it wins")]
    potential: i64,
}

impl From<&PortfolioPosition> for PositionRow {
    fn from(p: &PortfolioPosition) -> Self {
        Self {
            event: p.event_title.clone(),
            outcome: p.outcome_label.clone(),
            shares: p.shares.to_string(),
            avg_price: p.avg_price.round_dp(4).to_string(),
            potential: p.potential_payout,
        }
    }
}

#[derive(Tabled)]
struct ActivityRow {
    #[tabled(rename = "When")]
    when: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Message")]
    message: String,
}

impl From<&ActivityEntry> for ActivityRow {
    fn from(entry: &ActivityEntry) -> Self {
        Self {
            when: entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            kind: entry.kind.to_string(),
            message: entry.message.clone(),
        }
    }
}

pub fn odds<S: RecordStore>(service: &MarketService<S>, args: &OddsArgs) -> Result<()> {
    let event_id = EventId::new(args.event);
    if args.history {
        let history = service.odds_history(event_id)?;
        for snapshot in &history {
            output::field(
                &snapshot.created_at.format("%H:%M:%S").to_string(),
                format!("{} {}%", snapshot.outcome_id, snapshot.odds),
            );
        }
        output::json_output(json!({ "command": "odds.history", "event_id": event_id, "history": history }));
        return Ok(());
    }

    let odds = service.odds(event_id)?;
    output::table(odds.iter().map(OddsRow::from));
    output::json_output(json!({ "command": "odds", "event_id": event_id, "odds": odds }));
    Ok(())
}

pub fn portfolio<S: RecordStore>(service: &MarketService<S>, args: &UserArg) -> Result<()> {
    let user = service.user(UserId::new(args.user))?;
    let portfolio = service.portfolio(user.id)?;

    output::section(&format!("{} ({} pts)", user.username, user.balance));
    if portfolio.positions.is_empty() {
        output::note("No open positions");
    } else {
        output::table(portfolio.positions.iter().map(PositionRow::from));
    }
    output::field("Invested", portfolio.total_invested);
    output::field("Potential", portfolio.total_potential);
    output::field("Markets", portfolio.active_markets);
    output::json_output(json!({ "command": "portfolio", "user": user, "portfolio": portfolio }));
    Ok(())
}

pub fn activity<S: RecordStore>(service: &MarketService<S>, args: &ActivityArgs) -> Result<()> {
    let entries = service.recent_activity(args.limit)?;
    if entries.is_empty() {
        output::note("No activity yet");
    } else {
        output::table(entries.iter().map(ActivityRow::from));
    }
    output::json_output(json!({ "command": "activity", "entries": entries }));
    Ok(())
}
