//! `parimarket event ...` handlers.

use serde_json::json;
use tabled::Tabled;

use crate::adapter::inbound::cli::command::EventCommand;
use crate::adapter::inbound::cli::output;
use crate::application::market::{EventSummary, MarketService};
use crate::domain::{EventId, OutcomeOdds, UserId};
use crate::error::Result;
use crate::port::outbound::store::RecordStore;

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Odds")]
    odds: String,
}

impl From<&EventSummary> for EventRow {
    fn from(summary: &EventSummary) -> Self {
        Self {
            id: summary.event.id.value(),
            title: summary.event.title.clone(),
            kind: summary.event.kind.to_string(),
            status: summary.event.status.to_string(),
            odds: summary
                .odds
                .iter()
                .map(|o| format!("{} {}%", o.label, o.odds))
                .collect::<Vec<_>>()
                .join(" / "),
        }
    }
}

#[derive(Tabled)]
pub(crate) struct OddsRow {
    #[tabled(rename = "Outcome")]
    id: i64,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Odds %")]
    odds: String,
    #[tabled(rename = "Shares")]
    shares: String,
}

impl From<&OutcomeOdds> for OddsRow {
    fn from(o: &OutcomeOdds) -> Self {
        Self {
            id: o.outcome_id.value(),
            label: o.label.clone(),
            odds: o.odds.to_string(),
            shares: o.shares.to_string(),
        }
    }
}

pub fn execute<S: RecordStore>(service: &MarketService<S>, cmd: EventCommand) -> Result<()> {
    match cmd {
        EventCommand::Create {
            title,
            description,
            kind,
            outcomes,
        } => {
            let (event, odds) = service.create_event(&title, &description, kind.into(), &outcomes)?;
            output::success(&format!("Opened '{}' ({})", event.title, event.id));
            output::table(odds.iter().map(OddsRow::from));
            output::json_output(json!({ "command": "event.create", "event": event, "odds": odds }));
        }
        EventCommand::Update {
            event,
            title,
            description,
            outcomes,
        } => {
            let event = service.update_event(EventId::new(event), &title, &description, &outcomes)?;
            output::success(&format!("Updated '{}'", event.title));
            output::json_output(json!({ "command": "event.update", "event": event }));
        }
        EventCommand::Delete { event } => {
            let refunded = service.delete_event(EventId::new(event))?;
            output::success(&format!("Deleted event-{event}, refunded {refunded} pts"));
            output::json_output(json!({ "command": "event.delete", "event_id": event, "refunded": refunded }));
        }
        EventCommand::Unresolve { event } => {
            let event = service.unresolve_event(EventId::new(event))?;
            output::warning(&format!(
                "Reopened '{}'; payouts already made are not reversed",
                event.title
            ));
            output::json_output(json!({ "command": "event.unresolve", "event": event }));
        }
        EventCommand::List => {
            let events = service.list_events()?;
            if events.is_empty() {
                output::note("No events yet");
            } else {
                output::table(events.iter().map(EventRow::from));
            }
            output::json_output(json!({ "command": "event.list", "events": events }));
        }
        EventCommand::Show { event, user } => {
            let detail = service.event_detail(EventId::new(event), user.map(UserId::new))?;
            output::section(&detail.event.title);
            if !detail.event.description.is_empty() {
                output::note(&detail.event.description);
            }
            output::field("Status", detail.event.status);
            if let Some(winner) = detail.event.winning_outcome_id {
                output::field("Winner", winner);
            }
            output::table(detail.odds.iter().map(OddsRow::from));
            for p in &detail.positions {
                output::field("Holding", format!("{} shares of {}", p.shares, p.outcome_id));
            }
            output::json_output(json!({ "command": "event.show", "event": detail }));
        }
    }
    Ok(())
}
