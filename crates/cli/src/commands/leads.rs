//! Lead commands.
//!
//! # Usage
//!
//! ```bash
//! nd-cli leads list
//! nd-cli leads add --name "Ada Lovelace" --phone 555-0100 --status Qualified
//! nd-cli leads import march.csv
//! ```

use std::path::Path;

use clap::Args;
use nexdoor_core::{Interest, LeadField, LeadStatus, Page};
use nexdoor_leads::{HttpLeadStore, LeadsPage, RenderRow, UploadFile};

use super::{CommandError, Context};

/// Fields for `leads add`.
#[derive(Debug, Args)]
pub struct NewLead {
    /// Lead name
    #[arg(long)]
    name: String,

    /// Phone number
    #[arg(long)]
    phone: Option<String>,

    /// Status (`Pending`, `Qualified`, `Unreachable`)
    #[arg(long)]
    status: Option<LeadStatus>,

    /// Interest (`High`, `Medium`, `Low`)
    #[arg(long)]
    interest: Option<Interest>,

    /// When the lead was last called
    #[arg(long)]
    last_call: Option<String>,

    /// Free-form notes
    #[arg(long)]
    notes: Option<String>,

    /// What to do next
    #[arg(long)]
    next_action: Option<String>,
}

impl NewLead {
    fn edits(&self) -> Vec<(LeadField, &str)> {
        let mut edits = vec![(LeadField::Name, self.name.as_str())];
        let optional = [
            (LeadField::Phone, self.phone.as_deref()),
            (LeadField::Status, self.status.map(LeadStatus::as_str)),
            (LeadField::Interest, self.interest.map(Interest::as_str)),
            (LeadField::LastCall, self.last_call.as_deref()),
            (LeadField::Notes, self.notes.as_deref()),
            (LeadField::NextAction, self.next_action.as_deref()),
        ];
        edits.extend(optional.into_iter().filter_map(|(field, value)| Some((field, value?))));
        edits
    }
}

/// Open the leads page for the stored session.
fn open_page() -> Result<LeadsPage<HttpLeadStore>, CommandError> {
    let mut ctx = Context::load()?;
    let mut session = ctx.require_session()?;
    session.navigate(&mut ctx.sessions, Page::Leads)?;
    Ok(LeadsPage::new(ctx.store, Some(session)))
}

/// Print the confirmed lead list.
pub async fn list() -> Result<(), CommandError> {
    let page = open_page()?;
    page.refresh().await?;
    print_rows(&page.rows());
    Ok(())
}

/// Add one lead through the draft flow, then print the refreshed list.
pub async fn add(lead: NewLead) -> Result<(), CommandError> {
    let page = open_page()?;

    page.begin_draft()?;
    for (field, value) in lead.edits() {
        page.edit_draft(field, value)?;
    }
    page.commit_draft().await?;

    tracing::info!("Lead saved: {}", lead.name);
    print_rows(&page.rows());
    Ok(())
}

/// Import a CSV file and print the outcome.
#[allow(clippy::print_stdout)]
pub async fn import(path: &Path) -> Result<(), CommandError> {
    let page = open_page()?;

    let file = UploadFile::read(path)
        .await
        .map_err(|source| CommandError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;

    let summary = page.import_csv(Some(file)).await?;

    if summary.uploaded() {
        println!(
            "Uploaded {}: {} accepted, {} rejected, {} skipped",
            page.last_uploaded_file().as_deref().unwrap_or("file"),
            summary.accepted,
            summary.rejected,
            summary.skipped
        );
    } else {
        println!("Nothing to upload ({} rows skipped)", summary.skipped);
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_rows(rows: &[RenderRow]) {
    if rows.is_empty() {
        println!("No leads yet.");
        return;
    }

    println!(
        "{:<8} {:<24} {:<16} {:<12} {:<8} {:<16} {}",
        "ID", "NAME", "PHONE", "STATUS", "INTEREST", "LAST CALL", "NEXT ACTION"
    );
    for row in rows {
        let id = match row {
            RenderRow::Confirmed(lead) => lead.id.as_str(),
            RenderRow::Draft { .. } => "(draft)",
        };
        let fields = row.fields();
        println!(
            "{:<8} {:<24} {:<16} {:<12} {:<8} {:<16} {}",
            id,
            fields.name,
            fields.phone,
            fields.status.as_str(),
            fields.interest.as_str(),
            fields.last_call,
            fields.next_action
        );
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        lead: NewLead,
    }

    #[test]
    fn test_edits_only_include_given_fields() {
        let harness = Harness::parse_from([
            "nd-cli",
            "--name",
            "Ada",
            "--interest",
            "high",
            "--notes",
            "call after 5",
        ]);

        assert_eq!(
            harness.lead.edits(),
            vec![
                (LeadField::Name, "Ada"),
                (LeadField::Interest, "High"),
                (LeadField::Notes, "call after 5"),
            ]
        );
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        assert!(Harness::try_parse_from(["nd-cli", "--name", "Ada", "--status", "hot"]).is_err());
    }
}
