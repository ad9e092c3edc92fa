use clap::{Args, ValueEnum};
use customs_workflow::error::AppError;
use customs_workflow::workflows::declaration::{
    AuditLogEntry, DeclarationFields, DeclarationItem, DeclarationService, DocumentKind,
    DocumentStatus, InMemoryStore, Lane, NotificationFeed, TransitionRequest,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub(crate) enum DemoKind {
    /// Export declaration
    #[default]
    Peb,
    /// Import declaration
    Pib,
}

impl From<DemoKind> for DocumentKind {
    fn from(value: DemoKind) -> Self {
        match value {
            DemoKind::Peb => DocumentKind::Peb,
            DemoKind::Pib => DocumentKind::Pib,
        }
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Declaration type to walk through
    #[arg(long, value_enum, default_value_t = DemoKind::Peb)]
    pub(crate) kind: DemoKind,
    /// Have CEISA reject the first submission so the revise loop is shown
    #[arg(long)]
    pub(crate) reject_first: bool,
    /// Write the compliance ZIP bundle to this path
    #[arg(long)]
    pub(crate) bundle: Option<PathBuf>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        kind,
        reject_first,
        bundle,
    } = args;
    let kind = DocumentKind::from(kind);

    let feed = NotificationFeed::default();
    let service = DeclarationService::new(
        Arc::new(InMemoryStore::default()),
        Arc::new(feed.clone()),
    );

    println!("Customs declaration workflow demo ({})", kind.label());
    let declaration =
        service.create_draft(kind, demo_fields(kind), Some("maker@trader".to_string()))?;
    println!(
        "- Draft {} created for {} ({} items, {} {:.2})",
        declaration.display_number(),
        declaration.fields.trader_name,
        declaration.fields.items.len(),
        declaration.fields.currency,
        declaration.fields.total_value()
    );

    let mut steps = vec![
        (DocumentStatus::Submitted, "maker@trader", None),
        (
            DocumentStatus::SentToPpjk,
            "broker@ppjk",
            Some("Forwarded to customs broker"),
        ),
    ];
    if reject_first {
        steps.extend([
            (
                DocumentStatus::CeisaRejected,
                "ceisa",
                Some("HS code 0901.11 does not match description"),
            ),
            (DocumentStatus::Draft, "maker@trader", Some("Revising items")),
            (DocumentStatus::Submitted, "maker@trader", None),
            (DocumentStatus::SentToPpjk, "broker@ppjk", None),
        ]);
    }
    steps.extend([
        (DocumentStatus::CeisaAccepted, "ceisa", Some("Green lane")),
        (kind.release_status(), "ceisa", None),
        (DocumentStatus::Completed, "maker@trader", None),
    ]);

    for (target, actor, notes) in steps {
        let mut request = TransitionRequest::to(target).by(actor);
        if let Some(notes) = notes {
            request = request.with_notes(notes);
        }
        match service.transition(&declaration.id, request) {
            Ok(outcome) => println!(
                "- {} -> {}{}",
                outcome
                    .entry
                    .from_status
                    .map_or("(new)", DocumentStatus::code),
                outcome.entry.to_status.code(),
                if outcome.declaration.is_locked() {
                    " [locked]"
                } else {
                    ""
                }
            ),
            Err(err) => {
                println!("  Transition rejected: {err}");
                return Ok(());
            }
        }
    }

    let blocked = service.transition(
        &declaration.id,
        TransitionRequest::to(DocumentStatus::Draft).by("maker@trader"),
    );
    if let Err(err) = blocked {
        println!("- Attempted reopen after completion: {err}");
    }

    let history = service.history(&declaration.id)?;
    let timeline = service.projector().project(&history);
    println!("\nTimeline ({} entries)", timeline.len());
    for entry in timeline.iter() {
        println!(
            "  {} | {:<22} | {:?} | {}{}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.label,
            entry.category,
            entry.actor,
            entry
                .notes
                .map(|notes| format!(" ({notes})"))
                .unwrap_or_default()
        );
    }

    let trail = service.audit_trail(&declaration.id)?;
    println!("\nAudit trail ({} entries)", trail.len());
    for entry in &trail {
        println!("  {}", describe_audit(entry));
    }

    let notifications = feed.all();
    println!("\nNotifications ({} unread)", feed.unread_count());
    for notification in notifications.iter().rev().take(3) {
        println!("  - {}: {}", notification.title, notification.message);
    }

    if let Some(path) = bundle {
        let (_, bytes) = service.export_bundle(&declaration.id, Some("auditor".to_string()))?;
        std::fs::write(&path, &bytes)?;
        println!(
            "\nCompliance bundle written to {} ({} bytes)",
            path.display(),
            bytes.len()
        );
    }

    Ok(())
}

fn describe_audit(entry: &AuditLogEntry) -> String {
    let fields: Vec<&str> = entry.changes.keys().map(String::as_str).collect();
    format!(
        "{} | {:<13} | {:<12} | {}",
        entry.created_at.format("%Y-%m-%d %H:%M:%S"),
        entry.action.code(),
        entry.actor.as_deref().unwrap_or("system"),
        if fields.is_empty() {
            "-".to_string()
        } else {
            fields.join(", ")
        }
    )
}

fn demo_fields(kind: DocumentKind) -> DeclarationFields {
    let (trader_name, port_of_loading, port_of_discharge, counterpart_country) = match kind {
        DocumentKind::Peb => ("PT Kopi Nusantara", "IDTPP", "NLRTM", "NL"),
        DocumentKind::Pib => ("PT Elektronik Batam", "CNSHA", "IDBTH", "CN"),
    };

    DeclarationFields {
        trader_name: trader_name.to_string(),
        trader_npwp: "01.234.567.8-901.000".to_string(),
        ppjk_name: Some("PT Mitra Kepabeanan".to_string()),
        customs_office: "040300".to_string(),
        port_of_loading: port_of_loading.to_string(),
        port_of_discharge: port_of_discharge.to_string(),
        counterpart_country: counterpart_country.to_string(),
        currency: "USD".to_string(),
        lane: Some(Lane::Green),
        items: vec![
            DeclarationItem {
                hs_code: "0901.11".to_string(),
                description: "Arabica green coffee beans".to_string(),
                quantity: 19_200.0,
                unit: "KGM".to_string(),
                value: 86_400.0,
            },
            DeclarationItem {
                hs_code: "0901.21".to_string(),
                description: "Roasted coffee, not decaffeinated".to_string(),
                quantity: 2_400.0,
                unit: "KGM".to_string(),
                value: 21_600.0,
            },
        ],
    }
}
