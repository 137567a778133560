use crate::infra::{
    Services, Stores, DEMO_APPLICANT, DEMO_CLASS, DEMO_DOOR_STAFF, DEMO_GUEST, DEMO_REVIEWER,
    DEMO_SOCIAL,
};
use chrono::{Duration, Utc};
use clap::{Args, ValueEnum};
use serde_json::json;
use witchcity::api::{ApiError, ErrorKind};
use witchcity::config::{CheckInConfig, VettingConfig};
use witchcity::error::AppError;
use witchcity::identity::UserId;
use witchcity::workflows::checkin::{
    AttendeeIdentifier, CheckInRequest, CheckInResult, OfflineActionType, StageOfflineRequest,
    SyncReport,
};
use witchcity::workflows::events::EventId;
use witchcity::workflows::participation::{RsvpRequest, TicketPurchaseRequest};
use witchcity::workflows::vetting::{
    ApplicationSubmission, ExperienceLevel, ReferenceSubmission, ReviewDecision, VettingStatus,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum DemoVerdict {
    Approved,
    #[default]
    Denied,
}

impl From<DemoVerdict> for VettingStatus {
    fn from(value: DemoVerdict) -> Self {
        match value {
            DemoVerdict::Approved => VettingStatus::Approved,
            DemoVerdict::Denied => VettingStatus::Denied,
        }
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Final reviewer decision for the demo applicant.
    #[arg(long, value_enum, default_value_t = DemoVerdict::Denied)]
    pub(crate) verdict: DemoVerdict,
    /// Skip the door check-in portion of the demo.
    #[arg(long)]
    pub(crate) skip_check_in: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct SyncDrillArgs {
    /// Retry limit per offline action (capped at 10).
    #[arg(long)]
    pub(crate) max_retries: Option<u32>,
    /// Print each reconciliation report as JSON.
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        verdict,
        skip_check_in,
    } = args;

    let now = Utc::now();
    let stores = Stores::default();
    stores.seed(now).map_err(ApiError::from_error)?;
    let Services {
        vetting,
        participation,
        checkin,
    } = stores.services(VettingConfig::default(), CheckInConfig::default());

    let applicant = UserId(DEMO_APPLICANT.to_string());
    let reviewer = UserId(DEMO_REVIEWER.to_string());
    let guest = UserId(DEMO_GUEST.to_string());
    let social = EventId(DEMO_SOCIAL.to_string());
    let class = EventId(DEMO_CLASS.to_string());

    println!("WitchCityRope workflow demo");
    println!("\nVetting");
    let application = vetting
        .submit(&applicant, demo_submission(), now)
        .map_err(ApiError::from_error)?;
    println!(
        "- {} submitted {} -> {}",
        application.scene_name, application.application_number, application.status
    );

    let mut path = vec![
        VettingStatus::InterviewApproved,
        VettingStatus::InterviewScheduled,
        VettingStatus::FinalReview,
    ];
    path.push(verdict.into());
    for (step, status) in path.into_iter().enumerate() {
        let at = now + Duration::minutes(i64::try_from(step).unwrap_or(0) + 1);
        let decision = ReviewDecision { status, note: None };
        let outcome = vetting
            .submit_review_decision(&application.id, decision, &reviewer, at)
            .map_err(ApiError::from_error)?;
        println!(
            "  {} -> {} (notification sent: {})",
            outcome.previous_status, outcome.status, outcome.notification_sent
        );
    }

    let illegal = ReviewDecision {
        status: VettingStatus::UnderReview,
        note: None,
    };
    if let Err(err) = vetting.submit_review_decision(&application.id, illegal, &reviewer, now) {
        println!("  Reopening refused: {}", ApiError::from_error(err).message);
    }

    println!("\nParticipation");
    match participation.create_rsvp(&social, &applicant, RsvpRequest::default(), now) {
        Ok(rsvp) => println!("- {} RSVP {} -> {:?}", applicant, rsvp.id, rsvp.status),
        Err(err) => println!("- {} RSVP refused: {}", applicant, err),
    }
    let rsvp = participation
        .create_rsvp(&social, &guest, RsvpRequest::default(), now)
        .map_err(ApiError::from_error)?;
    println!("- {} RSVP {} -> {:?}", guest, rsvp.id, rsvp.status);

    let purchase = TicketPurchaseRequest {
        amount_cents: Some(8_000),
        ..TicketPurchaseRequest::default()
    };
    let ticket = participation
        .purchase_ticket(&class, &guest, purchase, now)
        .map_err(ApiError::from_error)?;
    println!(
        "- {} ticket {} at {} cents",
        guest,
        ticket.id,
        ticket.amount_cents.unwrap_or_default()
    );
    let summary = participation
        .status(&social, &guest)
        .map_err(ApiError::from_error)?;
    println!(
        "  {} capacity {}/{} ({} open)",
        social, summary.capacity.current, summary.capacity.total, summary.capacity.available
    );

    if skip_check_in {
        return Ok(());
    }

    println!("\nDoor check-in");
    let staff = UserId(DEMO_DOOR_STAFF.to_string());
    let at_door = now + Duration::minutes(5);
    let attempts = [
        ("Saoirse", by_user(DEMO_GUEST)),
        ("Saoirse again", by_user(DEMO_GUEST)),
        ("Lark", by_code("WCR-2002")),
        ("Wren", by_code("WCR-2003")),
        ("Unknown ticket", by_code("WCR-0000")),
    ];
    for (label, request) in attempts {
        let result = checkin
            .check_in_attendee(&social, &request, &staff, at_door)
            .map_err(ApiError::from_error)?;
        render_check_in(label, &result);
    }

    let dashboard = checkin
        .dashboard(&social, &staff, at_door)
        .map_err(ApiError::from_error)?;
    match serde_json::to_string_pretty(&dashboard) {
        Ok(json) => println!("  Dashboard payload:\n{}", json),
        Err(err) => println!("  Dashboard payload unavailable: {}", err),
    }

    Ok(())
}

pub(crate) fn run_sync_drill(args: SyncDrillArgs) -> Result<(), AppError> {
    let SyncDrillArgs { max_retries, json } = args;

    let now = Utc::now();
    let defaults = CheckInConfig::default();
    let config = CheckInConfig {
        max_sync_retries: max_retries.unwrap_or(defaults.max_sync_retries),
        ..defaults
    };

    let stores = Stores::default();
    stores.seed(now).map_err(ApiError::from_error)?;
    let services = stores.services(VettingConfig::default(), config);
    let checkin = services.checkin;

    let social = EventId(DEMO_SOCIAL.to_string());
    let staff = UserId(DEMO_DOOR_STAFF.to_string());
    let opened = now + Duration::minutes(20);

    println!("Offline sync drill for {}", social);
    let online = checkin
        .check_in_attendee(&social, &by_user(DEMO_GUEST), &staff, opened)
        .map_err(ApiError::from_error)?;
    render_check_in("Saoirse (online)", &online);

    let staged = [
        (by_code("WCR-2004"), OfflineActionType::CheckIn, 2),
        (by_qr("att-lark"), OfflineActionType::CheckIn, 1),
        (by_user(DEMO_GUEST), OfflineActionType::ManualEntry, 3),
        (by_code("WCR-9999"), OfflineActionType::ManualEntry, 4),
    ];
    for (request, action_type, minutes) in staged {
        let action_data = serde_json::to_value(&request).map_err(|err| {
            ApiError::new(ErrorKind::Unhandled, "offline payload")
                .with_detail(err.to_string())
        })?;
        let action = checkin
            .stage_offline(
                &social,
                &staff,
                StageOfflineRequest {
                    action_type,
                    action_data,
                    local_timestamp: opened + Duration::minutes(minutes),
                },
                now,
            )
            .map_err(ApiError::from_error)?;
        println!(
            "- staged {} captured at {}",
            action.id,
            action.local_timestamp.format("%H:%M")
        );
    }

    let mut pass = 1;
    loop {
        let report = checkin
            .reconcile(opened + Duration::hours(1))
            .map_err(ApiError::from_error)?;
        if report.processed == 0 {
            break;
        }
        render_sync_report(pass, &report, json);
        pass += 1;
    }

    let dashboard = checkin
        .dashboard(&social, &staff, opened + Duration::hours(1))
        .map_err(ApiError::from_error)?;
    println!(
        "Queue after drill: {} pending | {} conflicts | {} failed | {} checked in",
        dashboard.sync.pending,
        dashboard.sync.conflicts,
        dashboard.sync.failed,
        dashboard.capacity.checked_in
    );

    Ok(())
}

fn render_check_in(label: &str, result: &CheckInResult) {
    println!("- {}: {:?} ({})", label, result.status, result.message);
    if let Some(notes) = &result.special_notes {
        println!("  Notes: {}", notes);
    }
}

fn render_sync_report(pass: usize, report: &SyncReport, as_json: bool) {
    if as_json {
        let payload = json!({ "pass": pass, "report": report });
        println!("{payload}");
        return;
    }

    println!(
        "Pass {}: {} processed | {} completed | {} conflicts | {} retrying | {} failed",
        pass, report.processed, report.completed, report.conflicts, report.retrying, report.failed
    );
    for action in &report.actions {
        match &action.error_message {
            Some(error) => println!(
                "  - {} {:?} after {} retries: {}",
                action.id, action.outcome, action.retry_count, error
            ),
            None => println!("  - {} {:?}", action.id, action.outcome),
        }
    }
}

fn by_user(user: &str) -> CheckInRequest {
    CheckInRequest {
        identifier: AttendeeIdentifier {
            user_id: Some(UserId(user.to_string())),
            ..AttendeeIdentifier::default()
        },
        ..CheckInRequest::default()
    }
}

fn by_code(code: &str) -> CheckInRequest {
    CheckInRequest {
        identifier: AttendeeIdentifier {
            confirmation_code: Some(code.to_string()),
            ..AttendeeIdentifier::default()
        },
        ..CheckInRequest::default()
    }
}

fn by_qr(attendee_id: &str) -> CheckInRequest {
    CheckInRequest {
        identifier: AttendeeIdentifier {
            qr_code: Some(format!("{DEMO_SOCIAL}:{attendee_id}")),
            ..AttendeeIdentifier::default()
        },
        ..CheckInRequest::default()
    }
}

fn demo_submission() -> ApplicationSubmission {
    ApplicationSubmission {
        scene_name: "Ember".to_string(),
        real_name: "Avery Lin".to_string(),
        email: "ember@witchcityrope.example".to_string(),
        pronouns: Some("they/them".to_string()),
        experience_level: ExperienceLevel::Beginner,
        years_experience: 1,
        experience_description: "A year of floor ties at community rope jams.".to_string(),
        safety_knowledge: "Carries safety shears and checks circulation.".to_string(),
        consent_understanding: "Negotiates limits before every scene.".to_string(),
        why_join: "Wants to attend classes and grow with a vetted community.".to_string(),
        skills_interests: vec!["Floor work".to_string(), "Self-tying".to_string()],
        is_anonymous: false,
        references: vec![ReferenceSubmission {
            name: "Harper".to_string(),
            email: "harper@witchcityrope.example".to_string(),
            relationship: "Jam partner".to_string(),
        }],
    }
}
