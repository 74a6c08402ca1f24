//! Triage and dispatch orchestration.
//!
//! This is the layer between the HTTP boundary and the store: it runs the
//! classifier on inbound SOS messages, escalates disaster reports into
//! red-alert danger zones, simulates the alert broadcast, dispatches rescue
//! teams, and enforces the forward-only status state machine that the store
//! itself deliberately does not check.

use thiserror::Error;
use tracing::info;

use crate::geo;
use crate::model::{
    DangerZone, DeleteKind, DeleteRequest, NewDangerZone, NewSos, RescueTeam, SosSignal,
    SosStatus, SosUpdate, SubmitKind, SubmitRequest, TeamStatus, UpdateRequest, ZoneSeverity,
};
use crate::store::{IncidentStore, prefixed_id};
use crate::triage;

/// Literal phrase that force-escalates an ingestion regardless of tier.
const DISASTER_PHRASE: &str = "NATURAL DISASTER";

/// Radius of an auto-created red-alert zone, in meters.
const AUTO_ZONE_RADIUS_M: f64 = 1000.0;

/// Author recorded on auto-escalated zones.
const AUTO_ZONE_AUTHOR: &str = "SYSTEM_AUTO_TRIAGE";

/// Nominal recipient count for the simulated broadcast. There is no real
/// notification fan-out behind this; the count is an observable stand-in.
const BROADCAST_RECIPIENTS: u32 = 42;

/// Rescue teams start this far from the victim on both axes (a few km to
/// the southwest, so the approach is visible on the map).
const TEAM_START_OFFSET_DEG: f64 = -0.05;

/// Placeholder ETA until the first simulation tick recomputes it.
const INITIAL_ETA: &str = "12 mins";

/// Default radius for community danger reports that omit one, in meters.
const DEFAULT_REPORT_RADIUS_M: f64 = 500.0;

/// Default author label for community danger reports.
const DEFAULT_REPORT_AUTHOR: &str = "Dashboard";

/// Errors surfaced by the dispatch layer.
///
/// Validation errors reject the request before any store mutation;
/// not-found errors mean the referenced id is absent and nothing changed.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Incident Not Found")]
    NotFound,

    #[error("Zone Not Found")]
    ZoneNotFound,

    #[error("illegal status transition {from:?} -> {to:?}")]
    IllegalTransition { from: SosStatus, to: SosStatus },

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("battery must be between 0 and 100, got {0}")]
    BatteryOutOfRange(u8),
}

impl DispatchError {
    /// Whether this error is a bad-input rejection (as opposed to a lookup
    /// miss). The API layer maps the two to different status codes.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DispatchError::IllegalTransition { .. }
                | DispatchError::MissingField(_)
                | DispatchError::BatteryOutOfRange(_)
        )
    }
}

/// Outcome of ingesting one SOS signal.
#[derive(Debug, Clone)]
pub struct SosIntake {
    pub sos: SosSignal,

    /// Whether a red-alert zone was auto-created alongside the signal.
    pub auto_danger_zone: bool,

    /// Recipients of the simulated broadcast (0 for non-disaster intake).
    pub broadcast_count: u32,
}

/// What a `POST /sos` produced: a signal intake or a community danger report.
#[derive(Debug, Clone)]
pub enum Submission {
    Sos(SosIntake),
    Zone(DangerZone),
}

/// Handle a submission: an SOS signal, or a danger report when the payload
/// carries the `danger-zone` discriminator.
pub fn submit(store: &IncidentStore, req: SubmitRequest) -> Result<Submission, DispatchError> {
    match req.kind {
        Some(SubmitKind::DangerZone) => report_danger_zone(store, req).map(Submission::Zone),
        None => ingest_sos(store, req).map(Submission::Sos),
    }
}

/// Ingest a new SOS signal: classify, store, and escalate if it reports a
/// disaster.
fn ingest_sos(store: &IncidentStore, req: SubmitRequest) -> Result<SosIntake, DispatchError> {
    let message = req.message.ok_or(DispatchError::MissingField("message"))?;
    let battery = req.battery.ok_or(DispatchError::MissingField("battery"))?;
    if battery > 100 {
        return Err(DispatchError::BatteryOutOfRange(battery));
    }

    let classification = triage::classify(&message);

    let sos = store.add_sos(NewSos {
        lat: req.lat,
        lng: req.lng,
        message: message.clone(),
        battery,
        is_offline: req.is_offline,
        priority: classification.priority,
        category: classification.category.to_string(),
        audio_url: req.audio_url,
        is_battery_optimized: req.is_battery_optimized,
    });

    // One-way escalation: an explicit disaster phrase or a "Trapped"
    // classification raises a red-alert zone centered on the victim.
    // Undoing it later is a manual zone deletion, decoupled from this
    // signal.
    let is_disaster = message.to_uppercase().contains(DISASTER_PHRASE)
        || classification.category.contains("Trapped");

    if is_disaster {
        store.add_danger_zone(NewDangerZone {
            lat: sos.lat,
            lng: sos.lng,
            radius: AUTO_ZONE_RADIUS_M,
            severity: ZoneSeverity::Fatal,
            description: format!("RED ALERT: {}", message.to_uppercase()),
            author: AUTO_ZONE_AUTHOR.to_string(),
        });
    }

    // Broadcast simulation. Best-effort by construction: it's a log
    // emission and can never fail the intake.
    if is_disaster {
        info!(
            lat = sos.lat,
            lng = sos.lng,
            "natural disaster detected, red-alert zone raised"
        );
        info!(
            recipients = BROADCAST_RECIPIENTS,
            "emergency broadcast sent to citizens within 10km: move to higher ground or seek immediate shelter"
        );
    } else {
        info!(
            sos = %sos.id,
            priority = ?sos.priority,
            "SOS received, notifying emergency contacts and nearby responders"
        );
    }

    Ok(SosIntake {
        sos,
        auto_danger_zone: is_disaster,
        broadcast_count: if is_disaster { BROADCAST_RECIPIENTS } else { 0 },
    })
}

/// Record a community danger report as a new zone.
///
/// Anyone may report; the author label is taken at face value. Radius and
/// author fall back to dashboard defaults when omitted.
fn report_danger_zone(
    store: &IncidentStore,
    req: SubmitRequest,
) -> Result<DangerZone, DispatchError> {
    let severity = req.severity.ok_or(DispatchError::MissingField("severity"))?;
    let description = req
        .description
        .or(req.message)
        .ok_or(DispatchError::MissingField("description"))?;

    let zone = store.add_danger_zone(NewDangerZone {
        lat: req.lat,
        lng: req.lng,
        radius: req.radius.unwrap_or(DEFAULT_REPORT_RADIUS_M),
        severity,
        description,
        author: req.author.unwrap_or_else(|| DEFAULT_REPORT_AUTHOR.to_string()),
    });

    info!(zone = %zone.id, severity = ?zone.severity, "community danger report recorded");
    Ok(zone)
}

/// Apply an operator update to a signal: a status transition, a team
/// dispatch, an audio attachment, or any combination.
///
/// Status changes are validated against the forward-only transition table;
/// an illegal jump rejects the whole request with no mutation.
pub fn update_sos(store: &IncidentStore, req: UpdateRequest) -> Result<SosSignal, DispatchError> {
    let current = store.get_sos(&req.id).ok_or(DispatchError::NotFound)?;

    let mut update = SosUpdate {
        audio_url: req.audio_url,
        ..SosUpdate::default()
    };

    if let Some(next) = req.status {
        if !current.status.can_transition_to(next) {
            return Err(DispatchError::IllegalTransition {
                from: current.status,
                to: next,
            });
        }
        update.status = Some(next);

        // Manual "mark safe" is terminal and keeps the record around for
        // the operator log, so it carries its own resolution stamp.
        if next == SosStatus::Resolved {
            update.resolved_at = Some(chrono::Utc::now());
        }

        if next == SosStatus::Assigned {
            if let Some(name) = &req.team_name {
                let team = RescueTeam {
                    id: prefixed_id("TEAM"),
                    name: name.clone(),
                    lat: current.lat + TEAM_START_OFFSET_DEG,
                    lng: current.lng + TEAM_START_OFFSET_DEG,
                    status: TeamStatus::EnRoute,
                    eta: Some(INITIAL_ETA.to_string()),
                };
                info!(team = %team.id, name = %team.name, sos = %current.id, "rescue team dispatched");
                update.assigned_team = Some(team);
            }
        }
    }

    store.update_sos(&req.id, update).ok_or(DispatchError::NotFound)
}

/// Delete a signal, or a zone when the payload carries the `danger-zone`
/// discriminator ("normalize" in dashboard terms).
pub fn delete(store: &IncidentStore, req: DeleteRequest) -> Result<(), DispatchError> {
    match req.kind {
        Some(DeleteKind::DangerZone) => {
            if store.remove_danger_zone(&req.id) {
                info!(zone = %req.id, "danger zone normalized");
                Ok(())
            } else {
                Err(DispatchError::ZoneNotFound)
            }
        }
        None => {
            if store.delete_sos(&req.id) {
                info!(sos = %req.id, "incident deleted");
                Ok(())
            } else {
                Err(DispatchError::NotFound)
            }
        }
    }
}

/// Proximity alert for a victim location: the first danger zone whose alert
/// circle (1.5x radius) covers it, if any.
pub fn proximity_alert(store: &IncidentStore, lat: f64, lng: f64) -> Option<DangerZone> {
    let zones = store.list_danger_zones();
    geo::zone_in_range(lat, lng, &zones).cloned()
}
