//! Data models for the SOS coordination engine.
//!
//! Wire compatibility note: every type here serializes with the exact field
//! names the dashboard and victim clients already consume (`isOffline`,
//! `audioUrl`, `assignedTeam`, ...), so the JSON shape of the HTTP surface
//! is stable even though the internal representation is strongly typed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Triage priority assigned once at ingestion by the keyword classifier.
///
/// Never recomputed after creation, even if the message would classify
/// differently under a later keyword table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    Critical,
    High,
    Moderate,
    Low,
}

/// Lifecycle state of an SOS signal.
///
/// The state machine only moves forward:
///
/// ```text
/// New --assign--> Assigned --ticker arrival--> Rescued --10s--> (purged)
/// New | Assigned --manual "mark safe"--> Resolved (terminal)
/// ```
///
/// `Resolved` incidents stay in the store until manually deleted; only
/// `Rescued` incidents are purged by the simulation ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SosStatus {
    New,
    Assigned,
    Rescued,
    Resolved,
}

impl SosStatus {
    /// Whether moving from `self` to `next` is a legal forward transition.
    ///
    /// The store itself is transition-agnostic (a pure data holder); this
    /// table is enforced at the dispatch boundary so operator requests
    /// cannot jump a signal backwards or skip states.
    pub fn can_transition_to(self, next: SosStatus) -> bool {
        use SosStatus::*;
        matches!(
            (self, next),
            (New, Assigned) | (New, Resolved) | (Assigned, Rescued) | (Assigned, Resolved)
        )
    }
}

/// State of a dispatched rescue team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamStatus {
    #[serde(rename = "En-route")]
    EnRoute,
    #[serde(rename = "On-site")]
    OnSite,
    Returning,
}

/// A rescue team attached to a single SOS signal.
///
/// The team's position is only advanced by the simulation ticker while its
/// status is `En-route`; arrival freezes it in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescueTeam {
    /// Opaque identifier, `TEAM-` prefixed.
    pub id: String,

    /// Operator-supplied display name (e.g. "NDRF Alpha").
    pub name: String,

    pub lat: f64,
    pub lng: f64,

    pub status: TeamStatus,

    /// Coarse, human-readable arrival estimate recomputed every tick.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,
}

/// A single SOS signal submitted by a victim.
///
/// `id`, `timestamp`, `priority` and `category` are immutable after
/// creation. Everything that can change afterwards changes through
/// [`SosUpdate`] or the simulation ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SosSignal {
    /// Opaque identifier, `SIGNAL-` prefixed.
    pub id: String,

    pub lat: f64,
    pub lng: f64,

    /// Free-text description of the emergency, as typed (or transcribed)
    /// on the victim device.
    pub message: String,

    /// Server-assigned creation time (UTC).
    pub timestamp: DateTime<Utc>,

    /// Reporter's device battery percentage at submission (0-100).
    pub battery: u8,

    /// Whether the signal arrived over a disconnected/mesh transmission path.
    pub is_offline: bool,

    pub priority: Priority,

    /// Short triage label assigned alongside the priority.
    pub category: String,

    pub status: SosStatus,

    /// Optional attached audio reference, settable after creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,

    /// Set when the signal transitions to `Rescued` or `Resolved`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,

    /// Reduced-accuracy reporting mode flag from the victim device.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_battery_optimized: Option<bool>,

    /// Present once a team has been dispatched to this signal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_team: Option<RescueTeam>,
}

/// Severity of a danger zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneSeverity {
    Fatal,
    High,
    Moderate,
}

/// A circular hazard area, independent of any signal after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DangerZone {
    /// Opaque identifier, `ZONE-` prefixed.
    pub id: String,

    pub lat: f64,
    pub lng: f64,

    /// Radius of the hazard circle, in meters.
    pub radius: f64,

    pub severity: ZoneSeverity,

    pub description: String,

    pub timestamp: DateTime<Utc>,

    /// Who reported the zone: an operator label, a victim label, or
    /// `SYSTEM_AUTO_TRIAGE` for auto-escalated zones.
    pub author: String,
}

/// Fields the caller supplies when creating an SOS signal.
///
/// Classification output is included because the dispatch layer runs the
/// classifier before the store ever sees the record.
#[derive(Debug, Clone)]
pub struct NewSos {
    pub lat: f64,
    pub lng: f64,
    pub message: String,
    pub battery: u8,
    pub is_offline: bool,
    pub priority: Priority,
    pub category: String,
    pub audio_url: Option<String>,
    pub is_battery_optimized: Option<bool>,
}

/// Fields the caller supplies when creating a danger zone.
#[derive(Debug, Clone)]
pub struct NewDangerZone {
    pub lat: f64,
    pub lng: f64,
    pub radius: f64,
    pub severity: ZoneSeverity,
    pub description: String,
    pub author: String,
}

/// A partial mutation applied to an existing SOS signal.
///
/// `None` fields are left untouched. The store merges these without
/// judging state-machine legality; that check lives in the dispatch layer.
#[derive(Debug, Clone, Default)]
pub struct SosUpdate {
    pub status: Option<SosStatus>,
    pub audio_url: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub assigned_team: Option<RescueTeam>,
}

// ============================================================================
// Wire request types
// ============================================================================

/// Discriminator for submissions that target the zone collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubmitKind {
    DangerZone,
}

/// Body of `POST /sos`.
///
/// One flat payload serves both SOS signals and community danger reports,
/// discriminated by `type`, matching the shape the clients already send.
/// Field requirements differ per branch and are validated in dispatch.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    #[serde(rename = "type", default)]
    pub kind: Option<SubmitKind>,

    pub lat: f64,
    pub lng: f64,

    /// Emergency text for SOS submissions; doubles as the zone description
    /// for danger reports that don't pass `description` separately.
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub battery: Option<u8>,

    #[serde(default)]
    pub is_offline: bool,

    #[serde(default)]
    pub audio_url: Option<String>,

    #[serde(default)]
    pub is_battery_optimized: Option<bool>,

    // Danger-report fields.
    #[serde(default)]
    pub radius: Option<f64>,

    #[serde(default)]
    pub severity: Option<ZoneSeverity>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub author: Option<String>,
}

/// Body of `PATCH /sos`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub id: String,

    #[serde(default)]
    pub status: Option<SosStatus>,

    /// When set together with `status: "Assigned"`, dispatches a new team
    /// under this name.
    #[serde(default)]
    pub team_name: Option<String>,

    #[serde(default)]
    pub audio_url: Option<String>,
}

/// Discriminator for deletions that target the zone collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeleteKind {
    DangerZone,
}

/// Body of `DELETE /sos`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteRequest {
    pub id: String,

    #[serde(rename = "type", default)]
    pub kind: Option<DeleteKind>,
}
