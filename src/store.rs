//! In-memory incident store.
//!
//! The store is the single owner of both live collections: SOS signals
//! (newest first) and danger zones (insertion order). Data is volatile and
//! lives only for the process lifetime; there is intentionally no durable
//! storage behind it.
//!
//! One mutex guards both collections. The two mutators in the system (the
//! HTTP dispatch path and the simulation ticker) would otherwise race on
//! the same structures, so every operation here takes the lock for its full
//! duration and reads hand out cloned snapshots.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use crate::model::{DangerZone, NewDangerZone, NewSos, SosSignal, SosStatus, SosUpdate, ZoneSeverity};

/// Shared handle to the process-wide incident state.
///
/// Cheap to clone; every clone points at the same collections. Constructed
/// once in `main` and injected into handlers and the ticker rather than
/// living in a global.
#[derive(Clone)]
pub struct IncidentStore {
    inner: Arc<Mutex<StoreInner>>,
}

/// The collections behind the lock.
pub(crate) struct StoreInner {
    /// SOS signals, newest first.
    pub(crate) signals: VecDeque<SosSignal>,
    /// Danger zones in insertion order.
    pub(crate) zones: Vec<DangerZone>,
}

/// Generate a prefixed identifier like `SIGNAL-3F0C...`.
///
/// UUIDv4 behind a human-readable prefix: consumers parse the prefix to
/// tell signals, zones and teams apart in logs and map popups.
pub(crate) fn prefixed_id(prefix: &str) -> String {
    let mut buf = Uuid::encode_buffer();
    let token = Uuid::new_v4().simple().encode_upper(&mut buf);
    format!("{prefix}-{token}")
}

impl IncidentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                signals: VecDeque::new(),
                zones: Vec::new(),
            })),
        }
    }

    /// Run `f` with exclusive access to the collections.
    ///
    /// The simulation ticker uses this to make each tick a single critical
    /// section, so ticks can never interleave with request handling or with
    /// each other.
    pub(crate) fn with_inner<R>(&self, f: impl FnOnce(&mut StoreInner) -> R) -> R {
        let mut inner = self.inner.lock().expect("incident store mutex poisoned");
        f(&mut inner)
    }

    /// Snapshot of all SOS signals, newest first.
    pub fn list_sos(&self) -> Vec<SosSignal> {
        self.with_inner(|inner| inner.signals.iter().cloned().collect())
    }

    /// Snapshot of all danger zones in insertion order.
    pub fn list_danger_zones(&self) -> Vec<DangerZone> {
        self.with_inner(|inner| inner.zones.clone())
    }

    /// Look up a single signal by id.
    pub fn get_sos(&self, id: &str) -> Option<SosSignal> {
        self.with_inner(|inner| inner.signals.iter().find(|s| s.id == id).cloned())
    }

    /// Create a new SOS signal and insert it at the front of the collection.
    ///
    /// The store assigns the id, creation timestamp and initial `New`
    /// status; everything else comes from the caller.
    pub fn add_sos(&self, new: NewSos) -> SosSignal {
        let sos = SosSignal {
            id: prefixed_id("SIGNAL"),
            lat: new.lat,
            lng: new.lng,
            message: new.message,
            timestamp: Utc::now(),
            battery: new.battery,
            is_offline: new.is_offline,
            priority: new.priority,
            category: new.category,
            status: SosStatus::New,
            audio_url: new.audio_url,
            resolved_at: None,
            is_battery_optimized: new.is_battery_optimized,
            assigned_team: None,
        };

        self.with_inner(|inner| inner.signals.push_front(sos.clone()));
        sos
    }

    /// Merge a partial update into an existing signal.
    ///
    /// Returns the updated record, or `None` if the id is unknown: a
    /// reported condition, not an error; the caller decides the response.
    /// No state-machine legality is checked here (the store is a pure data
    /// holder); the dispatch layer owns the transition table.
    pub fn update_sos(&self, id: &str, update: SosUpdate) -> Option<SosSignal> {
        self.with_inner(|inner| {
            let sos = inner.signals.iter_mut().find(|s| s.id == id)?;

            if let Some(status) = update.status {
                sos.status = status;
            }
            if let Some(audio_url) = update.audio_url {
                sos.audio_url = Some(audio_url);
            }
            if let Some(resolved_at) = update.resolved_at {
                sos.resolved_at = Some(resolved_at);
            }
            if let Some(team) = update.assigned_team {
                sos.assigned_team = Some(team);
            }

            Some(sos.clone())
        })
    }

    /// Remove a signal by id. Returns whether anything was removed.
    pub fn delete_sos(&self, id: &str) -> bool {
        self.with_inner(|inner| {
            let before = inner.signals.len();
            inner.signals.retain(|s| s.id != id);
            inner.signals.len() != before
        })
    }

    /// Create a new danger zone and append it to the zone list.
    pub fn add_danger_zone(&self, new: NewDangerZone) -> DangerZone {
        let zone = DangerZone {
            id: prefixed_id("ZONE"),
            lat: new.lat,
            lng: new.lng,
            radius: new.radius,
            severity: new.severity,
            description: new.description,
            timestamp: Utc::now(),
            author: new.author,
        };

        self.with_inner(|inner| inner.zones.push(zone.clone()));
        zone
    }

    /// Remove a danger zone by id. Returns whether anything was removed.
    pub fn remove_danger_zone(&self, id: &str) -> bool {
        self.with_inner(|inner| {
            let before = inner.zones.len();
            inner.zones.retain(|z| z.id != id);
            inner.zones.len() != before
        })
    }

    /// Pre-fill the historical danger zones shown on a fresh demo instance.
    pub fn seed_demo_zones(&self) {
        self.add_danger_zone(NewDangerZone {
            lat: 28.6139,
            lng: 77.2090,
            radius: 500.0,
            severity: ZoneSeverity::High,
            description: "Frequent Flooding Zone - Avoid in Monsoon".to_string(),
            author: "Admin".to_string(),
        });
        self.add_danger_zone(NewDangerZone {
            lat: 28.6250,
            lng: 77.2200,
            radius: 300.0,
            severity: ZoneSeverity::Fatal,
            description: "Structural Instability Reported".to_string(),
            author: "Gov_Audit".to_string(),
        });
    }
}

impl Default for IncidentStore {
    fn default() -> Self {
        Self::new()
    }
}
